use std::collections::HashSet;

use shared::{domain::SourceId, protocol::HandPresenceChanged};
use tracing::debug;

use crate::bus::EventBus;

/// Publishes hand presence when the set of detected input sources goes from
/// empty to non-empty or back.
pub struct HandPresenceTracker {
    bus: EventBus,
    sources: HashSet<SourceId>,
}

impl HandPresenceTracker {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            sources: HashSet::new(),
        }
    }

    pub fn hand_detected(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn source_detected(&mut self, source: SourceId) {
        let was_detected = self.hand_detected();
        if self.sources.insert(source) && !was_detected {
            self.notify(true);
        }
    }

    /// Losing a source that was never detected is ignored.
    pub fn source_lost(&mut self, source: SourceId) {
        if self.sources.remove(&source) && self.sources.is_empty() {
            self.notify(false);
        }
    }

    fn notify(&self, hand_detected: bool) {
        debug!(hand_detected, "hand presence changed");
        self.bus
            .hand_presence()
            .publish(&HandPresenceChanged { hand_detected });
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn publishes_only_on_presence_transitions() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = seen.clone();
            bus.hand_presence()
                .subscribe(move |change| seen.borrow_mut().push(change.hand_detected))
        };
        let mut tracker = HandPresenceTracker::new(bus);

        tracker.source_detected(SourceId(1));
        tracker.source_detected(SourceId(2));
        tracker.source_detected(SourceId(1));
        tracker.source_lost(SourceId(1));
        tracker.source_lost(SourceId(9));
        tracker.source_lost(SourceId(2));

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(!tracker.hand_detected());
    }
}
