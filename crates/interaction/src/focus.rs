//! Per-frame gaze focus tracking.

use shared::{
    domain::{EntityId, LayerMask, ViewerPose},
    protocol::FocusChanged,
};
use tracing::debug;

use crate::{bus::EventBus, ports::Raycaster};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    pub current: Option<EntityId>,
    pub previous: Option<EntityId>,
}

pub struct FocusTracker {
    bus: EventBus,
    state: FocusState,
    mask: LayerMask,
}

impl FocusTracker {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            state: FocusState::default(),
            mask: LayerMask::ALL,
        }
    }

    /// Layers the gaze ray may hit. Every layer, spatial mapping included, by
    /// default.
    pub fn with_mask(mut self, mask: LayerMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn focused(&self) -> Option<EntityId> {
        self.state.current
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Runs once per frame. Returns the published change, if any.
    pub fn tick<R>(&mut self, pose: &ViewerPose, raycaster: &R) -> Option<FocusChanged>
    where
        R: Raycaster + ?Sized,
    {
        let candidate = raycaster
            .cast(&pose.gaze(), None, self.mask)
            .map(|hit| hit.entity);

        let previous = self.state.current;
        self.state.previous = previous;
        if candidate == previous {
            return None;
        }

        self.state.current = candidate;
        let change = FocusChanged {
            previous,
            current: candidate,
        };
        debug!(previous = ?previous, current = ?candidate, "gaze focus changed");
        self.bus.focus_changes().publish(&change);
        Some(change)
    }
}

#[cfg(test)]
#[path = "tests/focus_tests.rs"]
mod tests;
