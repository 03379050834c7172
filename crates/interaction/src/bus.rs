//! Synchronous publish/subscribe hub with one channel per event family.
//!
//! Every publish runs on the caller's thread and returns only after all
//! listeners have run. The listener list is snapshotted when a publish begins:
//! a listener removed during dispatch still receives the event being
//! delivered but nothing published afterwards, and a listener added during
//! dispatch first sees the next publish. Listeners may publish re-entrantly.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use shared::{
    error::{BusError, ChannelKind},
    protocol::{FocusChanged, GestureEvent, HandPresenceChanged, KeywordEvent},
};
use tracing::{error, trace};

type Listener<E> = Rc<dyn Fn(&E)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub channel: ChannelKind,
    pub seq: u64,
}

struct ChannelState<E> {
    kind: ChannelKind,
    next_seq: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

trait Detach {
    fn detach(&self, seq: u64) -> Result<(), BusError>;
}

impl<E> Detach for RefCell<ChannelState<E>> {
    fn detach(&self, seq: u64) -> Result<(), BusError> {
        let mut state = self.borrow_mut();
        let Some(index) = state.listeners.iter().position(|(id, _)| *id == seq) else {
            return Err(BusError::UnknownSubscription {
                channel: state.kind,
                id: seq,
            });
        };
        state.listeners.remove(index);
        trace!(channel = %state.kind, seq, "listener removed");
        Ok(())
    }
}

pub struct Channel<E> {
    state: Rc<RefCell<ChannelState<E>>>,
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E: 'static> Channel<E> {
    fn new(kind: ChannelKind) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChannelState {
                kind,
                next_seq: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.state.borrow().kind
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.listeners.push((seq, Rc::new(listener)));
        trace!(channel = %state.kind, seq, "listener added");

        let detach: Rc<dyn Detach> = self.state.clone();
        Subscription {
            id: SubscriptionId {
                channel: state.kind,
                seq,
            },
            channel: Some(Rc::downgrade(&detach)),
        }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let kind = self.kind();
        if id.channel != kind {
            return Err(BusError::UnknownSubscription {
                channel: kind,
                id: id.seq,
            });
        }
        self.state.detach(id.seq)
    }

    pub fn publish(&self, event: &E) {
        let listeners: Vec<Listener<E>> = {
            let state = self.state.borrow();
            if state.listeners.is_empty() {
                return;
            }
            trace!(
                channel = %state.kind,
                subscribers = state.listeners.len(),
                "publishing"
            );
            state
                .listeners
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect()
        };

        for listener in listeners {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

/// Scoped registration. Dropping it removes the listener, so a consumer that
/// is torn down on any path cannot leak its subscription.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: SubscriptionId,
    channel: Option<Weak<dyn Detach>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the listener now and reports misuse instead of logging it.
    pub fn unsubscribe(mut self) -> Result<(), BusError> {
        match self.channel.take().and_then(|channel| channel.upgrade()) {
            Some(channel) => channel.detach(self.id.seq),
            None => Ok(()),
        }
    }

    /// Disarms the guard. The listener stays registered until
    /// [`EventBus::unsubscribe`] is called with the returned id.
    pub fn into_id(mut self) -> SubscriptionId {
        self.channel = None;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(channel) = self.channel.take().and_then(|channel| channel.upgrade()) else {
            return;
        };
        if let Err(err) = channel.detach(self.id.seq) {
            error!(%err, "subscription guard released a listener that was already removed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Cheap-clone handle to the four interaction channels.
#[derive(Clone)]
pub struct EventBus {
    gestures: Channel<GestureEvent>,
    keywords: Channel<KeywordEvent>,
    focus_changes: Channel<FocusChanged>,
    hand_presence: Channel<HandPresenceChanged>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            gestures: Channel::new(ChannelKind::Gesture),
            keywords: Channel::new(ChannelKind::Keyword),
            focus_changes: Channel::new(ChannelKind::FocusChanged),
            hand_presence: Channel::new(ChannelKind::HandPresence),
        }
    }

    pub fn gestures(&self) -> &Channel<GestureEvent> {
        &self.gestures
    }

    pub fn keywords(&self) -> &Channel<KeywordEvent> {
        &self.keywords
    }

    pub fn focus_changes(&self) -> &Channel<FocusChanged> {
        &self.focus_changes
    }

    pub fn hand_presence(&self) -> &Channel<HandPresenceChanged> {
        &self.hand_presence
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        match id.channel {
            ChannelKind::Gesture => self.gestures.unsubscribe(id),
            ChannelKind::Keyword => self.keywords.unsubscribe(id),
            ChannelKind::FocusChanged => self.focus_changes.unsubscribe(id),
            ChannelKind::HandPresence => self.hand_presence.unsubscribe(id),
        }
    }

    pub fn subscriber_count(&self, channel: ChannelKind) -> usize {
        match channel {
            ChannelKind::Gesture => self.gestures.subscriber_count(),
            ChannelKind::Keyword => self.keywords.subscriber_count(),
            ChannelKind::FocusChanged => self.focus_changes.subscriber_count(),
            ChannelKind::HandPresence => self.hand_presence.subscriber_count(),
        }
    }
}

#[cfg(test)]
#[path = "tests/bus_tests.rs"]
mod tests;
