//! Gesture-mode state machine.
//!
//! The controller owns the single live native recognizer. Which vocabulary is
//! listened for is the variant of [`ActiveRecognizer`]; the other vocabulary
//! has no recognizer at all, so both can never capture at the same time.
//! Capture is additionally gated by gaze focus: nothing is captured while the
//! user looks at empty space.
//!
//! Every transition is stop-then-start. In-flight gestures are canceled, never
//! completed, and their Canceled events are published before the transition
//! returns.

use std::collections::BTreeMap;

use glam::Vec3;
use shared::{
    domain::{EntityId, GestureVocabulary, Ray, SourceId},
    protocol::{GestureEvent, GestureInput, GesturePhase, RawGesture},
};
use tracing::{debug, warn};

use crate::{
    bus::EventBus,
    ports::{GestureRecognizer, RecognizerFactory},
};

pub enum ActiveRecognizer {
    Navigation(Box<dyn GestureRecognizer>),
    Manipulation(Box<dyn GestureRecognizer>),
}

impl ActiveRecognizer {
    fn create(factory: &mut dyn RecognizerFactory, vocabulary: GestureVocabulary) -> Self {
        let recognizer = factory.create(vocabulary);
        if recognizer.vocabulary() != vocabulary {
            warn!(
                requested = vocabulary.as_str(),
                created = recognizer.vocabulary().as_str(),
                "recognizer factory returned a recognizer for another vocabulary"
            );
        }
        match vocabulary {
            GestureVocabulary::Navigation => Self::Navigation(recognizer),
            GestureVocabulary::Manipulation => Self::Manipulation(recognizer),
        }
    }

    pub fn vocabulary(&self) -> GestureVocabulary {
        match self {
            Self::Navigation(_) => GestureVocabulary::Navigation,
            Self::Manipulation(_) => GestureVocabulary::Manipulation,
        }
    }

    fn recognizer(&self) -> &dyn GestureRecognizer {
        match self {
            Self::Navigation(recognizer) | Self::Manipulation(recognizer) => recognizer.as_ref(),
        }
    }

    fn recognizer_mut(&mut self) -> &mut dyn GestureRecognizer {
        match self {
            Self::Navigation(recognizer) | Self::Manipulation(recognizer) => recognizer.as_mut(),
        }
    }
}

/// A continuous gesture that has started but not yet completed or canceled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InFlightGesture {
    pub source: SourceId,
    pub ray: Ray,
    pub input: GestureInput,
}

impl InFlightGesture {
    fn canceled(&self) -> RawGesture {
        RawGesture {
            source: self.source,
            ray: self.ray,
            input: self.input,
        }
        .into_canceled()
    }
}

pub struct GestureModeController {
    bus: EventBus,
    factory: Box<dyn RecognizerFactory>,
    active: ActiveRecognizer,
    capturing: bool,
    focused: Option<EntityId>,
    in_flight: BTreeMap<SourceId, InFlightGesture>,
}

impl GestureModeController {
    /// Creates the recognizer for `initial`. Capture starts with the first
    /// focus change onto an entity.
    pub fn new(
        bus: EventBus,
        factory: impl RecognizerFactory + 'static,
        initial: GestureVocabulary,
    ) -> Self {
        let mut factory: Box<dyn RecognizerFactory> = Box::new(factory);
        let active = ActiveRecognizer::create(factory.as_mut(), initial);
        Self {
            bus,
            factory,
            active,
            capturing: false,
            focused: None,
            in_flight: BTreeMap::new(),
        }
    }

    pub fn active_vocabulary(&self) -> GestureVocabulary {
        self.active.vocabulary()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn is_recognizer_capturing(&self) -> bool {
        self.active.recognizer().is_capturing()
    }

    pub fn focused(&self) -> Option<EntityId> {
        self.focused
    }

    /// Gestures started but not yet terminated, one per source.
    pub fn in_flight(&self) -> Vec<InFlightGesture> {
        self.in_flight.values().copied().collect()
    }

    /// Restarts capture for the new focus, or stops it when focus is lost.
    /// Canceled events for the abandoned gesture still carry the entity that
    /// was focused while it ran.
    pub fn on_focus_changed(&mut self, focused: Option<EntityId>) {
        self.cancel_and_stop();
        self.focused = focused;
        if focused.is_some() {
            self.start();
        }
        debug!(
            focused = ?focused,
            vocabulary = self.active.vocabulary().as_str(),
            capturing = self.capturing,
            "gesture capture re-gated on focus"
        );
    }

    /// Replaces the live recognizer with a fresh one for `vocabulary`. A
    /// switch to the vocabulary already active still restarts it.
    pub fn switch_vocabulary(&mut self, vocabulary: GestureVocabulary) {
        let previous = self.active.vocabulary();
        self.cancel_and_stop();
        self.active = ActiveRecognizer::create(self.factory.as_mut(), vocabulary);
        if self.focused.is_some() {
            self.start();
        }
        debug!(
            from = previous.as_str(),
            to = vocabulary.as_str(),
            capturing = self.capturing,
            "gesture vocabulary switched"
        );
    }

    /// Normalizes a native callback and publishes it with the tracked focus.
    /// Callbacks are forwarded whether or not anything is focused; consumers
    /// filter by entity.
    pub fn on_raw_gesture(&mut self, raw: RawGesture) {
        if let Some(vocabulary) = raw.input.vocabulary() {
            if vocabulary != self.active.vocabulary() {
                debug!(
                    vocabulary = vocabulary.as_str(),
                    active = self.active.vocabulary().as_str(),
                    "forwarding gesture from inactive vocabulary"
                );
            }
        }
        self.forward(raw);
    }

    fn start(&mut self) {
        self.active.recognizer_mut().start_capturing();
        self.capturing = true;
    }

    fn cancel_and_stop(&mut self) {
        let canceled = self.active.recognizer_mut().cancel_gestures();
        for raw in canceled {
            self.forward(raw);
        }
        for abandoned in std::mem::take(&mut self.in_flight).into_values() {
            warn!(
                source = abandoned.source.0,
                "recognizer did not report cancellation; synthesizing Canceled"
            );
            self.forward(abandoned.canceled());
        }
        self.active.recognizer_mut().stop_capturing();
        self.capturing = false;
    }

    fn forward(&mut self, raw: RawGesture) {
        let input = normalize(raw.input);
        match input.phase() {
            Some(GesturePhase::Started) | Some(GesturePhase::Updated) => {
                self.in_flight.insert(
                    raw.source,
                    InFlightGesture {
                        source: raw.source,
                        ray: raw.ray,
                        input,
                    },
                );
            }
            Some(GesturePhase::Completed) | Some(GesturePhase::Canceled) => {
                self.in_flight.remove(&raw.source);
            }
            None => {}
        }

        let event = GestureEvent {
            input,
            focused_entity: self.focused,
            source: raw.source,
            ray: raw.ray,
        };
        self.bus.gestures().publish(&event);
    }
}

fn normalize(input: GestureInput) -> GestureInput {
    match input {
        GestureInput::Navigation { phase, position } => GestureInput::Navigation {
            phase,
            position: position.clamp(Vec3::NEG_ONE, Vec3::ONE),
        },
        other => other,
    }
}

#[cfg(test)]
#[path = "tests/gesture_mode_tests.rs"]
mod tests;
