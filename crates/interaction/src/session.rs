//! Composition root tying the trackers, controller and dispatcher to one bus.

use std::{cell::RefCell, rc::Rc};

use shared::{
    domain::{EntityId, GestureVocabulary, LayerMask, SourceId, ViewerPose},
    protocol::{FocusChanged, KeywordCommand, RawGesture},
};
use tracing::info;

use crate::{
    bus::{EventBus, Subscription},
    focus::FocusTracker,
    gesture_mode::{GestureModeController, InFlightGesture},
    hand::HandPresenceTracker,
    keyword::KeywordDispatcher,
    ports::{MissingSpeechRecognizer, Raycaster, RecognizerFactory, SpeechRecognizer},
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub initial_vocabulary: GestureVocabulary,
    pub keyword_bindings: Vec<(String, KeywordCommand)>,
    pub gaze_mask: LayerMask,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_vocabulary: GestureVocabulary::Navigation,
            keyword_bindings: Vec::new(),
            gaze_mask: LayerMask::ALL,
        }
    }
}

pub struct InteractionSession {
    bus: EventBus,
    focus: FocusTracker,
    hands: HandPresenceTracker,
    controller: Rc<RefCell<GestureModeController>>,
    keywords: KeywordDispatcher,
    speech: Box<dyn SpeechRecognizer>,
    _focus_link: Subscription,
}

impl InteractionSession {
    pub fn new(factory: impl RecognizerFactory + 'static, options: SessionOptions) -> Self {
        Self::with_speech(factory, MissingSpeechRecognizer, options)
    }

    pub fn with_speech(
        factory: impl RecognizerFactory + 'static,
        speech: impl SpeechRecognizer + 'static,
        options: SessionOptions,
    ) -> Self {
        let bus = EventBus::new();
        let controller = Rc::new(RefCell::new(GestureModeController::new(
            bus.clone(),
            factory,
            options.initial_vocabulary,
        )));

        let focus_link = {
            let controller = Rc::downgrade(&controller);
            bus.focus_changes().subscribe(move |change: &FocusChanged| {
                if let Some(controller) = controller.upgrade() {
                    controller.borrow_mut().on_focus_changed(change.current);
                }
            })
        };

        let keywords = KeywordDispatcher::new(bus.clone()).with_bindings(options.keyword_bindings);
        let mut speech: Box<dyn SpeechRecognizer> = Box::new(speech);
        let phrases = keywords.phrases();
        speech.start(&phrases);
        info!(
            phrases = ?phrases,
            vocabulary = options.initial_vocabulary.as_str(),
            "interaction session started"
        );

        Self {
            focus: FocusTracker::new(bus.clone()).with_mask(options.gaze_mask),
            hands: HandPresenceTracker::new(bus.clone()),
            bus,
            controller,
            keywords,
            speech,
            _focus_link: focus_link,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Per-frame update hook.
    pub fn tick<R>(&mut self, pose: &ViewerPose, raycaster: &R) -> Option<FocusChanged>
    where
        R: Raycaster + ?Sized,
    {
        self.focus.tick(pose, raycaster)
    }

    pub fn on_raw_gesture(&self, raw: RawGesture) {
        self.controller.borrow_mut().on_raw_gesture(raw);
    }

    pub fn on_phrase_recognized(&self, phrase: &str) -> Option<KeywordCommand> {
        let command = self.keywords.on_phrase_recognized(phrase)?;
        if let KeywordCommand::ModeSwitch(vocabulary) = command {
            self.controller.borrow_mut().switch_vocabulary(vocabulary);
        }
        Some(command)
    }

    pub fn source_detected(&mut self, source: SourceId) {
        self.hands.source_detected(source);
    }

    pub fn source_lost(&mut self, source: SourceId) {
        self.hands.source_lost(source);
    }

    pub fn phrases(&self) -> Vec<String> {
        self.keywords.phrases()
    }

    pub fn focused(&self) -> Option<EntityId> {
        self.focus.focused()
    }

    pub fn hand_detected(&self) -> bool {
        self.hands.hand_detected()
    }

    pub fn active_vocabulary(&self) -> GestureVocabulary {
        self.controller.borrow().active_vocabulary()
    }

    pub fn is_capturing(&self) -> bool {
        self.controller.borrow().is_capturing()
    }

    pub fn in_flight(&self) -> Vec<InFlightGesture> {
        self.controller.borrow().in_flight()
    }
}

impl Drop for InteractionSession {
    fn drop(&mut self) {
        self.speech.stop();
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
