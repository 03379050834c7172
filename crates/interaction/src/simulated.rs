//! Software stand-in for the native gesture hardware.
//!
//! A single device hosts whichever recognizer is currently capturing. Raw
//! gestures performed while no compatible recognizer captures are not
//! recognized, the way a real headset ignores hand movement it is not
//! listening for.

use std::{cell::RefCell, rc::Rc};

use shared::{domain::GestureVocabulary, protocol::{GesturePhase, RawGesture}};
use tracing::trace;

use crate::ports::{GestureRecognizer, RecognizerFactory};

#[derive(Default)]
struct DeviceState {
    capturing: Option<GestureVocabulary>,
    in_flight: Option<RawGesture>,
    created: usize,
}

#[derive(Clone, Default)]
pub struct SimulatedGestureDevice {
    state: Rc<RefCell<DeviceState>>,
}

impl SimulatedGestureDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> impl RecognizerFactory + 'static {
        let device = self.clone();
        move |vocabulary: GestureVocabulary| -> Box<dyn GestureRecognizer> {
            device.state.borrow_mut().created += 1;
            Box::new(SimulatedRecognizer {
                vocabulary,
                device: device.clone(),
            })
        }
    }

    pub fn capturing(&self) -> Option<GestureVocabulary> {
        self.state.borrow().capturing
    }

    pub fn recognizers_created(&self) -> usize {
        self.state.borrow().created
    }

    pub fn in_flight(&self) -> Option<RawGesture> {
        self.state.borrow().in_flight
    }

    /// Returns the callback the capturing recognizer raises for `raw`, or
    /// `None` when nothing would recognize it.
    pub fn perform(&self, raw: RawGesture) -> Option<RawGesture> {
        let mut state = self.state.borrow_mut();
        let capturing = state.capturing?;
        if raw.input.vocabulary().is_some_and(|vocabulary| vocabulary != capturing) {
            trace!(
                capturing = capturing.as_str(),
                "gesture outside the capturing vocabulary was not recognized"
            );
            return None;
        }
        match raw.input.phase() {
            Some(GesturePhase::Started) | Some(GesturePhase::Updated) => {
                state.in_flight = Some(raw);
            }
            Some(_) => state.in_flight = None,
            None => {}
        }
        Some(raw)
    }
}

struct SimulatedRecognizer {
    vocabulary: GestureVocabulary,
    device: SimulatedGestureDevice,
}

impl GestureRecognizer for SimulatedRecognizer {
    fn vocabulary(&self) -> GestureVocabulary {
        self.vocabulary
    }

    fn start_capturing(&mut self) {
        self.device.state.borrow_mut().capturing = Some(self.vocabulary);
    }

    fn stop_capturing(&mut self) {
        let mut state = self.device.state.borrow_mut();
        if state.capturing == Some(self.vocabulary) {
            state.capturing = None;
        }
    }

    fn cancel_gestures(&mut self) -> Vec<RawGesture> {
        let mut state = self.device.state.borrow_mut();
        if state.capturing != Some(self.vocabulary) {
            return Vec::new();
        }
        state
            .in_flight
            .take()
            .map(RawGesture::into_canceled)
            .into_iter()
            .collect()
    }

    fn is_capturing(&self) -> bool {
        self.device.state.borrow().capturing == Some(self.vocabulary)
    }
}
