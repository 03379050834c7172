//! Gaze, gesture and voice coordination for mixed-reality interaction.
//!
//! Everything here runs on the host's frame thread. Native recognizer and
//! speech callbacks must be marshaled onto that thread before they reach the
//! session.

pub mod bus;
pub mod focus;
pub mod gesture_mode;
pub mod hand;
pub mod keyword;
pub mod ports;
pub mod session;
pub mod simulated;

pub use bus::{Channel, EventBus, Subscription, SubscriptionId};
pub use focus::{FocusState, FocusTracker};
pub use gesture_mode::{ActiveRecognizer, GestureModeController, InFlightGesture};
pub use hand::HandPresenceTracker;
pub use keyword::KeywordDispatcher;
pub use ports::{
    GestureRecognizer, MeshVisualizer, MissingSpeechRecognizer, RaycastHit, Raycaster,
    RecognizerFactory, SceneAccess, SpeechRecognizer,
};
pub use session::{InteractionSession, SessionOptions};
pub use simulated::SimulatedGestureDevice;
