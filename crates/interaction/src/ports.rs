//! Boundaries to the host engine and native input subsystems.

use std::cell::RefCell;

use glam::Vec3;
use shared::{
    domain::{EntityId, GestureVocabulary, LayerMask, Ray, Transform},
    protocol::RawGesture,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

pub trait Raycaster {
    /// Nearest hit along `ray` on any layer in `mask`. `None` distance means
    /// unbounded.
    fn cast(&self, ray: &Ray, max_distance: Option<f32>, mask: LayerMask) -> Option<RaycastHit>;
}

/// Borrows only for the duration of the cast, so listeners reached by the
/// resulting events may mutate the scene.
impl<R: Raycaster + ?Sized> Raycaster for RefCell<R> {
    fn cast(&self, ray: &Ray, max_distance: Option<f32>, mask: LayerMask) -> Option<RaycastHit> {
        self.borrow().cast(ray, max_distance, mask)
    }
}

/// Transform access for behaviors. Entity ids are weak back-references, so
/// every lookup may miss.
pub trait SceneAccess: Raycaster {
    fn contains(&self, entity: EntityId) -> bool;
    /// Local transform, relative to the parent.
    fn transform(&self, entity: EntityId) -> Option<Transform>;
    /// Parent transforms composed down to `entity`.
    fn world_transform(&self, entity: EntityId) -> Option<Transform>;
    /// Returns `false` when the entity no longer exists.
    fn set_transform(&mut self, entity: EntityId, transform: Transform) -> bool;
    fn parent(&self, entity: EntityId) -> Option<EntityId>;
}

/// One native gesture recognizer configured for a single vocabulary.
pub trait GestureRecognizer {
    fn vocabulary(&self) -> GestureVocabulary;
    fn start_capturing(&mut self);
    fn stop_capturing(&mut self);
    /// Aborts any in-flight gesture and returns the Canceled callbacks it
    /// produced, so the caller can forward them before returning.
    fn cancel_gestures(&mut self) -> Vec<RawGesture>;
    fn is_capturing(&self) -> bool;
}

pub trait RecognizerFactory {
    fn create(&mut self, vocabulary: GestureVocabulary) -> Box<dyn GestureRecognizer>;
}

impl<F> RecognizerFactory for F
where
    F: FnMut(GestureVocabulary) -> Box<dyn GestureRecognizer>,
{
    fn create(&mut self, vocabulary: GestureVocabulary) -> Box<dyn GestureRecognizer> {
        self(vocabulary)
    }
}

pub trait SpeechRecognizer {
    fn start(&mut self, phrases: &[String]);
    fn stop(&mut self);
}

/// Speech backend for hosts without a microphone; phrases are fed directly to
/// the session instead.
pub struct MissingSpeechRecognizer;

impl SpeechRecognizer for MissingSpeechRecognizer {
    fn start(&mut self, _phrases: &[String]) {}

    fn stop(&mut self) {}
}

/// Spatial-mapping mesh renderer toggle.
pub trait MeshVisualizer {
    fn set_draw_visual_meshes(&mut self, visible: bool);
}
