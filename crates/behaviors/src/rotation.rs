use std::{cell::RefCell, rc::Rc};

use glam::Quat;
use interaction::{EventBus, Subscription};
use serde::{Deserialize, Serialize};
use shared::{
    domain::EntityId,
    protocol::{GestureEvent, GestureInput, GesturePhase, KeywordEvent},
};
use tracing::debug;

use crate::{BehaviorError, SharedScene};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Degrees of yaw per update at full horizontal hand offset.
    pub sensitivity: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { sensitivity: 5.0 }
    }
}

struct RotationState {
    entity: EntityId,
    config: RotationConfig,
    original: Quat,
    previous: Quat,
}

impl RotationState {
    fn on_gesture(&mut self, scene: &SharedScene, event: &GestureEvent) {
        if !event.targets(self.entity) {
            return;
        }
        let GestureInput::Navigation { phase, position } = event.input else {
            return;
        };
        let Some(mut transform) = scene.borrow().transform(self.entity) else {
            debug!(entity = self.entity.0, "rotation target left the scene");
            return;
        };

        match phase {
            GesturePhase::Started | GesturePhase::Completed => {
                self.previous = transform.rotation;
                return;
            }
            GesturePhase::Updated => {
                let yaw_degrees = -(position.x * self.config.sensitivity);
                transform.rotation *= Quat::from_rotation_y(yaw_degrees.to_radians());
            }
            GesturePhase::Canceled => {
                transform.rotation = self.previous;
            }
        }
        scene.borrow_mut().set_transform(self.entity, transform);
    }

    fn on_keyword(&mut self, scene: &SharedScene, event: &KeywordEvent) {
        if !event.is_reset() {
            return;
        }
        let mut scene = scene.borrow_mut();
        if let Some(mut transform) = scene.transform(self.entity) {
            transform.rotation = self.original;
            scene.set_transform(self.entity, transform);
        }
    }
}

/// Yaw rotation driven by navigation gestures on the focused entity.
///
/// Each update turns further from the current orientation; a canceled gesture
/// returns to the orientation held when it started, and the `Reset` keyword
/// returns to the orientation held at attach time.
pub struct GestureRotation {
    entity: EntityId,
    state: Rc<RefCell<RotationState>>,
    gestures: Subscription,
    keywords: Subscription,
}

impl GestureRotation {
    pub fn attach(
        bus: &EventBus,
        scene: SharedScene,
        entity: EntityId,
        config: RotationConfig,
    ) -> Result<Self, BehaviorError> {
        let original = scene
            .borrow()
            .transform(entity)
            .ok_or(BehaviorError::UnknownEntity(entity))?
            .rotation;
        let state = Rc::new(RefCell::new(RotationState {
            entity,
            config,
            original,
            previous: original,
        }));

        let gestures = {
            let state = state.clone();
            let scene = scene.clone();
            bus.gestures()
                .subscribe(move |event| state.borrow_mut().on_gesture(&scene, event))
        };
        let keywords = {
            let state = state.clone();
            bus.keywords()
                .subscribe(move |event| state.borrow_mut().on_keyword(&scene, event))
        };
        debug!(entity = entity.0, sensitivity = config.sensitivity, "rotation attached");

        Ok(Self {
            entity,
            state,
            gestures,
            keywords,
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn original_rotation(&self) -> Quat {
        self.state.borrow().original
    }

    pub fn detach(self) -> Result<(), BehaviorError> {
        let Self {
            gestures, keywords, ..
        } = self;
        gestures.unsubscribe()?;
        keywords.unsubscribe()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/rotation_tests.rs"]
mod tests;
