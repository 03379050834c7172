use std::{cell::RefCell, rc::Rc};

use glam::Vec3;
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
pub struct ScalingConfig {
    pub sensitivity: f32,
    /// Grow every axis by the largest delta component instead of per axis.
    pub preserve_aspect_ratio: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            preserve_aspect_ratio: false,
        }
    }
}

struct ScalingState {
    entity: EntityId,
    config: ScalingConfig,
    original: Vec3,
    previous: Vec3,
}

impl ScalingState {
    fn scaled(&self, current: Vec3, delta: Vec3) -> Vec3 {
        let step = if self.config.preserve_aspect_ratio {
            Vec3::splat(delta.max_element())
        } else {
            delta
        };
        current + step * self.config.sensitivity
    }

    fn on_gesture(&mut self, scene: &SharedScene, event: &GestureEvent) {
        if !event.targets(self.entity) {
            return;
        }
        let GestureInput::Manipulation { phase, delta } = event.input else {
            return;
        };
        let Some(mut transform) = scene.borrow().transform(self.entity) else {
            debug!(entity = self.entity.0, "scaling target left the scene");
            return;
        };

        match phase {
            GesturePhase::Started | GesturePhase::Completed => {
                self.previous = transform.scale;
                return;
            }
            GesturePhase::Updated => transform.scale = self.scaled(transform.scale, delta),
            GesturePhase::Canceled => transform.scale = self.previous,
        }
        scene.borrow_mut().set_transform(self.entity, transform);
    }

    fn on_keyword(&mut self, scene: &SharedScene, event: &KeywordEvent) {
        if !event.is_reset() {
            return;
        }
        let mut scene = scene.borrow_mut();
        if let Some(mut transform) = scene.transform(self.entity) {
            transform.scale = self.original;
            scene.set_transform(self.entity, transform);
        }
    }
}

/// Scale driven by manipulation gestures on the focused entity.
pub struct GestureScaling {
    entity: EntityId,
    state: Rc<RefCell<ScalingState>>,
    gestures: Subscription,
    keywords: Subscription,
}

impl GestureScaling {
    pub fn attach(
        bus: &EventBus,
        scene: SharedScene,
        entity: EntityId,
        config: ScalingConfig,
    ) -> Result<Self, BehaviorError> {
        let original = scene
            .borrow()
            .transform(entity)
            .ok_or(BehaviorError::UnknownEntity(entity))?
            .scale;
        let state = Rc::new(RefCell::new(ScalingState {
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
        debug!(
            entity = entity.0,
            sensitivity = config.sensitivity,
            preserve_aspect_ratio = config.preserve_aspect_ratio,
            "scaling attached"
        );

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

    pub fn original_scale(&self) -> Vec3 {
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
#[path = "tests/scaling_tests.rs"]
mod tests;
