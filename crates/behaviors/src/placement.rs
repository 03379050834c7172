use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use interaction::{EventBus, MeshVisualizer, Subscription};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{EntityId, LayerMask, Transform, ViewerPose},
    protocol::{GestureEvent, GestureInput},
};
use tracing::{debug, trace};

use crate::{BehaviorError, SharedScene};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub max_distance: f32,
    /// Layers the placement ray may land on.
    pub mask: LayerMask,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_distance: 30.0,
            mask: LayerMask::SPATIAL_MAPPING,
        }
    }
}

pub type SharedVisualizer = Rc<RefCell<dyn MeshVisualizer>>;

/// Tap-toggled placement of an entity's parent onto the spatial mesh.
///
/// While placing, every [`TapToPlace::tick`] follows the viewer's gaze and
/// stands the parent upright at the hit point, facing the viewer's heading.
/// Entities without a parent are moved themselves.
pub struct TapToPlace {
    entity: EntityId,
    config: PlacementConfig,
    scene: SharedScene,
    placing: Rc<Cell<bool>>,
    gestures: Subscription,
}

impl TapToPlace {
    pub fn attach(
        bus: &EventBus,
        scene: SharedScene,
        entity: EntityId,
        visualizer: SharedVisualizer,
        config: PlacementConfig,
    ) -> Result<Self, BehaviorError> {
        if !scene.borrow().contains(entity) {
            return Err(BehaviorError::UnknownEntity(entity));
        }
        let placing = Rc::new(Cell::new(false));

        let gestures = {
            let placing = placing.clone();
            bus.gestures().subscribe(move |event: &GestureEvent| {
                if !event.targets(entity) || !matches!(event.input, GestureInput::Tap { .. }) {
                    return;
                }
                let now_placing = !placing.get();
                placing.set(now_placing);
                debug!(entity = entity.0, placing = now_placing, "placement toggled");
                visualizer.borrow_mut().set_draw_visual_meshes(now_placing);
            })
        };
        debug!(entity = entity.0, max_distance = config.max_distance, "placement attached");

        Ok(Self {
            entity,
            config,
            scene,
            placing,
            gestures,
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn is_placing(&self) -> bool {
        self.placing.get()
    }

    /// Per-frame update. Returns whether the target moved.
    pub fn tick(&self, pose: &ViewerPose) -> bool {
        if !self.is_placing() {
            return false;
        }
        let (target, placed) = {
            let scene = self.scene.borrow();
            if !scene.contains(self.entity) {
                return false;
            }
            let target = scene.parent(self.entity).unwrap_or(self.entity);
            let Some(hit) = scene.cast(&pose.gaze(), Some(self.config.max_distance), self.config.mask)
            else {
                trace!(entity = self.entity.0, "placement ray found no surface");
                return false;
            };
            let Some(mut placed) = scene.transform(target) else {
                return false;
            };
            // The hit point and heading are world-space; the scene stores
            // parent-relative transforms.
            let frame = match scene.parent(target) {
                Some(grandparent) => match scene.world_transform(grandparent) {
                    Some(frame) => frame,
                    None => return false,
                },
                None => Transform::default(),
            };
            let Some((position, rotation)) = frame.localize(hit.point, pose.yaw_rotation()) else {
                debug!(entity = self.entity.0, "placement frame is degenerate");
                return false;
            };
            placed.position = position;
            placed.rotation = rotation;
            (target, placed)
        };

        self.scene.borrow_mut().set_transform(target, placed)
    }

    pub fn detach(self) -> Result<(), BehaviorError> {
        self.gestures.unsubscribe()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/placement_tests.rs"]
mod tests;
