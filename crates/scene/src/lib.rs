//! In-memory scene graph used by the simulator and tests.
//!
//! Transforms are stored parent-relative. Colliders are boxes around the
//! entity origin; raycasts test their world-space bounding box.

use std::collections::BTreeMap;

use glam::{Mat3, Vec3};
use interaction::{RaycastHit, Raycaster, SceneAccess};
use serde::{Deserialize, Serialize};
use shared::domain::{EntityId, LayerMask, Ray, Transform};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub half_extents: Vec3,
    #[serde(default)]
    pub layer: LayerMask,
}

impl Collider {
    pub fn cube(half_extent: f32) -> Self {
        Self {
            half_extents: Vec3::splat(half_extent),
            layer: LayerMask::DEFAULT,
        }
    }

    pub fn on_layer(mut self, layer: LayerMask) -> Self {
        self.layer = layer;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SceneEntity {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<EntityId>,
    pub collider: Option<Collider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("entity {0:?} does not exist")]
    UnknownEntity(EntityId),
    #[error("parent {0:?} does not exist")]
    UnknownParent(EntityId),
}

#[derive(Debug, Default)]
pub struct Scene {
    entities: BTreeMap<EntityId, SceneEntity>,
    next_id: i64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> EntityId {
        self.insert(name.into(), transform, None)
    }

    pub fn spawn_child(
        &mut self,
        parent: EntityId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<EntityId, SceneError> {
        if !self.entities.contains_key(&parent) {
            return Err(SceneError::UnknownParent(parent));
        }
        Ok(self.insert(name.into(), transform, Some(parent)))
    }

    fn insert(&mut self, name: String, transform: Transform, parent: Option<EntityId>) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        debug!(entity = id.0, name = %name, parent = ?parent, "entity spawned");
        self.entities.insert(
            id,
            SceneEntity {
                name,
                transform,
                parent,
                collider: None,
            },
        );
        id
    }

    pub fn set_collider(&mut self, entity: EntityId, collider: Collider) -> Result<(), SceneError> {
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(SceneError::UnknownEntity(entity))?;
        record.collider = Some(collider);
        Ok(())
    }

    /// Removes the entity and all of its descendants.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), SceneError> {
        if !self.entities.contains_key(&entity) {
            return Err(SceneError::UnknownEntity(entity));
        }
        let mut pending = vec![entity];
        while let Some(id) = pending.pop() {
            pending.extend(
                self.entities
                    .iter()
                    .filter(|(_, record)| record.parent == Some(id))
                    .map(|(child, _)| *child),
            );
            self.entities.remove(&id);
            debug!(entity = id.0, "entity despawned");
        }
        Ok(())
    }

    pub fn entity(&self, entity: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&entity)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(id, _)| *id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &SceneEntity)> {
        self.entities.iter().map(|(id, record)| (*id, record))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Composes parent transforms down to `entity`.
    pub fn world_transform(&self, entity: EntityId) -> Option<Transform> {
        let record = self.entities.get(&entity)?;
        let local = record.transform;
        let Some(parent) = record.parent else {
            return Some(local);
        };
        let parent = self.world_transform(parent)?;
        Some(Transform {
            position: parent.position + parent.rotation * (parent.scale * local.position),
            rotation: parent.rotation * local.rotation,
            scale: parent.scale * local.scale,
        })
    }

    /// Axis-aligned world bounds of the entity's collider.
    pub fn world_bounds(&self, entity: EntityId) -> Option<(Vec3, Vec3)> {
        let collider = self.entities.get(&entity)?.collider?;
        let world = self.world_transform(entity)?;
        let extents = collider.half_extents * world.scale.abs();
        let basis = Mat3::from_quat(world.rotation);
        let rotated = Vec3::new(
            basis.row(0).abs().dot(extents),
            basis.row(1).abs().dot(extents),
            basis.row(2).abs().dot(extents),
        );
        Some((world.position - rotated, world.position + rotated))
    }
}

/// Entry distance of `ray` into the box, or `None` on a miss. Rays starting
/// inside a box do not hit it.
fn ray_box_distance(ray: &Ray, min: Vec3, max: Vec3) -> Option<f32> {
    if ray.direction == Vec3::ZERO {
        return None;
    }
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction.abs() < f32::EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - origin) / direction;
        let t2 = (max[axis] - origin) / direction;
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }
    if t_enter < 0.0 || t_exit < t_enter {
        return None;
    }
    Some(t_enter)
}

impl Raycaster for Scene {
    fn cast(&self, ray: &Ray, max_distance: Option<f32>, mask: LayerMask) -> Option<RaycastHit> {
        let limit = max_distance.unwrap_or(f32::INFINITY);
        self.entities
            .iter()
            .filter(|(_, record)| {
                record
                    .collider
                    .is_some_and(|collider| collider.layer.intersects(mask))
            })
            .filter_map(|(id, _)| {
                let (min, max) = self.world_bounds(*id)?;
                let distance = ray_box_distance(ray, min, max)?;
                (distance <= limit).then(|| RaycastHit {
                    entity: *id,
                    point: ray.at(distance),
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl SceneAccess for Scene {
    fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.entities.get(&entity).map(|record| record.transform)
    }

    fn world_transform(&self, entity: EntityId) -> Option<Transform> {
        Scene::world_transform(self, entity)
    }

    fn set_transform(&mut self, entity: EntityId, transform: Transform) -> bool {
        match self.entities.get_mut(&entity) {
            Some(record) => {
                record.transform = transform;
                true
            }
            None => false,
        }
    }

    fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(&entity).and_then(|record| record.parent)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
