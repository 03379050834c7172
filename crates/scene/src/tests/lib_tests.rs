use super::*;
use glam::Quat;

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vec3::new(x, y, z))
}

fn forward_ray() -> Ray {
    Ray::new(Vec3::ZERO, Vec3::NEG_Z)
}

#[test]
fn spawns_and_finds_entities() {
    let mut scene = Scene::new();
    let cube = scene.spawn("cube", at(0.0, 0.0, -2.0));
    let child = scene.spawn_child(cube, "label", at(0.0, 1.0, 0.0)).expect("child");

    assert_eq!(scene.find_by_name("label"), Some(child));
    assert_eq!(scene.parent(child), Some(cube));
    assert_eq!(scene.len(), 2);
    assert_eq!(
        scene.spawn_child(EntityId(99), "orphan", Transform::default()),
        Err(SceneError::UnknownParent(EntityId(99)))
    );
}

#[test]
fn raycast_returns_nearest_hit_on_mask() {
    let mut scene = Scene::new();
    let near = scene.spawn("near", at(0.0, 0.0, -2.0));
    let far = scene.spawn("far", at(0.0, 0.0, -5.0));
    scene.set_collider(near, Collider::cube(0.5)).expect("collider");
    scene.set_collider(far, Collider::cube(0.5)).expect("collider");

    let hit = scene
        .cast(&forward_ray(), None, LayerMask::DEFAULT)
        .expect("hit");
    assert_eq!(hit.entity, near);
    assert!((hit.distance - 1.5).abs() < 1e-5);
    assert!((hit.point - Vec3::new(0.0, 0.0, -1.5)).length() < 1e-5);
}

#[test]
fn raycast_respects_layers_and_range() {
    let mut scene = Scene::new();
    let hologram = scene.spawn("hologram", at(0.0, 0.0, -2.0));
    let wall = scene.spawn("wall", at(0.0, 0.0, -4.0));
    scene.set_collider(hologram, Collider::cube(0.5)).expect("collider");
    scene
        .set_collider(wall, Collider::cube(0.5).on_layer(LayerMask::SPATIAL_MAPPING))
        .expect("collider");

    let hit = scene
        .cast(&forward_ray(), None, LayerMask::SPATIAL_MAPPING)
        .expect("mesh hit");
    assert_eq!(hit.entity, wall);
    assert!(scene
        .cast(&forward_ray(), Some(3.0), LayerMask::SPATIAL_MAPPING)
        .is_none());
}

#[test]
fn raycast_misses_behind_and_inside() {
    let mut scene = Scene::new();
    let behind = scene.spawn("behind", at(0.0, 0.0, 3.0));
    let around = scene.spawn("around", at(0.0, 0.0, 0.0));
    scene.set_collider(behind, Collider::cube(0.5)).expect("collider");
    scene.set_collider(around, Collider::cube(0.5)).expect("collider");

    assert!(scene.cast(&forward_ray(), None, LayerMask::ALL).is_none());
    assert!(scene
        .cast(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO), None, LayerMask::ALL)
        .is_none());
}

#[test]
fn children_follow_parent_transform() {
    let mut scene = Scene::new();
    let parent = scene.spawn(
        "parent",
        Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        },
    );
    let child = scene.spawn_child(parent, "child", at(0.0, 0.0, -1.0)).expect("child");

    let world = scene.world_transform(child).expect("world");
    assert!((world.position - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    assert_eq!(world.scale, Vec3::splat(2.0));
}

#[test]
fn despawn_removes_subtree_and_invalidates_ids() {
    let mut scene = Scene::new();
    let parent = scene.spawn("parent", Transform::default());
    let child = scene.spawn_child(parent, "child", Transform::default()).expect("child");

    scene.despawn(parent).expect("despawn");
    assert!(!scene.contains(parent));
    assert!(!scene.contains(child));
    assert!(!scene.set_transform(child, Transform::default()));
    assert_eq!(scene.despawn(parent), Err(SceneError::UnknownEntity(parent)));
}
