use super::*;
use std::{cell::Cell, rc::Rc};

use glam::Vec3;
use shared::domain::Ray;

use crate::ports::RaycastHit;

#[derive(Default)]
struct StubGaze {
    hit: Cell<Option<EntityId>>,
    last_mask: Cell<Option<LayerMask>>,
}

impl StubGaze {
    fn look_at(&self, entity: Option<EntityId>) {
        self.hit.set(entity);
    }
}

impl Raycaster for StubGaze {
    fn cast(&self, ray: &Ray, _max_distance: Option<f32>, mask: LayerMask) -> Option<RaycastHit> {
        self.last_mask.set(Some(mask));
        self.hit.get().map(|entity| RaycastHit {
            entity,
            point: ray.at(2.0),
            distance: 2.0,
        })
    }
}

fn counting_tracker() -> (FocusTracker, Rc<Cell<u32>>, crate::bus::Subscription) {
    let bus = EventBus::new();
    let fired = Rc::new(Cell::new(0));
    let sub = {
        let fired = fired.clone();
        bus.focus_changes()
            .subscribe(move |_| fired.set(fired.get() + 1))
    };
    (FocusTracker::new(bus), fired, sub)
}

#[test]
fn focus_change_fires_only_on_identity_change() {
    let (mut tracker, fired, _sub) = counting_tracker();
    let gaze = StubGaze::default();
    let pose = ViewerPose::default();

    gaze.look_at(Some(EntityId(1)));
    let change = tracker.tick(&pose, &gaze).expect("first focus");
    assert_eq!(change.previous, None);
    assert_eq!(change.current, Some(EntityId(1)));

    assert!(tracker.tick(&pose, &gaze).is_none());
    assert!(tracker.tick(&pose, &gaze).is_none());
    assert_eq!(fired.get(), 1);

    gaze.look_at(Some(EntityId(2)));
    tracker.tick(&pose, &gaze).expect("switch focus");
    assert_eq!(fired.get(), 2);
    assert_eq!(tracker.state().previous, Some(EntityId(1)));
}

#[test]
fn miss_clears_focus_once() {
    let (mut tracker, fired, _sub) = counting_tracker();
    let gaze = StubGaze::default();
    let pose = ViewerPose::looking(Vec3::ZERO, Vec3::X);

    assert!(tracker.tick(&pose, &gaze).is_none());
    assert_eq!(fired.get(), 0);

    gaze.look_at(Some(EntityId(7)));
    tracker.tick(&pose, &gaze);
    gaze.look_at(None);
    let cleared = tracker.tick(&pose, &gaze).expect("focus cleared");
    assert_eq!(cleared.current, None);
    assert!(tracker.tick(&pose, &gaze).is_none());

    assert_eq!(fired.get(), 2);
    assert_eq!(tracker.focused(), None);
}

#[test]
fn gaze_uses_configured_mask() {
    let gaze = StubGaze::default();

    let mut tracker = FocusTracker::new(EventBus::new());
    tracker.tick(&ViewerPose::default(), &gaze);
    assert_eq!(gaze.last_mask.get(), Some(LayerMask::ALL));
    assert!(gaze
        .last_mask
        .get()
        .is_some_and(|mask| mask.intersects(LayerMask::SPATIAL_MAPPING)));

    let mut narrowed = FocusTracker::new(EventBus::new()).with_mask(LayerMask::DEFAULT);
    narrowed.tick(&ViewerPose::default(), &gaze);
    assert_eq!(gaze.last_mask.get(), Some(LayerMask::DEFAULT));
}
