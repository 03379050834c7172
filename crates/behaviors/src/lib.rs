//! Per-entity consumers of the interaction bus.
//!
//! A behavior subscribes when it is attached and holds its subscriptions as
//! guards, so dropping it on any path (explicit detach, scope exit, unwinding)
//! removes its listeners.

use std::{cell::RefCell, rc::Rc};

use interaction::SceneAccess;
use shared::{domain::EntityId, error::BusError};
use thiserror::Error;

pub mod placement;
pub mod rotation;
pub mod scaling;

pub use placement::{PlacementConfig, SharedVisualizer, TapToPlace};
pub use rotation::{GestureRotation, RotationConfig};
pub use scaling::{GestureScaling, ScalingConfig};

pub type SharedScene = Rc<RefCell<dyn SceneAccess>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviorError {
    #[error("cannot attach behavior: entity {0:?} is not in the scene")]
    UnknownEntity(EntityId),
    #[error(transparent)]
    Bus(#[from] BusError),
}
