use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);
    };
}

id_newtype!(EntityId, i64);
id_newtype!(SourceId, u32);

/// Gesture vocabularies the native recognizer can be configured with. Only one
/// is ever listened for at a time; navigation and manipulation interfere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureVocabulary {
    #[default]
    Navigation,
    Manipulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizableGesture {
    Tap,
    NavigationX,
    NavigationY,
    NavigationZ,
    ManipulationTranslate,
}

impl GestureVocabulary {
    pub fn recognizable_gestures(self) -> &'static [RecognizableGesture] {
        match self {
            Self::Navigation => &[
                RecognizableGesture::Tap,
                RecognizableGesture::NavigationX,
                RecognizableGesture::NavigationY,
                RecognizableGesture::NavigationZ,
            ],
            Self::Manipulation => &[
                RecognizableGesture::Tap,
                RecognizableGesture::ManipulationTranslate,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Manipulation => "manipulation",
        }
    }
}

impl std::str::FromStr for GestureVocabulary {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigation" | "rotate" => Ok(Self::Navigation),
            "manipulation" | "scale" => Ok(Self::Manipulation),
            other => Err(format!("unknown gesture vocabulary '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray with a normalized direction. A zero direction stays zero
    /// and will never hit anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Re-expresses a world-space position and rotation relative to `self`,
    /// taken as a parent's world transform. `None` when the parent has a
    /// zero scale component.
    pub fn localize(&self, position: Vec3, rotation: Quat) -> Option<(Vec3, Quat)> {
        let inverse_scale = self.scale.recip();
        if !inverse_scale.is_finite() {
            return None;
        }
        let inverse_rotation = self.rotation.inverse();
        Some((
            inverse_scale * (inverse_rotation * (position - self.position)),
            inverse_rotation * rotation,
        ))
    }
}

/// Head pose of the viewer, refreshed by the host once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for ViewerPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl ViewerPose {
    /// Builds a pose looking along `forward` with no roll.
    pub fn looking(position: Vec3, forward: Vec3) -> Self {
        let forward = forward.normalize_or_zero();
        if forward == Vec3::ZERO {
            return Self {
                position,
                rotation: Quat::IDENTITY,
            };
        }
        let yaw = (-forward.x).atan2(-forward.z);
        let pitch = forward.y.clamp(-1.0, 1.0).asin();
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch),
        }
    }

    /// Forward direction; -Z in viewer space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn gaze(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }

    /// Rotation with pitch and roll removed.
    pub fn yaw_rotation(&self) -> Quat {
        let forward = self.forward();
        if forward.x.abs() < f32::EPSILON && forward.z.abs() < f32::EPSILON {
            return Quat::IDENTITY;
        }
        Quat::from_rotation_y((-forward.x).atan2(-forward.z))
    }
}

/// Collision layers a raycast may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const DEFAULT: LayerMask = LayerMask(1);
    pub const SPATIAL_MAPPING: LayerMask = LayerMask(1 << 31);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}
