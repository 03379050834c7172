use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::domain::{EntityId, GestureVocabulary, Ray, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Started,
    Updated,
    Completed,
    Canceled,
}

impl GesturePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

/// Flat view of every normalized gesture kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Tap,
    ManipulationStarted,
    ManipulationUpdated,
    ManipulationCompleted,
    ManipulationCanceled,
    NavigationStarted,
    NavigationUpdated,
    NavigationCompleted,
    NavigationCanceled,
}

/// Gesture payload. Only the field that belongs to the gesture family exists,
/// so a manipulation event can never carry a navigation position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureInput {
    Tap {
        tap_count: u32,
    },
    Manipulation {
        phase: GesturePhase,
        /// Cumulative hand displacement since the gesture started.
        delta: Vec3,
    },
    Navigation {
        phase: GesturePhase,
        /// Normalized hand offset, each axis in [-1, 1].
        position: Vec3,
    },
}

impl GestureInput {
    pub fn kind(&self) -> InteractionKind {
        use GesturePhase::*;
        match self {
            Self::Tap { .. } => InteractionKind::Tap,
            Self::Manipulation { phase, .. } => match phase {
                Started => InteractionKind::ManipulationStarted,
                Updated => InteractionKind::ManipulationUpdated,
                Completed => InteractionKind::ManipulationCompleted,
                Canceled => InteractionKind::ManipulationCanceled,
            },
            Self::Navigation { phase, .. } => match phase {
                Started => InteractionKind::NavigationStarted,
                Updated => InteractionKind::NavigationUpdated,
                Completed => InteractionKind::NavigationCompleted,
                Canceled => InteractionKind::NavigationCanceled,
            },
        }
    }

    pub fn phase(&self) -> Option<GesturePhase> {
        match self {
            Self::Tap { .. } => None,
            Self::Manipulation { phase, .. } | Self::Navigation { phase, .. } => Some(*phase),
        }
    }

    /// Vocabulary a continuous gesture belongs to. Taps are recognized by both.
    pub fn vocabulary(&self) -> Option<GestureVocabulary> {
        match self {
            Self::Tap { .. } => None,
            Self::Manipulation { .. } => Some(GestureVocabulary::Manipulation),
            Self::Navigation { .. } => Some(GestureVocabulary::Navigation),
        }
    }
}

/// Raw callback from a native gesture recognizer, before it is tied to the
/// focused entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawGesture {
    pub source: SourceId,
    #[serde(default)]
    pub ray: Ray,
    pub input: GestureInput,
}

impl RawGesture {
    pub fn tap(source: SourceId, tap_count: u32) -> Self {
        Self {
            source,
            ray: Ray::default(),
            input: GestureInput::Tap { tap_count },
        }
    }

    pub fn manipulation(source: SourceId, phase: GesturePhase, delta: Vec3) -> Self {
        Self {
            source,
            ray: Ray::default(),
            input: GestureInput::Manipulation { phase, delta },
        }
    }

    pub fn navigation(source: SourceId, phase: GesturePhase, position: Vec3) -> Self {
        Self {
            source,
            ray: Ray::default(),
            input: GestureInput::Navigation { phase, position },
        }
    }

    pub fn with_ray(mut self, ray: Ray) -> Self {
        self.ray = ray;
        self
    }

    /// Same gesture moved to its Canceled phase, keeping the last delta or
    /// position. Taps are instantaneous and come back unchanged.
    pub fn into_canceled(self) -> Self {
        let input = match self.input {
            GestureInput::Manipulation { delta, .. } => GestureInput::Manipulation {
                phase: GesturePhase::Canceled,
                delta,
            },
            GestureInput::Navigation { position, .. } => GestureInput::Navigation {
                phase: GesturePhase::Canceled,
                position,
            },
            tap @ GestureInput::Tap { .. } => tap,
        };
        Self { input, ..self }
    }
}

/// Normalized gesture published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub input: GestureInput,
    /// Entity focused when the gesture occurred, if any.
    pub focused_entity: Option<EntityId>,
    pub source: SourceId,
    pub ray: Ray,
}

impl GestureEvent {
    pub fn kind(&self) -> InteractionKind {
        self.input.kind()
    }

    pub fn tap_count(&self) -> u32 {
        match self.input {
            GestureInput::Tap { tap_count } => tap_count,
            _ => 0,
        }
    }

    pub fn manipulation_delta(&self) -> Vec3 {
        match self.input {
            GestureInput::Manipulation { delta, .. } => delta,
            _ => Vec3::ZERO,
        }
    }

    pub fn navigation_position(&self) -> Vec3 {
        match self.input {
            GestureInput::Navigation { position, .. } => position,
            _ => Vec3::ZERO,
        }
    }

    pub fn targets(&self, entity: EntityId) -> bool {
        self.focused_entity == Some(entity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusChanged {
    pub previous: Option<EntityId>,
    pub current: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "vocabulary", rename_all = "snake_case")]
pub enum KeywordCommand {
    Reset,
    ModeSwitch(GestureVocabulary),
}

impl std::str::FromStr for KeywordCommand {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "rotate" | "navigation" => Ok(Self::ModeSwitch(GestureVocabulary::Navigation)),
            "scale" | "manipulation" => Ok(Self::ModeSwitch(GestureVocabulary::Manipulation)),
            other => Err(format!("unknown keyword action '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEvent {
    pub phrase: String,
    pub command: KeywordCommand,
}

impl KeywordEvent {
    pub fn is_reset(&self) -> bool {
        self.command == KeywordCommand::Reset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandPresenceChanged {
    pub hand_detected: bool,
}
