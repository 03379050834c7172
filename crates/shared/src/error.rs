use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bus channel a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Gesture,
    Keyword,
    FocusChanged,
    HandPresence,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gesture => "gesture",
            Self::Keyword => "keyword",
            Self::FocusChanged => "focus_changed",
            Self::HandPresence => "hand_presence",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The id was never issued by this channel or has already been removed.
    #[error("unknown subscription {id} on {channel} channel")]
    UnknownSubscription { channel: ChannelKind, id: u64 },
}
