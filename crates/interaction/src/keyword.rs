//! Spoken keyword vocabulary.

use std::collections::BTreeMap;

use shared::{
    domain::GestureVocabulary,
    protocol::{KeywordCommand, KeywordEvent},
};
use tracing::debug;

use crate::bus::EventBus;

pub const RESET_PHRASE: &str = "Reset";
pub const ROTATE_PHRASE: &str = "Rotate";
pub const SCALE_PHRASE: &str = "Scale";

/// Fixed phrase-to-command table, built once per session.
pub struct KeywordDispatcher {
    bus: EventBus,
    bindings: BTreeMap<String, KeywordCommand>,
}

impl KeywordDispatcher {
    /// Dispatcher with the built-in `Reset`, `Rotate` and `Scale` phrases.
    pub fn new(bus: EventBus) -> Self {
        let bindings = BTreeMap::from([
            (RESET_PHRASE.to_string(), KeywordCommand::Reset),
            (
                ROTATE_PHRASE.to_string(),
                KeywordCommand::ModeSwitch(GestureVocabulary::Navigation),
            ),
            (
                SCALE_PHRASE.to_string(),
                KeywordCommand::ModeSwitch(GestureVocabulary::Manipulation),
            ),
        ]);
        Self { bus, bindings }
    }

    /// Adds further phrases. A phrase that is already bound is rebound.
    pub fn with_bindings<I, S>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (S, KeywordCommand)>,
        S: Into<String>,
    {
        for (phrase, command) in bindings {
            self.bindings.insert(phrase.into(), command);
        }
        self
    }

    /// Vocabulary handed to the speech recognizer.
    pub fn phrases(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    pub fn command_for(&self, phrase: &str) -> Option<KeywordCommand> {
        self.bindings.get(phrase).copied()
    }

    /// Exact, case-sensitive lookup. Reset commands are broadcast on the
    /// keyword channel; mode switches are returned for the gesture controller
    /// and are not broadcast. Unknown phrases are speech false positives and
    /// are dropped.
    pub fn on_phrase_recognized(&self, phrase: &str) -> Option<KeywordCommand> {
        let Some(command) = self.command_for(phrase) else {
            debug!(phrase, "ignoring phrase outside the keyword vocabulary");
            return None;
        };

        debug!(phrase, command = ?command, "keyword recognized");
        if command == KeywordCommand::Reset {
            self.bus.keywords().publish(&KeywordEvent {
                phrase: phrase.to_string(),
                command,
            });
        }
        Some(command)
    }
}

#[cfg(test)]
#[path = "tests/keyword_tests.rs"]
mod tests;
