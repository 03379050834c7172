use std::{collections::BTreeMap, fs, io, path::Path};

use anyhow::{bail, Context};
use behaviors::{PlacementConfig, RotationConfig, ScalingConfig};
use serde::Deserialize;
use shared::{domain::GestureVocabulary, protocol::KeywordCommand};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "mr-sim.toml";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub default_vocabulary: GestureVocabulary,
    pub rotation: RotationConfig,
    pub scaling: ScalingConfig,
    pub placement: PlacementConfig,
    /// Phrases bound on top of the built-in `Reset`, `Rotate` and `Scale`.
    pub keywords: Vec<(String, KeywordCommand)>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    default_vocabulary: Option<String>,
    rotation_sensitivity: Option<f32>,
    scale_sensitivity: Option<f32>,
    preserve_aspect: Option<bool>,
    placement_max_distance: Option<f32>,
    keywords: BTreeMap<String, String>,
}

/// Defaults, then the TOML file, then `APP__*` environment overrides.
///
/// An explicit `path` must exist; the default `mr-sim.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(error) if error.kind() == io::ErrorKind::NotFound && !required => {}
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file.default_vocabulary {
        settings.default_vocabulary = v.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(v) = file.rotation_sensitivity {
        settings.rotation.sensitivity = v;
    }
    if let Some(v) = file.scale_sensitivity {
        settings.scaling.sensitivity = v;
    }
    if let Some(v) = file.preserve_aspect {
        settings.scaling.preserve_aspect_ratio = v;
    }
    if let Some(v) = file.placement_max_distance {
        if v <= 0.0 {
            bail!("placement_max_distance must be positive, got {v}");
        }
        settings.placement.max_distance = v;
    }
    for (phrase, action) in file.keywords {
        let command = action
            .parse::<KeywordCommand>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("keyword '{phrase}'"))?;
        settings.keywords.push((phrase, command));
    }
    Ok(())
}

/// Unparseable values are logged and skipped.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = parsed::<f32>(&lookup, "APP__ROTATION_SENSITIVITY") {
        settings.rotation.sensitivity = v;
    }
    if let Some(v) = parsed::<f32>(&lookup, "APP__SCALE_SENSITIVITY") {
        settings.scaling.sensitivity = v;
    }
    if let Some(v) = parsed::<bool>(&lookup, "APP__PRESERVE_ASPECT") {
        settings.scaling.preserve_aspect_ratio = v;
    }
    if let Some(v) = parsed::<f32>(&lookup, "APP__PLACEMENT_MAX_DISTANCE") {
        if v > 0.0 {
            settings.placement.max_distance = v;
        }
    }
    if let Some(v) = parsed::<GestureVocabulary>(&lookup, "APP__DEFAULT_VOCABULARY") {
        settings.default_vocabulary = v;
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
