//! Configuration schema types
//!
//! These types are deserialized from YAML configuration files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cycle::EngineSettings;
use crate::error::PresetError;
use crate::preset::{BUILTIN_PRESETS, DEFAULT_PRESET_ID, Preset, suggest_preset};

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration for `breathcycle`.
///
/// Every section is optional; an absent file behaves like
/// `CycleConfig::default()` (built-in presets, default timing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleConfig {
    /// Preset used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_preset: Option<String>,

    /// Ticker timing overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingConfig>,

    /// Custom presets, added to the built-in catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<Preset>,
}

/// Ticker timing overrides. Unset fields keep the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Phase ticker period in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_tick_ms: Option<u64>,

    /// Session ticker period in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_tick_ms: Option<u64>,

    /// Seconds remaining at which a phase counts as complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_epsilon: Option<f64>,
}

impl TimingConfig {
    /// Applies these overrides on top of the engine defaults.
    #[must_use]
    pub fn to_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        EngineSettings {
            phase_tick: self
                .phase_tick_ms
                .map_or(defaults.phase_tick, Duration::from_millis),
            session_tick: self
                .session_tick_ms
                .map_or(defaults.session_tick, Duration::from_millis),
            completion_epsilon: self
                .completion_epsilon
                .unwrap_or(defaults.completion_epsilon),
        }
    }
}

impl CycleConfig {
    /// Built-in presets followed by custom ones.
    ///
    /// A custom preset whose id matches a built-in replaces it in place.
    #[must_use]
    pub fn all_presets(&self) -> Vec<Preset> {
        let mut all: Vec<Preset> = BUILTIN_PRESETS.to_vec();
        for custom in &self.presets {
            if let Some(slot) = all.iter_mut().find(|p| p.id == custom.id) {
                *slot = custom.clone();
            } else {
                all.push(custom.clone());
            }
        }
        all
    }

    /// Looks up a preset by id among built-in and custom presets.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] with a suggestion when a close id
    /// exists.
    pub fn find_preset(&self, id: &str) -> Result<Preset, PresetError> {
        let all = self.all_presets();
        if let Some(preset) = all.iter().find(|p| p.id == id) {
            return Ok(preset.clone());
        }
        Err(PresetError::NotFound {
            id: id.to_string(),
            suggestion: suggest_preset(id, all.iter()),
        })
    }

    /// Resolves the preset to run: `requested`, else `default_preset`,
    /// else the built-in default.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] if the chosen id is unknown.
    pub fn resolve_preset(&self, requested: Option<&str>) -> Result<Preset, PresetError> {
        let id = requested
            .or(self.default_preset.as_deref())
            .unwrap_or(DEFAULT_PRESET_ID);
        self.find_preset(id)
    }

    /// Engine ticker settings from the `timing` section.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        self.timing
            .as_ref()
            .map_or_else(EngineSettings::default, TimingConfig::to_settings)
    }
}
