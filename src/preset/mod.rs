//! Breathing presets
//!
//! A [`Preset`] is an immutable set of per-phase durations for one
//! breathing technique. The built-in catalog lives in [`catalog`]; custom
//! presets arrive through the YAML configuration file.

pub mod catalog;

use serde::{Deserialize, Serialize};

use crate::error::PresetError;

pub use catalog::{BUILTIN_PRESETS, DEFAULT_PRESET_ID, find_builtin, suggest_preset};

/// Named configuration of per-phase durations, in seconds.
///
/// Serialized with camelCase keys (`holdAfterInhale`); snake_case keys
/// are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Stable identifier used for lookup (e.g. `"box"`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Inhale duration; must be > 0
    pub inhale: f64,

    /// Hold after inhale; 0 removes the phase from the sequence
    #[serde(default, alias = "hold_after_inhale")]
    pub hold_after_inhale: f64,

    /// Exhale duration; must be > 0
    pub exhale: f64,

    /// Hold after exhale; 0 removes the phase from the sequence
    #[serde(default, alias = "hold_after_exhale")]
    pub hold_after_exhale: f64,

    /// Optional one-line description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Preset {
    /// Creates a preset without a description.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        inhale: f64,
        hold_after_inhale: f64,
        exhale: f64,
        hold_after_exhale: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            inhale,
            hold_after_inhale,
            exhale,
            hold_after_exhale,
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Length of one full cycle in seconds.
    #[must_use]
    pub fn cycle_seconds(&self) -> f64 {
        self.inhale + self.hold_after_inhale + self.exhale + self.hold_after_exhale
    }

    /// Breaths per minute at this preset's pace.
    #[must_use]
    pub fn breaths_per_minute(&self) -> f64 {
        let cycle = self.cycle_seconds();
        if cycle > 0.0 { 60.0 / cycle } else { 0.0 }
    }

    /// Returns every problem with this preset, keyed by field name.
    ///
    /// An empty list means the preset is usable by the engine.
    #[must_use]
    pub fn problems(&self) -> Vec<(&'static str, String)> {
        let mut problems = Vec::new();

        if self.id.trim().is_empty() {
            problems.push(("id", "id cannot be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            problems.push(("name", "name cannot be empty".to_string()));
        }

        for (field, value) in [("inhale", self.inhale), ("exhale", self.exhale)] {
            if !value.is_finite() || value <= 0.0 {
                problems.push((field, format!("{field} must be a positive number, got {value}")));
            }
        }

        for (field, value) in [
            ("holdAfterInhale", self.hold_after_inhale),
            ("holdAfterExhale", self.hold_after_exhale),
        ] {
            if !value.is_finite() || value < 0.0 {
                problems.push((field, format!("{field} must be zero or positive, got {value}")));
            }
        }

        problems
    }

    /// Validates the preset.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Invalid`] listing every problem found.
    pub fn validate(&self) -> Result<(), PresetError> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        Err(PresetError::Invalid {
            id: self.id.clone(),
            problems: problems.into_iter().map(|(_, msg)| msg).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_preset_has_no_problems() {
        let preset = Preset::new("box", "Box Breathing", 4.0, 4.0, 4.0, 4.0);
        assert!(preset.problems().is_empty());
        assert!(preset.validate().is_ok());
    }

    #[test]
    fn test_zero_inhale_rejected() {
        let preset = Preset::new("x", "X", 0.0, 0.0, 4.0, 0.0);
        let problems = preset.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0, "inhale");
    }

    #[test]
    fn test_negative_hold_rejected() {
        let preset = Preset::new("x", "X", 4.0, -1.0, 4.0, 0.0);
        let problems = preset.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0, "holdAfterInhale");
    }

    #[test]
    fn test_nan_exhale_rejected() {
        let preset = Preset::new("x", "X", 4.0, 0.0, f64::NAN, 0.0);
        assert!(preset.problems().iter().any(|(f, _)| *f == "exhale"));
    }

    #[test]
    fn test_all_problems_collected() {
        let preset = Preset::new("", " ", 0.0, -2.0, -1.0, f64::INFINITY);
        let err = preset.validate().unwrap_err();
        match err {
            PresetError::Invalid { problems, .. } => assert_eq!(problems.len(), 6),
            PresetError::NotFound { .. } => panic!("expected Invalid"),
        }
    }

    #[test]
    fn test_cycle_seconds_and_pace() {
        let preset = Preset::new("478", "4-7-8", 4.0, 7.0, 8.0, 0.0);
        assert!((preset.cycle_seconds() - 19.0).abs() < f64::EPSILON);
        let relaxing = Preset::new("relaxing", "Relaxing", 5.0, 0.0, 5.0, 0.0);
        assert!((relaxing.breaths_per_minute() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let yaml = "id: box\nname: Box\ninhale: 4\nholdAfterInhale: 4\nexhale: 4\nholdAfterExhale: 4\n";
        let preset: Preset = serde_yaml::from_str(yaml).unwrap();
        assert!((preset.hold_after_inhale - 4.0).abs() < f64::EPSILON);
        assert!((preset.hold_after_exhale - 4.0).abs() < f64::EPSILON);
        assert!(preset.description.is_none());
    }

    #[test]
    fn test_deserialize_snake_case_alias_and_default_holds() {
        let yaml = "id: a\nname: A\ninhale: 3\nhold_after_inhale: 2\nexhale: 5\n";
        let preset: Preset = serde_yaml::from_str(yaml).unwrap();
        assert!((preset.hold_after_inhale - 2.0).abs() < f64::EPSILON);
        assert!(preset.hold_after_exhale.abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialize_omits_missing_description() {
        let preset = Preset::new("a", "A", 1.0, 0.0, 1.0, 0.0);
        let json = serde_json::to_value(&preset).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("holdAfterInhale").is_some());
    }
}
