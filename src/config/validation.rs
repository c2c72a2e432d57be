//! Configuration validation
//!
//! Semantic checks on a deserialized [`CycleConfig`]. Validation collects
//! every issue rather than stopping at the first, so users see the whole
//! picture in one pass.

use std::collections::HashSet;

use crate::config::loader::ConfigLimits;
use crate::config::schema::{CycleConfig, TimingConfig};
use crate::error::{Severity, ValidationIssue};
use crate::preset::{BUILTIN_PRESETS, find_builtin};

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &CycleConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_presets(config);
        self.validate_default_preset(config);
        if let Some(timing) = &config.timing {
            self.validate_timing(timing);
        }
        self.validate_limits(config, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Presets
    // ========================================================================

    fn validate_presets(&mut self, config: &CycleConfig) {
        let mut seen = HashSet::new();

        for (i, preset) in config.presets.iter().enumerate() {
            for (field, message) in preset.problems() {
                self.add_error(&format!("presets[{i}].{field}"), &message);
            }

            if !seen.insert(preset.id.as_str()) {
                self.add_error(
                    &format!("presets[{i}].id"),
                    &format!("duplicate preset id '{}'", preset.id),
                );
            } else if find_builtin(&preset.id).is_some() {
                self.add_warning(
                    &format!("presets[{i}].id"),
                    &format!("custom preset '{}' replaces the built-in preset", preset.id),
                );
            }
        }
    }

    fn validate_default_preset(&mut self, config: &CycleConfig) {
        let Some(id) = &config.default_preset else {
            return;
        };

        let known = BUILTIN_PRESETS.iter().any(|p| &p.id == id)
            || config.presets.iter().any(|p| &p.id == id);
        if !known {
            self.add_error("default_preset", &format!("unknown preset '{id}'"));
        }
    }

    // ========================================================================
    // Timing
    // ========================================================================

    fn validate_timing(&mut self, timing: &TimingConfig) {
        if timing.phase_tick_ms == Some(0) {
            self.add_error("timing.phase_tick_ms", "phase tick must be at least 1 ms");
        }
        if timing.session_tick_ms == Some(0) {
            self.add_error("timing.session_tick_ms", "session tick must be at least 1 ms");
        }

        let settings = timing.to_settings();
        if settings.session_tick < settings.phase_tick {
            self.add_warning(
                "timing.session_tick_ms",
                "session tick is shorter than the phase tick",
            );
        }
        if settings.phase_tick.as_millis() > 1000 {
            self.add_warning(
                "timing.phase_tick_ms",
                "phase tick above one second makes the countdown visibly jumpy",
            );
        }

        if let Some(epsilon) = timing.completion_epsilon {
            if !epsilon.is_finite() || !(0.0..1.0).contains(&epsilon) {
                self.add_error(
                    "timing.completion_epsilon",
                    &format!("completion epsilon must be in [0, 1), got {epsilon}"),
                );
            }
        }
    }

    // ========================================================================
    // Limits
    // ========================================================================

    fn validate_limits(&mut self, config: &CycleConfig, limits: &ConfigLimits) {
        if config.presets.len() > limits.max_presets {
            self.add_error(
                "presets",
                &format!(
                    "too many presets: {} (limit: {})",
                    config.presets.len(),
                    limits.max_presets
                ),
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::Preset;

    fn validate(config: &CycleConfig) -> ValidationResult {
        Validator::new().validate(config, &ConfigLimits::default())
    }

    fn custom(id: &str) -> Preset {
        Preset::new(id, "Custom", 4.0, 0.0, 6.0, 0.0)
    }

    #[test]
    fn test_empty_config_is_valid() {
        let result = validate(&CycleConfig::default());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_preset_durations_reported_per_field() {
        let config = CycleConfig {
            presets: vec![Preset::new("bad", "Bad", 0.0, -1.0, 4.0, 0.0)],
            ..CycleConfig::default()
        };
        let result = validate(&config);
        assert!(result.has_errors());
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["presets[0].inhale", "presets[0].holdAfterInhale"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let config = CycleConfig {
            presets: vec![custom("calm"), custom("calm")],
            ..CycleConfig::default()
        };
        let result = validate(&config);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "presets[1].id");
    }

    #[test]
    fn test_builtin_override_warns() {
        let config = CycleConfig {
            presets: vec![custom("focus")],
            ..CycleConfig::default()
        };
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_unknown_default_preset() {
        let config = CycleConfig {
            default_preset: Some("nope".to_string()),
            ..CycleConfig::default()
        };
        let result = validate(&config);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "default_preset");
    }

    #[test]
    fn test_default_preset_may_be_custom() {
        let config = CycleConfig {
            default_preset: Some("calm".to_string()),
            presets: vec![custom("calm")],
            ..CycleConfig::default()
        };
        assert!(validate(&config).is_valid());
    }

    #[test]
    fn test_zero_ticks_rejected() {
        let config = CycleConfig {
            timing: Some(TimingConfig {
                phase_tick_ms: Some(0),
                session_tick_ms: Some(0),
                completion_epsilon: None,
            }),
            ..CycleConfig::default()
        };
        let result = validate(&config);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_session_shorter_than_phase_warns() {
        let config = CycleConfig {
            timing: Some(TimingConfig {
                phase_tick_ms: Some(200),
                session_tick_ms: Some(100),
                completion_epsilon: None,
            }),
            ..CycleConfig::default()
        };
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "timing.session_tick_ms");
    }

    #[test]
    fn test_epsilon_out_of_range() {
        for epsilon in [-0.1, 1.0, f64::NAN] {
            let config = CycleConfig {
                timing: Some(TimingConfig {
                    completion_epsilon: Some(epsilon),
                    ..TimingConfig::default()
                }),
                ..CycleConfig::default()
            };
            assert!(validate(&config).has_errors(), "epsilon {epsilon} accepted");
        }
    }

    #[test]
    fn test_preset_limit() {
        let limits = ConfigLimits {
            max_presets: 1,
            ..ConfigLimits::default()
        };
        let config = CycleConfig {
            presets: vec![custom("a"), custom("b")],
            ..CycleConfig::default()
        };
        let result = Validator::new().validate(&config, &limits);
        assert!(result.errors.iter().any(|e| e.path == "presets"));
    }
}
