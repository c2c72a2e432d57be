//! Preset listing.

use serde::Serialize;

use crate::cli::args::{OutputFormat, PresetsArgs};
use crate::cli::commands::load_config;
use crate::config::CycleConfig;
use crate::error::BreathError;
use crate::preset::{Preset, find_builtin};

/// One row of the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetEntry<'a> {
    #[serde(flatten)]
    preset: &'a Preset,
    builtin: bool,
    cycle_seconds: f64,
    breaths_per_minute: f64,
}

/// Lists built-in presets followed by custom ones from `--config`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the JSON
/// cannot be serialized.
pub fn run(args: &PresetsArgs) -> Result<(), BreathError> {
    let config = load_config(args.config.as_deref())?;
    println!("{}", render(&config, args.format)?);
    Ok(())
}

/// Renders the preset listing.
///
/// # Errors
///
/// Returns [`BreathError::Json`] if serialization fails.
pub fn render(config: &CycleConfig, format: OutputFormat) -> Result<String, BreathError> {
    let presets = config.all_presets();
    let entries: Vec<PresetEntry<'_>> = presets
        .iter()
        .map(|preset| PresetEntry {
            preset,
            builtin: find_builtin(&preset.id).is_some_and(|b| b == preset),
            cycle_seconds: preset.cycle_seconds(),
            breaths_per_minute: preset.breaths_per_minute(),
        })
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&entries)?),
        OutputFormat::Human => Ok(entries
            .iter()
            .map(human_row)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn human_row(entry: &PresetEntry<'_>) -> String {
    let p = entry.preset;
    let pattern = format!(
        "{}-{}-{}-{}",
        p.inhale, p.hold_after_inhale, p.exhale, p.hold_after_exhale
    );
    let mut row = format!(
        "{:<10} {:<20} {:<12} {:>4.1} bpm",
        p.id, p.name, pattern, entry.breaths_per_minute
    );
    if !entry.builtin {
        row.push_str("  (custom)");
    }
    if let Some(description) = &p.description {
        row.push_str("  ");
        row.push_str(description);
    }
    row
}
