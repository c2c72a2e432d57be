//! Built-in preset catalog
//!
//! Static registry of the breathing techniques that ship with the binary,
//! with lookup and typo suggestion over a combined list of built-in and
//! custom presets.

use std::sync::LazyLock;

use super::Preset;

/// Id of the preset used when none is requested.
pub const DEFAULT_PRESET_ID: &str = "box";

/// All built-in presets, in display order.
pub static BUILTIN_PRESETS: LazyLock<Vec<Preset>> = LazyLock::new(|| {
    vec![
        Preset::new("box", "Box Breathing", 4.0, 4.0, 4.0, 4.0)
            .with_description("Equal breathing for balance and focus"),
        Preset::new("478", "4-7-8 Breathing", 4.0, 7.0, 8.0, 0.0)
            .with_description("Calming technique for relaxation"),
        Preset::new("relaxing", "Relaxing", 5.0, 0.0, 5.0, 0.0)
            .with_description("Simple and soothing"),
        Preset::new("focus", "Focus", 4.0, 0.0, 6.0, 0.0)
            .with_description("Longer exhale for concentration"),
    ]
});

/// Looks up a built-in preset by exact id.
#[must_use]
pub fn find_builtin(id: &str) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.id == id)
}

/// Suggests the closest preset id for typo correction.
///
/// Returns the nearest candidate if its Damerau-Levenshtein distance is ≤ 3.
#[must_use]
pub fn suggest_preset<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a Preset>,
) -> Option<String> {
    candidates
        .into_iter()
        .map(|p| (p.id.as_str(), strsim::damerau_levenshtein(input, &p.id)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(id, _)| id.to_string())
}
