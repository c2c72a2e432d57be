//! Breathing phases and the circular phase sequence derived from a preset.

use serde::{Deserialize, Serialize};

use crate::preset::Preset;

/// One stage of the breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Breathing in; indicator grows.
    Inhale,
    /// Holding with full lungs; indicator stays large.
    HoldAfterInhale,
    /// Breathing out; indicator shrinks.
    Exhale,
    /// Holding with empty lungs; indicator stays small.
    HoldAfterExhale,
}

impl Phase {
    /// Human-readable label shown to the user.
    ///
    /// Both hold phases read `"Hold"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inhale => "Inhale",
            Self::HoldAfterInhale | Self::HoldAfterExhale => "Hold",
            Self::Exhale => "Exhale",
        }
    }

    /// Duration of this phase in `preset`, in seconds.
    #[must_use]
    pub const fn duration_in(self, preset: &Preset) -> f64 {
        match self {
            Self::Inhale => preset.inhale,
            Self::HoldAfterInhale => preset.hold_after_inhale,
            Self::Exhale => preset.exhale,
            Self::HoldAfterExhale => preset.hold_after_exhale,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Inhale => "inhale",
            Self::HoldAfterInhale => "hold-inhale",
            Self::Exhale => "exhale",
            Self::HoldAfterExhale => "hold-exhale",
        };
        f.write_str(name)
    }
}

/// A phase paired with its duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseStep {
    /// Which phase
    pub phase: Phase,
    /// How long it lasts
    pub duration: f64,
}

/// Ordered, circular list of phases for one preset.
///
/// Inhale and Exhale are always present; each hold is present only when
/// its duration is greater than zero, so the length is 2, 3 or 4.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSequence {
    steps: Vec<PhaseStep>,
}

impl PhaseSequence {
    /// Derives the sequence for `preset`.
    #[must_use]
    pub fn from_preset(preset: &Preset) -> Self {
        let mut steps = Vec::with_capacity(4);
        steps.push(PhaseStep {
            phase: Phase::Inhale,
            duration: preset.inhale,
        });
        if preset.hold_after_inhale > 0.0 {
            steps.push(PhaseStep {
                phase: Phase::HoldAfterInhale,
                duration: preset.hold_after_inhale,
            });
        }
        steps.push(PhaseStep {
            phase: Phase::Exhale,
            duration: preset.exhale,
        });
        if preset.hold_after_exhale > 0.0 {
            steps.push(PhaseStep {
                phase: Phase::HoldAfterExhale,
                duration: preset.hold_after_exhale,
            });
        }
        Self { steps }
    }

    /// Number of phases in one cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for sequences built from a preset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PhaseStep> {
        self.steps.get(index)
    }

    /// Position of `phase` in the sequence.
    #[must_use]
    pub fn index_of(&self, phase: Phase) -> Option<usize> {
        self.steps.iter().position(|s| s.phase == phase)
    }

    /// Duration of `phase`, or 0 when the phase is not part of the sequence.
    #[must_use]
    pub fn duration_of(&self, phase: Phase) -> f64 {
        self.index_of(phase)
            .and_then(|i| self.steps.get(i))
            .map_or(0.0, |s| s.duration)
    }

    /// Step that follows `phase`, wrapping to the start.
    ///
    /// A phase missing from the sequence is treated as sitting before the
    /// first step. Returns the next index with the step, or `None` for an
    /// empty sequence.
    #[must_use]
    pub fn next_after(&self, phase: Phase) -> Option<(usize, PhaseStep)> {
        if self.steps.is_empty() {
            return None;
        }
        let next = self.index_of(phase).map_or(0, |i| (i + 1) % self.steps.len());
        self.steps.get(next).map(|s| (next, *s))
    }

    /// Iterates the steps in order.
    pub fn iter(&self) -> impl Iterator<Item = &PhaseStep> {
        self.steps.iter()
    }
}
