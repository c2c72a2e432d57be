//! Point-in-time view of a session for presentation layers.

use serde::Serialize;

use crate::preset::Preset;

use super::phase::Phase;

/// Every observable and derived value of the session at one instant.
///
/// Published by the engine after each command and each state-changing
/// tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub preset: Preset,
    pub phase: Phase,
    pub phase_label: &'static str,
    pub phase_time_remaining: f64,
    pub current_phase_duration: f64,
    pub circle_scale: f64,
    pub total_session_elapsed: u64,
    pub formatted_session_time: String,
    pub is_running: bool,
    pub cycles_completed: u64,
}

/// Formats whole seconds as `MM:SS`.
///
/// Minutes are not wrapped at 60, so an hour and a bit reads `61:01`.
#[must_use]
pub fn format_session_time(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_session_time(0), "00:00");
    }

    #[test]
    fn test_format_125() {
        assert_eq!(format_session_time(125), "02:05");
    }

    #[test]
    fn test_format_minutes_not_wrapped() {
        assert_eq!(format_session_time(3661), "61:01");
    }

    #[test]
    fn test_format_three_digit_minutes() {
        assert_eq!(format_session_time(6000), "100:00");
    }

    proptest! {
        #[test]
        fn formatted_time_parses_back(total in 0u64..1_000_000) {
            let text = format_session_time(total);
            let (m, s) = text.split_once(':').unwrap();
            prop_assert!(m.len() >= 2);
            prop_assert_eq!(s.len(), 2);
            let minutes: u64 = m.parse().unwrap();
            let seconds: u64 = s.parse().unwrap();
            prop_assert!(seconds < 60);
            prop_assert_eq!(minutes * 60 + seconds, total);
        }
    }
}
