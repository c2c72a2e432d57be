//! Session state and drift-free timing reconciliation
//!
//! [`SessionState`] holds everything that changes during a session. Time is
//! never accumulated tick by tick: each running value is recomputed from an
//! [`Anchor`] (baseline value + the instant it was captured), so timer
//! jitter cannot compound across ticks or phases.
//!
//! All methods take `now` explicitly; the engine passes
//! `tokio::time::Instant::now()`.

use tokio::time::Instant;

use crate::preset::Preset;

use super::phase::{Phase, PhaseSequence};
use super::snapshot::{SessionSnapshot, format_session_time};

/// A baseline value paired with the instant it was captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor<T> {
    /// Value at `at`
    pub baseline: T,
    /// When the baseline was captured
    pub at: Instant,
}

impl<T> Anchor<T> {
    /// Captures `baseline` at `at`.
    pub const fn new(baseline: T, at: Instant) -> Self {
        Self { baseline, at }
    }

    /// Seconds elapsed between the anchor and `now`, saturating at zero.
    #[must_use]
    pub fn seconds_since(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.at).as_secs_f64()
    }

    /// Whole seconds elapsed between the anchor and `now` (floored).
    #[must_use]
    pub fn whole_seconds_since(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.at).as_secs()
    }
}

/// Record of one phase transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseChange {
    /// Phase that just completed
    pub from: Phase,
    /// Phase that was entered
    pub to: Phase,
    /// Full duration of the entered phase
    pub duration: f64,
    /// Whether the transition wrapped back to the first phase
    pub cycle_completed: bool,
}

/// Outcome of one phase tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseTick {
    /// Session not running; nothing changed
    Idle,
    /// Remaining time recomputed within the current phase
    Counted,
    /// Current phase completed and the next one was entered
    Advanced(PhaseChange),
}

/// Mutable state of the single active breathing session.
#[derive(Debug, Clone)]
pub struct SessionState {
    preset: Preset,
    sequence: PhaseSequence,
    phase: Phase,
    phase_time_remaining: f64,
    total_session_elapsed: u64,
    running: bool,
    cycles_completed: u64,
    phase_anchor: Option<Anchor<f64>>,
    session_anchor: Option<Anchor<u64>>,
}

impl SessionState {
    /// Creates a stopped session for `preset`.
    ///
    /// Remaining time starts at zero so the first start initialises Inhale.
    #[must_use]
    pub fn new(preset: Preset) -> Self {
        let sequence = PhaseSequence::from_preset(&preset);
        Self {
            preset,
            sequence,
            phase: Phase::Inhale,
            phase_time_remaining: 0.0,
            total_session_elapsed: 0,
            running: false,
            cycles_completed: 0,
            phase_anchor: None,
            session_anchor: None,
        }
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    /// The preset currently driving the session.
    #[must_use]
    pub const fn active_preset(&self) -> &Preset {
        &self.preset
    }

    /// The phase sequence derived from the active preset.
    #[must_use]
    pub const fn phase_sequence(&self) -> &PhaseSequence {
        &self.sequence
    }

    #[must_use]
    pub const fn current_phase(&self) -> Phase {
        self.phase
    }

    /// Seconds left in the current phase.
    #[must_use]
    pub const fn phase_time_remaining(&self) -> f64 {
        self.phase_time_remaining
    }

    /// Whole seconds the session has been running.
    #[must_use]
    pub const fn total_session_elapsed(&self) -> u64 {
        self.total_session_elapsed
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Full passes through the phase sequence since the last reset.
    #[must_use]
    pub const fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    #[must_use]
    pub const fn phase_anchor(&self) -> Option<Anchor<f64>> {
        self.phase_anchor
    }

    #[must_use]
    pub const fn session_anchor(&self) -> Option<Anchor<u64>> {
        self.session_anchor
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    /// Position of the current phase in the sequence.
    #[must_use]
    pub fn current_phase_index(&self) -> Option<usize> {
        self.sequence.index_of(self.phase)
    }

    /// Full duration of the current phase, or 0 if it is not in the sequence.
    #[must_use]
    pub fn current_phase_duration(&self) -> f64 {
        self.sequence.duration_of(self.phase)
    }

    #[must_use]
    pub const fn phase_label(&self) -> &'static str {
        self.phase.label()
    }

    /// Indicator scale in `[1.0, 2.0]`.
    ///
    /// Grows linearly over Inhale, shrinks linearly over Exhale, and is
    /// pinned at 2.0 / 1.0 during the hold after inhale / exhale.
    #[must_use]
    pub fn circle_scale(&self) -> f64 {
        let duration = self.current_phase_duration();
        if duration <= 0.0 {
            return 1.0;
        }

        let progress = (1.0 - self.phase_time_remaining / duration).clamp(0.0, 1.0);
        match self.phase {
            Phase::Inhale => 1.0 + progress,
            Phase::Exhale => 2.0 - progress,
            Phase::HoldAfterInhale => 2.0,
            Phase::HoldAfterExhale => 1.0,
        }
    }

    /// Elapsed session time as `MM:SS`.
    #[must_use]
    pub fn formatted_session_time(&self) -> String {
        format_session_time(self.total_session_elapsed)
    }

    /// Captures all observable and derived values.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            preset: self.preset.clone(),
            phase: self.phase,
            phase_label: self.phase_label(),
            phase_time_remaining: self.phase_time_remaining,
            current_phase_duration: self.current_phase_duration(),
            circle_scale: self.circle_scale(),
            total_session_elapsed: self.total_session_elapsed,
            formatted_session_time: self.formatted_session_time(),
            is_running: self.running,
            cycles_completed: self.cycles_completed,
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Marks the session running and anchors both clocks at `now`.
    ///
    /// A session with no time left in its phase (fresh or just reset)
    /// starts over at Inhale. Returns `false` if it was already running.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.running {
            return false;
        }
        self.running = true;

        if self.phase_time_remaining <= 0.0 {
            self.phase = Phase::Inhale;
            self.phase_time_remaining = self.preset.inhale;
        }

        self.phase_anchor = Some(Anchor::new(self.phase_time_remaining, now));
        self.session_anchor = Some(Anchor::new(self.total_session_elapsed, now));
        true
    }

    /// Stops the session, leaving remaining and elapsed time as last
    /// computed. Returns whether it was running.
    pub const fn halt(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    /// Stops the session and rewinds it to the start of Inhale.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Inhale;
        self.phase_time_remaining = self.preset.inhale;
        self.total_session_elapsed = 0;
        self.cycles_completed = 0;
        self.phase_anchor = None;
        self.session_anchor = None;
    }

    /// Swaps in `preset` and positions the session at the start of Inhale.
    ///
    /// Callers reset first; this does not touch the running flag.
    pub fn replace_preset(&mut self, preset: Preset) {
        self.sequence = PhaseSequence::from_preset(&preset);
        self.phase = Phase::Inhale;
        self.phase_time_remaining = preset.inhale;
        self.preset = preset;
    }

    /// Moves to the next phase in the sequence and anchors it at `now`.
    ///
    /// Returns `None` (and changes nothing) if the sequence is empty.
    pub fn advance_phase(&mut self, now: Instant) -> Option<PhaseChange> {
        let (next_index, step) = self.sequence.next_after(self.phase)?;
        let from = self.phase;

        self.phase = step.phase;
        self.phase_time_remaining = step.duration;
        self.phase_anchor = Some(Anchor::new(step.duration, now));

        let cycle_completed = next_index == 0;
        if cycle_completed {
            self.cycles_completed = self.cycles_completed.saturating_add(1);
        }

        Some(PhaseChange {
            from,
            to: step.phase,
            duration: step.duration,
            cycle_completed,
        })
    }

    // ------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------

    /// Recomputes remaining phase time from the phase anchor.
    ///
    /// When the remainder drops to `epsilon` or below, exactly one
    /// transition happens, however far `now` overshoots.
    pub fn on_phase_tick(&mut self, now: Instant, epsilon: f64) -> PhaseTick {
        if !self.running {
            return PhaseTick::Idle;
        }

        let anchor = *self
            .phase_anchor
            .get_or_insert_with(|| Anchor::new(self.phase_time_remaining, now));
        self.phase_time_remaining = (anchor.baseline - anchor.seconds_since(now)).max(0.0);

        if self.phase_time_remaining <= epsilon {
            if let Some(change) = self.advance_phase(now) {
                return PhaseTick::Advanced(change);
            }
        }
        PhaseTick::Counted
    }

    /// Recomputes whole elapsed session seconds from the session anchor.
    ///
    /// Returns whether the value changed.
    pub fn on_session_tick(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }

        let anchor = *self
            .session_anchor
            .get_or_insert_with(|| Anchor::new(self.total_session_elapsed, now));
        let elapsed = anchor
            .baseline
            .saturating_add(anchor.whole_seconds_since(now));
        let changed = elapsed != self.total_session_elapsed;
        self.total_session_elapsed = elapsed;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    const EPSILON: f64 = 0.05;

    fn box_preset() -> Preset {
        Preset::new("box", "Box Breathing", 4.0, 4.0, 4.0, 4.0)
    }

    fn four_seven_eight() -> Preset {
        Preset::new("478", "4-7-8 Breathing", 4.0, 7.0, 8.0, 0.0)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_new_state_is_stopped_and_empty() {
        let state = SessionState::new(box_preset());
        assert!(!state.is_running());
        assert_eq!(state.current_phase(), Phase::Inhale);
        assert!(approx(state.phase_time_remaining(), 0.0));
        assert_eq!(state.total_session_elapsed(), 0);
        assert!(state.phase_anchor().is_none());
    }

    #[test]
    fn test_begin_initialises_inhale_and_anchors() {
        let now = Instant::now();
        let mut state = SessionState::new(box_preset());
        assert!(state.begin(now));
        assert!(state.is_running());
        assert!(approx(state.phase_time_remaining(), 4.0));
        assert_eq!(state.phase_anchor(), Some(Anchor::new(4.0, now)));
        assert_eq!(state.session_anchor(), Some(Anchor::new(0, now)));
    }

    #[test]
    fn test_begin_while_running_keeps_anchor() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        state.on_phase_tick(t0 + secs(1.0), EPSILON);
        assert!(!state.begin(t0 + secs(1.0)));
        assert_eq!(state.phase_anchor(), Some(Anchor::new(4.0, t0)));
        assert!(approx(state.phase_time_remaining(), 3.0));
    }

    #[test]
    fn test_phase_tick_counts_down_from_anchor() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);

        assert_eq!(state.on_phase_tick(t0 + secs(1.25), EPSILON), PhaseTick::Counted);
        assert!(approx(state.phase_time_remaining(), 2.75));
        assert_eq!(state.on_phase_tick(t0 + secs(3.0), EPSILON), PhaseTick::Counted);
        assert!(approx(state.phase_time_remaining(), 1.0));
    }

    #[test]
    fn test_phase_tick_within_epsilon_advances() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);

        let tick = state.on_phase_tick(t0 + secs(3.96), EPSILON);
        assert_eq!(
            tick,
            PhaseTick::Advanced(PhaseChange {
                from: Phase::Inhale,
                to: Phase::HoldAfterInhale,
                duration: 4.0,
                cycle_completed: false,
            })
        );
        assert!(approx(state.phase_time_remaining(), 4.0));
        assert_eq!(
            state.phase_anchor(),
            Some(Anchor::new(4.0, t0 + secs(3.96)))
        );
    }

    #[test]
    fn test_idle_tick_when_stopped() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        assert_eq!(state.on_phase_tick(t0 + secs(10.0), EPSILON), PhaseTick::Idle);
        assert!(!state.on_session_tick(t0 + secs(10.0)));
        assert!(approx(state.phase_time_remaining(), 0.0));
    }

    #[test]
    fn test_long_stall_advances_only_one_phase() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);

        // Three phases' worth of time passes before the next tick.
        let tick = state.on_phase_tick(t0 + secs(12.0), EPSILON);
        assert!(matches!(tick, PhaseTick::Advanced(c) if c.to == Phase::HoldAfterInhale));
        assert!(approx(state.phase_time_remaining(), 4.0));
    }

    #[test]
    fn test_anchor_rebinding_prevents_drift() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);

        // Late tick: Inhale ends 0.2s late.
        state.on_phase_tick(t0 + secs(4.2), EPSILON);
        assert_eq!(state.current_phase(), Phase::HoldAfterInhale);

        // The hold measures from its own anchor, not from t0.
        state.on_phase_tick(t0 + secs(6.2), EPSILON);
        assert!(approx(state.phase_time_remaining(), 2.0));
    }

    #[test]
    fn test_box_cycle_returns_to_inhale_after_four_advances() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);

        let mut changes = Vec::new();
        for _ in 0..4 {
            changes.push(state.advance_phase(t0).unwrap());
        }
        assert_eq!(state.current_phase(), Phase::Inhale);
        assert_eq!(state.cycles_completed(), 1);
        assert!(changes[3].cycle_completed);
        assert!(!changes[..3].iter().any(|c| c.cycle_completed));
    }

    #[test]
    fn test_478_sequence_skips_hold_after_exhale() {
        let t0 = Instant::now();
        let mut state = SessionState::new(four_seven_eight());
        state.begin(t0);

        state.on_phase_tick(t0 + secs(4.0), EPSILON);
        assert_eq!(state.current_phase(), Phase::HoldAfterInhale);
        assert!(approx(state.phase_time_remaining(), 7.0));

        state.on_phase_tick(t0 + secs(11.0), EPSILON);
        assert_eq!(state.current_phase(), Phase::Exhale);
        assert!(approx(state.phase_time_remaining(), 8.0));

        state.on_phase_tick(t0 + secs(19.0), EPSILON);
        assert_eq!(state.current_phase(), Phase::Inhale);
        assert_eq!(state.cycles_completed(), 1);
    }

    #[test]
    fn test_session_tick_floors_elapsed() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);

        assert!(!state.on_session_tick(t0 + secs(0.9)));
        assert_eq!(state.total_session_elapsed(), 0);
        assert!(state.on_session_tick(t0 + secs(2.7)));
        assert_eq!(state.total_session_elapsed(), 2);
    }

    #[test]
    fn test_halt_then_begin_resumes_from_frozen_values() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        state.on_phase_tick(t0 + secs(2.5), EPSILON);
        state.on_session_tick(t0 + secs(2.5));
        assert!(state.halt());
        assert!(!state.halt());

        // Time passing while halted changes nothing.
        state.on_phase_tick(t0 + secs(60.0), EPSILON);
        state.on_session_tick(t0 + secs(60.0));
        assert!(approx(state.phase_time_remaining(), 1.5));
        assert_eq!(state.total_session_elapsed(), 2);

        let t1 = t0 + secs(60.0);
        state.begin(t1);
        state.on_phase_tick(t1 + secs(1.0), EPSILON);
        state.on_session_tick(t1 + secs(1.0));
        assert!(approx(state.phase_time_remaining(), 0.5));
        assert_eq!(state.total_session_elapsed(), 3);
        assert_eq!(state.current_phase(), Phase::Inhale);
    }

    #[test]
    fn test_reset_rewinds_everything() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        state.advance_phase(t0);
        state.on_session_tick(t0 + secs(30.0));
        state.reset();

        assert!(!state.is_running());
        assert_eq!(state.current_phase(), Phase::Inhale);
        assert!(approx(state.phase_time_remaining(), 4.0));
        assert_eq!(state.total_session_elapsed(), 0);
        assert_eq!(state.cycles_completed(), 0);
        assert!(state.phase_anchor().is_none());
        assert!(state.session_anchor().is_none());
    }

    #[test]
    fn test_replace_preset_positions_at_inhale() {
        let mut state = SessionState::new(box_preset());
        state.reset();
        state.replace_preset(Preset::new("relaxing", "Relaxing", 5.0, 0.0, 5.0, 0.0));
        assert_eq!(state.active_preset().id, "relaxing");
        assert_eq!(state.phase_sequence().len(), 2);
        assert!(approx(state.phase_time_remaining(), 5.0));
    }

    #[test]
    fn test_circle_scale_at_phase_start() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        assert!(approx(state.circle_scale(), 1.0));

        state.advance_phase(t0);
        assert_eq!(state.current_phase(), Phase::HoldAfterInhale);
        assert!(approx(state.circle_scale(), 2.0));

        state.advance_phase(t0);
        assert_eq!(state.current_phase(), Phase::Exhale);
        assert!(approx(state.circle_scale(), 2.0));

        state.advance_phase(t0);
        assert_eq!(state.current_phase(), Phase::HoldAfterExhale);
        assert!(approx(state.circle_scale(), 1.0));
    }

    #[test]
    fn test_circle_scale_at_phase_end() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        state.phase_time_remaining = 0.0;
        assert!(approx(state.circle_scale(), 2.0));

        state.phase = Phase::Exhale;
        assert!(approx(state.circle_scale(), 1.0));
    }

    #[test]
    fn test_circle_scale_midway() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        state.on_phase_tick(t0 + secs(1.0), EPSILON);
        assert!(approx(state.circle_scale(), 1.25));
    }

    #[test]
    fn test_circle_scale_phase_not_in_sequence_is_one() {
        let mut state = SessionState::new(four_seven_eight());
        state.phase = Phase::HoldAfterExhale;
        assert!(state.current_phase_index().is_none());
        assert!(approx(state.current_phase_duration(), 0.0));
        assert!(approx(state.circle_scale(), 1.0));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let t0 = Instant::now();
        let mut state = SessionState::new(box_preset());
        state.begin(t0);
        state.on_session_tick(t0 + secs(125.0));
        let snap = state.snapshot();
        assert_eq!(snap.phase_label, "Inhale");
        assert_eq!(snap.formatted_session_time, "02:05");
        assert!(snap.is_running);
        assert!(approx(snap.current_phase_duration, 4.0));
    }

    proptest! {
        #[test]
        fn circle_scale_stays_within_bounds(
            inhale in 0.1f64..20.0,
            hold_in in prop_oneof![Just(0.0f64), 0.1f64..20.0],
            exhale in 0.1f64..20.0,
            hold_out in prop_oneof![Just(0.0f64), 0.1f64..20.0],
            steps in prop::collection::vec(0.0f64..5.0, 1..40),
        ) {
            let t0 = Instant::now();
            let mut state =
                SessionState::new(Preset::new("p", "P", inhale, hold_in, exhale, hold_out));
            state.begin(t0);

            let mut now = t0;
            for step in steps {
                now += secs(step);
                state.on_phase_tick(now, EPSILON);
                let scale = state.circle_scale();
                prop_assert!(
                    (1.0..=2.0).contains(&scale),
                    "scale {} during {:?}",
                    scale,
                    state.current_phase()
                );
            }
        }
    }
}
