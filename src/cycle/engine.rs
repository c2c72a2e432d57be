//! Breathing cycle engine
//!
//! The `CycleEngine` owns the session state and two background ticker
//! tasks: a fine-grained phase ticker that counts down and advances
//! phases, and a coarser session ticker that updates elapsed time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::preset::Preset;

use super::phase::Phase;
use super::snapshot::SessionSnapshot;
use super::state::{PhaseTick, SessionState};

/// Default phase ticker period.
pub const DEFAULT_PHASE_TICK: Duration = Duration::from_millis(50);

/// Default session ticker period (10x the phase ticker).
pub const DEFAULT_SESSION_TICK: Duration = Duration::from_millis(500);

/// Remaining time at or below which a phase counts as complete.
pub const DEFAULT_COMPLETION_EPSILON: f64 = 0.05;

/// Ticker timing for a [`CycleEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Period of the phase countdown ticker
    pub phase_tick: Duration,
    /// Period of the elapsed-time ticker
    pub session_tick: Duration,
    /// Seconds-remaining threshold that completes a phase
    pub completion_epsilon: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            phase_tick: DEFAULT_PHASE_TICK,
            session_tick: DEFAULT_SESSION_TICK,
            completion_epsilon: DEFAULT_COMPLETION_EPSILON,
        }
    }
}

/// Handles for the two running ticker tasks.
struct Tickers {
    cancel: CancellationToken,
    phase: JoinHandle<()>,
    session: JoinHandle<()>,
}

impl Tickers {
    fn stop(self) {
        self.cancel.cancel();
        self.phase.abort();
        self.session.abort();
    }
}

/// Drives one breathing session.
///
/// Commands are synchronous. Between commands, state changes only through
/// the ticker tasks, which run while the session is running. Every change
/// is published to [`subscribe`](Self::subscribe) receivers.
///
/// [`start`](Self::start) must be called from within a tokio runtime.
/// Dropping the engine stops its tickers; [`dispose`](Self::dispose) does
/// the same explicitly.
pub struct CycleEngine {
    state: Arc<Mutex<SessionState>>,
    settings: EngineSettings,
    tickers: Option<Tickers>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
}

impl CycleEngine {
    /// Creates a stopped engine for `preset` with default ticker timing.
    #[must_use]
    pub fn new(preset: Preset) -> Self {
        Self::with_settings(preset, EngineSettings::default())
    }

    /// Creates a stopped engine for `preset` with the given ticker timing.
    #[must_use]
    pub fn with_settings(preset: Preset, settings: EngineSettings) -> Self {
        debug!(preset = %preset.id, ?settings, "creating cycle engine");
        let state = SessionState::new(preset);
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            state: Arc::new(Mutex::new(state)),
            settings,
            tickers: None,
            updates: Arc::new(updates),
        }
    }

    /// Returns the ticker timing in use.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Starts or resumes the session.
    ///
    /// Does nothing if already running. A fresh or just-reset session
    /// begins at the start of Inhale; a paused one resumes where it froze.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        if self.tickers.is_some() {
            warn!("stale tickers found on start; pausing first");
            self.pause();
        }

        {
            let mut state = lock(&self.state);
            state.begin(Instant::now());
            info!(
                preset = %state.active_preset().id,
                phase = %state.current_phase(),
                remaining = state.phase_time_remaining(),
                elapsed = state.total_session_elapsed(),
                "session started"
            );
            self.updates.send_replace(state.snapshot());
        }

        let cancel = CancellationToken::new();
        let phase = spawn_phase_ticker(
            Arc::clone(&self.state),
            Arc::clone(&self.updates),
            cancel.clone(),
            self.settings.phase_tick,
            self.settings.completion_epsilon,
        );
        let session = spawn_session_ticker(
            Arc::clone(&self.state),
            Arc::clone(&self.updates),
            cancel.clone(),
            self.settings.session_tick,
        );
        self.tickers = Some(Tickers {
            cancel,
            phase,
            session,
        });
    }

    /// Pauses the session and stops both tickers.
    ///
    /// Remaining and elapsed time stay exactly as last computed. Safe to
    /// call when already paused.
    pub fn pause(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.halt() {
                info!(
                    phase = %state.current_phase(),
                    remaining = state.phase_time_remaining(),
                    elapsed = state.total_session_elapsed(),
                    "session paused"
                );
            }
            self.updates.send_replace(state.snapshot());
        }

        if let Some(tickers) = self.tickers.take() {
            tickers.stop();
            debug!("tickers stopped");
        }
    }

    /// Pauses and rewinds the session to the start of Inhale with zero
    /// elapsed time.
    pub fn reset(&mut self) {
        self.pause();
        let mut state = lock(&self.state);
        state.reset();
        info!(preset = %state.active_preset().id, "session reset");
        self.updates.send_replace(state.snapshot());
    }

    /// Switches to `preset`, restarting at Inhale with zero elapsed time.
    ///
    /// A running session keeps running under the new preset.
    pub fn set_preset(&mut self, preset: Preset) {
        let was_running = self.is_running();
        self.reset();

        {
            let mut state = lock(&self.state);
            let from = state.active_preset().id.clone();
            state.replace_preset(preset);
            info!(from = %from, to = %state.active_preset().id, was_running, "preset changed");
            self.updates.send_replace(state.snapshot());
        }

        if was_running {
            self.start();
        }
    }

    /// Releases the tickers. Equivalent to [`pause`](Self::pause).
    pub fn dispose(&mut self) {
        self.pause();
        debug!("cycle engine disposed");
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    /// Receiver that sees a new snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Captures all observable and derived values.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).snapshot()
    }

    #[must_use]
    pub fn active_preset(&self) -> Preset {
        lock(&self.state).active_preset().clone()
    }

    #[must_use]
    pub fn current_phase(&self) -> Phase {
        lock(&self.state).current_phase()
    }

    #[must_use]
    pub fn phase_time_remaining(&self) -> f64 {
        lock(&self.state).phase_time_remaining()
    }

    #[must_use]
    pub fn total_session_elapsed(&self) -> u64 {
        lock(&self.state).total_session_elapsed()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.state).is_running()
    }

    #[must_use]
    pub fn cycles_completed(&self) -> u64 {
        lock(&self.state).cycles_completed()
    }

    #[must_use]
    pub fn phase_label(&self) -> &'static str {
        lock(&self.state).phase_label()
    }

    #[must_use]
    pub fn circle_scale(&self) -> f64 {
        lock(&self.state).circle_scale()
    }

    #[must_use]
    pub fn current_phase_duration(&self) -> f64 {
        lock(&self.state).current_phase_duration()
    }

    #[must_use]
    pub fn formatted_session_time(&self) -> String {
        lock(&self.state).formatted_session_time()
    }
}

impl Drop for CycleEngine {
    fn drop(&mut self) {
        if let Some(tickers) = self.tickers.take() {
            lock(&self.state).halt();
            tickers.stop();
        }
    }
}

impl std::fmt::Debug for CycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("CycleEngine")
            .field("preset", &state.active_preset().id)
            .field("phase", &state.current_phase())
            .field("is_running", &state.is_running())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Locks the session state, recovering from poisoning.
///
/// Every mutation leaves the state consistent, so a panic elsewhere while
/// the lock was held does not invalidate it.
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn new_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn spawn_phase_ticker(
    state: Arc<Mutex<SessionState>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
    cancel: CancellationToken,
    period: Duration,
    epsilon: f64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = new_interval(period);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("phase ticker cancelled");
                    break;
                }
                _ = interval.tick() => run_phase_tick(&state, &updates, epsilon),
            }
        }
    })
}

/// One phase tick: recompute, maybe transition, publish.
///
/// The snapshot is published while the lock is held so a concurrent pause
/// can never be followed by a stale running snapshot.
fn run_phase_tick(
    state: &Mutex<SessionState>,
    updates: &watch::Sender<SessionSnapshot>,
    epsilon: f64,
) {
    let mut state = lock(state);
    match state.on_phase_tick(Instant::now(), epsilon) {
        PhaseTick::Idle => return,
        PhaseTick::Counted => {}
        PhaseTick::Advanced(change) => {
            info!(
                from = %change.from,
                to = %change.to,
                duration = change.duration,
                cycles = state.cycles_completed(),
                "phase transition"
            );
        }
    }
    updates.send_replace(state.snapshot());
}

fn spawn_session_ticker(
    state: Arc<Mutex<SessionState>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
    cancel: CancellationToken,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = new_interval(period);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("session ticker cancelled");
                    break;
                }
                _ = interval.tick() => run_session_tick(&state, &updates),
            }
        }
    })
}

fn run_session_tick(state: &Mutex<SessionState>, updates: &watch::Sender<SessionSnapshot>) {
    let mut state = lock(state);
    if state.on_session_tick(Instant::now()) {
        updates.send_replace(state.snapshot());
    }
}
