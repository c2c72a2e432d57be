//! Session runner.
//!
//! Drives a [`CycleEngine`] until a stop condition, rendering the live
//! state and forwarding transitions to the event stream.

use std::io::{self, ErrorKind, IsTerminal, Write};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::commands::{load_config, shutdown_signal};
use crate::cycle::{CycleEngine, SessionSnapshot};
use crate::error::BreathError;
use crate::observability::{EndReason, Event, EventEmitter, SessionSummary, transition_events};

/// Width of the breathing bar in the human display.
const BAR_WIDTH: usize = 20;

/// Runs one breathing session.
///
/// Ends on Ctrl+C or SIGTERM, when `--duration` elapses, when `--cycles`
/// full cycles have completed, or when stdout stops accepting output. The
/// session is always paused and closed with `SessionEnded` before
/// returning.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the preset is
/// unknown, or the events file cannot be opened. A stdout failure other
/// than a closed pipe is returned after the session has been closed.
pub async fn run(args: &RunArgs) -> Result<(), BreathError> {
    if args.duration.is_some_and(|d| d.is_zero()) {
        return Err(BreathError::Usage("--duration must be greater than zero".to_string()));
    }

    let config = load_config(args.config.as_deref())?;
    let preset = config.resolve_preset(args.preset.as_deref())?;
    preset.validate()?;

    let emitter = match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    };

    let mut engine = CycleEngine::with_settings(preset, config.engine_settings());
    let mut updates = engine.subscribe();
    engine.start();

    let mut last = engine.snapshot();
    tracing::info!(preset = %last.preset.id, "session started");
    emitter.emit(Event::SessionStarted {
        timestamp: Utc::now(),
        preset_id: last.preset.id.clone(),
        cycle_seconds: last.preset.cycle_seconds(),
    });
    emitter.emit(Event::PhaseEntered {
        timestamp: Utc::now(),
        phase: last.phase,
        label: last.phase_label,
        duration_secs: last.current_phase_duration,
        cycle: last.cycles_completed,
    });
    let mut transitions = 0u64;

    let mut refresh = tokio::time::interval(Duration::from_millis(args.refresh_ms));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = args.duration.map(|d| Instant::now() + d);
    let expiry = async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(expiry);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut display = Display::new(args.format);
    let mut display_error = None;

    let reason = loop {
        tokio::select! {
            reason = &mut shutdown => break reason,
            () = &mut expiry => break EndReason::DurationElapsed,
            changed = updates.changed() => {
                if changed.is_err() {
                    break EndReason::Interrupted;
                }
                let next = updates.borrow_and_update().clone();
                for event in transition_events(&last, &next, Utc::now()) {
                    if let Event::PhaseEntered { phase, .. } = &event {
                        transitions += 1;
                        tracing::debug!(%phase, cycle = next.cycles_completed, "phase entered");
                    }
                    emitter.emit(event);
                }
                last = next;
                if args.cycles.is_some_and(|n| last.cycles_completed >= n) {
                    break EndReason::CyclesCompleted;
                }
            }
            _ = refresh.tick() => {
                if let Err(e) = display.show(&engine.snapshot()) {
                    if e.kind() != ErrorKind::BrokenPipe {
                        display_error = Some(e);
                    }
                    break EndReason::OutputClosed;
                }
            }
        }
    };

    engine.pause();
    let final_snapshot = engine.snapshot();
    engine.dispose();
    for event in transition_events(&last, &final_snapshot, Utc::now()) {
        emitter.emit(event);
    }
    if reason != EndReason::OutputClosed {
        if let Err(e) = display.finish(&final_snapshot) {
            if e.kind() != ErrorKind::BrokenPipe {
                display_error = Some(e);
            }
        }
    }

    let summary = SessionSummary {
        cycles_completed: final_snapshot.cycles_completed,
        elapsed_secs: final_snapshot.total_session_elapsed,
        phase_transitions: transitions,
    };
    tracing::info!(%reason, %summary, "session ended");
    emitter.emit(Event::SessionEnded {
        timestamp: Utc::now(),
        reason,
        summary,
    });
    emitter.flush();

    match display_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

// ============================================================================
// Display
// ============================================================================

/// Live output on stdout.
///
/// On a terminal the human line is redrawn in place; otherwise each refresh
/// is its own line.
struct Display {
    format: OutputFormat,
    in_place: bool,
    out: std::io::Stdout,
}

impl Display {
    fn new(format: OutputFormat) -> Self {
        let out = std::io::stdout();
        let in_place = format == OutputFormat::Human && out.is_terminal();
        Self {
            format,
            in_place,
            out,
        }
    }

    fn show(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let mut out = self.out.lock();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, snapshot)?;
                writeln!(out)?;
            }
            OutputFormat::Human if self.in_place => {
                write!(out, "\r{}\x1b[K", render_line(snapshot))?;
            }
            OutputFormat::Human => writeln!(out, "{}", render_line(snapshot))?,
        }
        out.flush()?;
        Ok(())
    }

    fn finish(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        self.show(snapshot)?;
        if self.in_place {
            writeln!(self.out)?;
        }
        Ok(())
    }
}

/// Renders one human status line.
///
/// ```text
/// Inhale  3.2s  [######              ]  00:12  cycle 1
/// ```
#[must_use]
pub fn render_line(snapshot: &SessionSnapshot) -> String {
    format!(
        "{:<6} {:>4.1}s  [{}]  {}  cycle {}{}",
        snapshot.phase_label,
        snapshot.phase_time_remaining,
        scale_bar(snapshot.circle_scale),
        snapshot.formatted_session_time,
        snapshot.cycles_completed + 1,
        if snapshot.is_running { "" } else { "  (paused)" },
    )
}

/// Maps a scale in `[1.0, 2.0]` onto a fixed-width bar.
fn scale_bar(scale: f64) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled =
        (((scale - 1.0).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}
