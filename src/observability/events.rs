//! Structured session event stream.
//!
//! Discrete, typed events emitted while a session runs. Events are
//! serialized as newline-delimited JSON (JSONL) with a monotonically
//! increasing sequence number for ordering.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cycle::{Phase, SessionSnapshot};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The requested duration elapsed.
    DurationElapsed,
    /// The requested number of cycles completed.
    CyclesCompleted,
    /// Interrupted by SIGINT.
    Interrupted,
    /// The reader of the live output closed stdout.
    OutputClosed,
    /// Terminated by SIGTERM.
    Terminated,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::DurationElapsed => "duration elapsed",
            Self::CyclesCompleted => "cycles completed",
            Self::Interrupted => "interrupted",
            Self::Terminated => "terminated",
            Self::OutputClosed => "output closed",
        })
    }
}

/// Summary statistics emitted when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Full cycles completed.
    pub cycles_completed: u64,
    /// Whole seconds of running time.
    pub elapsed_secs: u64,
    /// Number of phase transitions observed.
    pub phase_transitions: u64,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cycles={} elapsed={}s transitions={}",
            self.cycles_completed, self.elapsed_secs, self.phase_transitions,
        )
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a breathing session.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The session started.
    SessionStarted {
        /// When the session started.
        timestamp: DateTime<Utc>,
        /// Id of the active preset.
        preset_id: String,
        /// Seconds per full cycle.
        cycle_seconds: f64,
    },

    /// A new phase was entered.
    PhaseEntered {
        /// When the transition was observed.
        timestamp: DateTime<Utc>,
        /// The phase entered.
        phase: Phase,
        /// Display label of the phase.
        label: &'static str,
        /// Configured duration of the phase in seconds.
        duration_secs: f64,
        /// Cycles completed before this phase.
        cycle: u64,
    },

    /// A full cycle finished (wrap back to the first phase).
    CycleCompleted {
        /// When the cycle finished.
        timestamp: DateTime<Utc>,
        /// Total cycles completed so far.
        cycles_completed: u64,
        /// Session clock at completion.
        elapsed_secs: u64,
    },

    /// The session was paused.
    SessionPaused {
        /// When the pause was observed.
        timestamp: DateTime<Utc>,
        /// Phase at the moment of pausing.
        phase: Phase,
        /// Seconds left in that phase.
        phase_time_remaining: f64,
    },

    /// The session ended.
    SessionEnded {
        /// When the session ended.
        timestamp: DateTime<Utc>,
        /// Why the session ended.
        reason: EndReason,
        /// Session statistics.
        summary: SessionSummary,
    },
}

/// Derives the events implied by moving from `prev` to `next`.
///
/// Phase changes while running yield [`Event::PhaseEntered`], a bump in
/// `cycles_completed` yields [`Event::CycleCompleted`] first, and a
/// running-to-stopped edge yields [`Event::SessionPaused`].
#[must_use]
pub fn transition_events(
    prev: &SessionSnapshot,
    next: &SessionSnapshot,
    timestamp: DateTime<Utc>,
) -> Vec<Event> {
    let mut events = Vec::new();

    if next.cycles_completed > prev.cycles_completed {
        events.push(Event::CycleCompleted {
            timestamp,
            cycles_completed: next.cycles_completed,
            elapsed_secs: next.total_session_elapsed,
        });
    }

    if next.is_running && (next.phase != prev.phase || next.cycles_completed != prev.cycles_completed)
    {
        events.push(Event::PhaseEntered {
            timestamp,
            phase: next.phase,
            label: next.phase_label,
            duration_secs: next.current_phase_duration,
            cycle: next.cycles_completed,
        });
    }

    if prev.is_running && !next.is_running {
        events.push(Event::SessionPaused {
            timestamp,
            phase: next.phase,
            phase_time_remaining: next.phase_time_remaining,
        });
    }

    events
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each [`emit`](Self::emit) increments the sequence counter, writes the
/// event as one JSON line and flushes. Serialization or I/O failures are
/// dropped; the session keeps running.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to the file at `path`.
    ///
    /// The file holds one session: an existing file is truncated, so
    /// sequence numbers are unique within it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Flushes the underlying writer.
    pub fn flush(&self) {
        if let Ok(mut w) = self.writer.lock() {
            let _ = w.flush();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
