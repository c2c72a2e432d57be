//! Breathing cycle engine
//!
//! Turns a [`Preset`](crate::preset::Preset) into a live, pausable,
//! resumable countdown through the breathing phases.
//!
//! # Architecture
//!
//! - [`Phase`] / [`PhaseSequence`]: the circular phase list derived from a preset
//! - [`SessionState`]: mutable session state and anchor-based timing math
//! - [`CycleEngine`]: commands, ticker tasks, snapshot publication
//! - [`SessionSnapshot`]: everything a presentation layer reads

pub mod engine;
pub mod phase;
pub mod snapshot;
pub mod state;

pub use engine::{CycleEngine, EngineSettings};
pub use phase::{Phase, PhaseSequence, PhaseStep};
pub use snapshot::{SessionSnapshot, format_session_time};
pub use state::{Anchor, PhaseChange, PhaseTick, SessionState};
