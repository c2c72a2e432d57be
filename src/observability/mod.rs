//! Observability module
//!
//! Logging and the structured session event stream.

pub mod events;
pub mod logging;

pub use events::{EndReason, Event, EventEmitter, SessionSummary, transition_events};
pub use logging::{LogFormat, init_logging};
