//! Configuration module
//!
//! Loads and validates `breathcycle` configuration files: custom presets,
//! the default preset, and ticker timing.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::{CycleConfig, TimingConfig};
pub use validation::{ValidationResult, Validator};
