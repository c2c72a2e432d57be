//! Command-line interface
//!
//! Argument definitions and the per-subcommand handlers.

pub mod args;
pub mod commands;
