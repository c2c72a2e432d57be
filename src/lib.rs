//! `breathcycle` - guided breathing sessions
//!
//! A drift-free breathing cycle engine driven by tokio tickers, with a
//! preset catalog, YAML configuration, and a terminal front end.

pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod observability;
pub mod preset;
