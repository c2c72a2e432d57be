//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod presets;
pub mod run;
pub mod validate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use crate::cli::args::{Cli, Commands};
use crate::config::{ConfigLoader, CycleConfig};
use crate::error::BreathError;
use crate::observability::EndReason;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), BreathError> {
    match cli.command {
        Commands::Run(args) => run::run(&args).await,
        Commands::Presets(args) => presets::run(&args),
        Commands::Validate(args) => validate::run(&args),
        Commands::Completions(args) => completions::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the configuration at `path`, or the empty default when absent.
///
/// Load warnings are logged by the loader.
///
/// # Errors
///
/// Returns a [`BreathError::Config`] if loading or validation fails.
pub fn load_config(path: Option<&Path>) -> Result<Arc<CycleConfig>, BreathError> {
    let Some(path) = path else {
        return Ok(Arc::new(CycleConfig::default()));
    };

    tracing::info!(config = %path.display(), "loading configuration");
    let loader = ConfigLoader::with_defaults();
    Ok(loader.load(path)?.config)
}

/// Resolves on the next Ctrl+C or SIGTERM.
pub async fn shutdown_signal() -> EndReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            return tokio::select! {
                _ = tokio::signal::ctrl_c() => EndReason::Interrupted,
                _ = sigterm.recv() => EndReason::Terminated,
            };
        }
    }

    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    EndReason::Interrupted
}
