//! Configuration validation command.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning};
use crate::error::{BreathError, ConfigError, Severity, ValidationIssue};

/// Outcome for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// File that was checked.
    pub file: String,
    /// Whether the file passed.
    pub valid: bool,
    /// Errors, rendered as text.
    pub errors: Vec<String>,
    /// Warnings, rendered as text.
    pub warnings: Vec<String>,
}

/// Validates every file, prints a report, and fails if any file failed.
///
/// All files are checked even after a failure.
///
/// # Errors
///
/// Returns the first file's error, so the exit code reflects its kind.
pub fn run(args: &ValidateArgs) -> Result<(), BreathError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let (report, error) = check_file(&loader, path, args.strict);
        if first_error.is_none() {
            first_error = error;
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Human => {
            for report in &reports {
                println!("{}", render_human(report));
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Checks one file. Under `strict`, warnings fail the file.
pub fn check_file(
    loader: &ConfigLoader,
    path: &Path,
    strict: bool,
) -> (FileReport, Option<BreathError>) {
    let file = path.display().to_string();

    match loader.load(path) {
        Ok(result) => {
            let warnings: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
            let error = (strict && !result.warnings.is_empty()).then(|| {
                BreathError::from(ConfigError::ValidationError {
                    path: file.clone(),
                    errors: result.warnings.iter().map(promote_warning).collect(),
                })
            });
            let report = FileReport {
                file,
                valid: error.is_none(),
                errors: Vec::new(),
                warnings,
            };
            (report, error)
        }
        Err(err) => {
            let errors = match &err {
                ConfigError::ValidationError { errors, .. } => {
                    errors.iter().map(ToString::to_string).collect()
                }
                other => vec![other.to_string()],
            };
            let report = FileReport {
                file,
                valid: false,
                errors,
                warnings: Vec::new(),
            };
            (report, Some(err.into()))
        }
    }
}

fn promote_warning(warning: &LoadWarning) -> ValidationIssue {
    ValidationIssue {
        path: warning.location.clone().unwrap_or_default(),
        message: warning.message.clone(),
        severity: Severity::Error,
    }
}

fn render_human(report: &FileReport) -> String {
    let status = if report.valid { "ok" } else { "invalid" };
    let mut lines = vec![format!("{}: {status}", report.file)];
    lines.extend(report.errors.iter().map(|e| format!("  {e}")));
    lines.extend(report.warnings.iter().map(|w| format!("  warning: {w}")));
    lines.join("\n")
}
