//! `validate` command
//!
//! Loads each subscription file through the full loader and composer
//! pipeline and reports the result without touching any frame input.

use std::path::Path;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadResult};
use crate::error::{ConfigError, PunishTrackError, Severity, ValidationIssue};
use crate::filter::EventComposer;

/// Validate subscription files.
///
/// Every file is checked before returning, so one run reports all of them.
///
/// # Errors
///
/// Returns the first file's error, or a validation error if `--strict` is
/// set and any file produced warnings.
pub fn validate(args: &ValidateArgs) -> Result<(), PunishTrackError> {
    let loader = ConfigLoader::with_defaults();
    let mut first_error = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating subscriptions");
        let outcome = check(&loader, path, args.strict);
        report(path, &outcome, args.format)?;
        if let Err(e) = outcome {
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

fn check(loader: &ConfigLoader, path: &Path, strict: bool) -> Result<LoadResult, ConfigError> {
    let result = loader.load(path)?;
    EventComposer::compile(&result.config)?;

    if strict && !result.warnings.is_empty() {
        return Err(ConfigError::ValidationError {
            path: path.display().to_string(),
            errors: result
                .warnings
                .iter()
                .map(|w| ValidationIssue {
                    path: w.location.clone().unwrap_or_default(),
                    message: w.message.clone(),
                    severity: Severity::Error,
                })
                .collect(),
        });
    }
    Ok(result)
}

fn report(
    path: &Path,
    outcome: &Result<LoadResult, ConfigError>,
    format: OutputFormat,
) -> Result<(), PunishTrackError> {
    let (warnings, errors): (Vec<String>, Vec<String>) = match outcome {
        Ok(result) => (result.warnings.iter().map(ToString::to_string).collect(), Vec::new()),
        Err(ConfigError::ValidationError { errors, .. }) => {
            (Vec::new(), errors.iter().map(ToString::to_string).collect())
        }
        Err(other) => (Vec::new(), vec![other.to_string()]),
    };

    match format {
        OutputFormat::Human => {
            for warning in &warnings {
                println!("{}: warning: {warning}", path.display());
            }
            for error in &errors {
                println!("{}: {error}", path.display());
            }
            if outcome.is_ok() {
                println!("{}: ok", path.display());
            }
        }
        OutputFormat::Json => {
            let line = serde_json::json!({
                "file": path.display().to_string(),
                "valid": outcome.is_ok(),
                "errors": errors,
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string(&line)?);
        }
    }
    Ok(())
}
