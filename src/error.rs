//! Error types for the analysis engine.
//!
//! `EngineError` covers the synchronous, "raised from a Validation Service
//! entry point" failures (bad config, an explicitly-requested language with
//! no adapter, an unknown profile). Everything else in the taxonomy
//! described by the spec is recoverable *during* a run and is carried as
//! data in `Result.errors` (see `crate::service::RunErrorEntry`) rather than
//! thrown.

use thiserror::Error;

/// Errors raised synchronously from `ValidationService` construction or
/// entry points. Never produced mid-analysis; see module docs.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("unknown profile '{name}'")]
    InvalidProfile { name: String },

    #[error("no adapter registered for language '{language}', which was explicitly requested")]
    AdapterMissing { language: String },
}

impl EngineError {
    /// Recovery suggestions for this error, in the same spirit as the
    /// teacher crate's `IndexError::recovery_suggestions`.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigError { .. } => vec![
                "Check the TOML file for syntax errors",
                "Check ANALYZER_-prefixed environment variables for type mismatches",
            ],
            Self::InvalidProfile { .. } => {
                vec!["Use one of the registered profiles, e.g. \"default\" or \"alpha_default\""]
            }
            Self::AdapterMissing { .. } => {
                vec!["Register an adapter for this language before requesting it explicitly"]
            }
        }
    }
}

/// Result type alias for engine entry points.
pub type EngineResult<T> = Result<T, EngineError>;