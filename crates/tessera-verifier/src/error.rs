//! Verifier error types.
//!
//! [`VerifierError`] covers everything that can prevent a [`Verifier`] from
//! being constructed or configured. Problems found while recording exchanges
//! are never returned from `record`; they are kept as
//! [`ClassifiedError`](crate::ClassifiedError)s instead.
//!
//! [`Verifier`]: crate::Verifier

use std::path::PathBuf;

use tessera_spec::SpecError;
use thiserror::Error;

/// Result type for verifier construction and configuration.
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Errors that can occur while building a verifier or loading its configuration.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// The specification could not be loaded.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// A documented path template could not be compiled into a matcher.
    #[error("could not compile route for {template:?}: {reason}")]
    Route {
        /// The offending template.
        template: String,
        /// Why compilation failed.
        reason: String,
    },

    /// Failed to read a configuration file.
    #[error("failed to read configuration file: {path}")]
    ConfigRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParse {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },
}

impl VerifierError {
    pub(crate) fn route(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Route {
            template: template.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
