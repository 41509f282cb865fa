//! Verifier configuration.
//!
//! [`VerifierConfig`] is a plain struct with builder-style setters. It can
//! also be loaded from TOML and layered with environment variables:
//!
//! 1. Default values
//! 2. Configuration file (TOML)
//! 3. Environment variables (`<PREFIX>_BASE_PATH`, `<PREFIX>_VALIDATE_REQUESTS`, ...)

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dump::RequestLogger;
use crate::error::{VerifierError, VerifierResult};

/// Policy options for a [`Verifier`](crate::Verifier).
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Prefix correlating documented paths with request paths.
    ///
    /// When unset, the document's server paths and then the root are tried.
    pub base_path: Option<String>,

    /// Track documented `500` responses and report undocumented ones.
    pub include_internal_server_errors: bool,

    /// Validate requests as well as responses.
    pub validate_requests: bool,

    /// Do not report unexercised coordinates.
    pub disable_full_coverage: bool,

    /// Do not report responses whose only problem is an undecodable media type.
    pub ignore_unsupported_body_formats: bool,

    /// Receives a dump of every recorded request and response.
    #[serde(skip)]
    pub request_logger: Option<Arc<dyn RequestLogger>>,
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("base_path", &self.base_path)
            .field(
                "include_internal_server_errors",
                &self.include_internal_server_errors,
            )
            .field("validate_requests", &self.validate_requests)
            .field("disable_full_coverage", &self.disable_full_coverage)
            .field(
                "ignore_unsupported_body_formats",
                &self.ignore_unsupported_body_formats,
            )
            .field("request_logger", &self.request_logger.is_some())
            .finish()
    }
}

impl VerifierConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base path, normalized to a leading `/` and no trailing `/`.
    pub fn with_base_path(mut self, base_path: impl AsRef<str>) -> Self {
        self.base_path = Some(normalize_base_path(base_path.as_ref()));
        self
    }

    /// Track and require documented `500` responses.
    pub fn with_internal_server_errors(mut self) -> Self {
        self.include_internal_server_errors = true;
        self
    }

    /// Validate requests as well as responses.
    pub fn with_request_validation(mut self) -> Self {
        self.validate_requests = true;
        self
    }

    /// Stop reporting unexercised coordinates.
    pub fn without_full_coverage(mut self) -> Self {
        self.disable_full_coverage = true;
        self
    }

    /// Ignore responses whose media type has no decoder.
    pub fn with_ignored_unsupported_body_formats(mut self) -> Self {
        self.ignore_unsupported_body_formats = true;
        self
    }

    /// Dump every recorded exchange to `logger`.
    pub fn with_request_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.request_logger = Some(logger);
        self
    }

    /// The base path in normalized form, if one is configured.
    pub fn normalized_base_path(&self) -> Option<String> {
        self.base_path.as_deref().map(normalize_base_path)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_verifier::VerifierConfig;
    ///
    /// let config = VerifierConfig::from_toml_str(r#"
    ///     base_path = "/api"
    ///     validate_requests = true
    /// "#).unwrap();
    ///
    /// assert_eq!(config.base_path.as_deref(), Some("/api"));
    /// assert!(config.validate_requests);
    /// ```
    pub fn from_toml_str(content: &str) -> VerifierResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> VerifierResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| VerifierError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Override fields from environment variables named `<PREFIX>_<FIELD>`.
    ///
    /// Recognized fields: `BASE_PATH`, `INCLUDE_INTERNAL_SERVER_ERRORS`,
    /// `VALIDATE_REQUESTS`, `DISABLE_FULL_COVERAGE` and
    /// `IGNORE_UNSUPPORTED_BODY_FORMATS`.
    pub fn with_env_overrides(self, prefix: &str) -> VerifierResult<Self> {
        self.with_overrides(prefix, env::vars())
    }

    fn with_overrides(
        mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> VerifierResult<Self> {
        let prefix = format!("{}_", prefix.to_uppercase());
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(&prefix) else {
                continue;
            };
            let flag = || {
                parse_bool(&value).ok_or_else(|| VerifierError::env_parse(&key, "expected boolean"))
            };
            match field {
                "BASE_PATH" => self.base_path = Some(normalize_base_path(&value)),
                "INCLUDE_INTERNAL_SERVER_ERRORS" => self.include_internal_server_errors = flag()?,
                "VALIDATE_REQUESTS" => self.validate_requests = flag()?,
                "DISABLE_FULL_COVERAGE" => self.disable_full_coverage = flag()?,
                "IGNORE_UNSUPPORTED_BODY_FORMATS" => {
                    self.ignore_unsupported_body_formats = flag()?;
                }
                _ => {}
            }
        }
        Ok(self)
    }
}

/// Normalize a base path to `/` followed by the value without surrounding slashes.
pub fn normalize_base_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
