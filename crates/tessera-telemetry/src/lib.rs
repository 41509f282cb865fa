//! Logging for Tessera.
//!
//! Tessera crates report what they do through `tracing` events: verifier
//! construction and resets at `info`, every recorded exchange at `debug`.
//! This crate installs a subscriber for those events and provides
//! [`TracingRequestLogger`], which routes request/response dumps into the
//! same pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_telemetry::{init_logging, LogConfig, TracingRequestLogger};
//! use tessera_verifier::VerifierConfig;
//!
//! init_logging(&LogConfig::development())?;
//!
//! let config = VerifierConfig::new()
//!     .with_request_logger(Arc::new(TracingRequestLogger::default()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod request_log;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use request_log::TracingRequestLogger;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
