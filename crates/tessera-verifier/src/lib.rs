//! Tessera Verifier - contract verification and coverage tracking
//!
//! This crate records observed HTTP exchanges against an OpenAPI document,
//! classifies everything that does not conform, and tracks which documented
//! coordinates have been exercised so a test run can require full coverage.
//!
//! # Overview
//!
//! - [`RouteMatcher`] compiles path templates into anchored matchers
//! - [`CoverageTable`] tracks (template, method, response key) coordinates
//! - [`ErrorLedger`] collects classified errors for a session
//! - [`Verifier`] ties them together under one lock
//!
//! # Recording an exchange
//!
//! ```text
//!   Exchange ──► RouteMatcher ──no match──► NotPartOfSpec
//!                    │
//!                    ▼
//!              CoverageTable ──no key────► NotPartOfSpec
//!                    │ mark checked
//!                    ▼
//!         validate request (optional) ───► RequestInvalid
//!                    │
//!                    ▼
//!            validate response ──────────► ResponseInvalid
//! ```
//!
//! At the end of a session every unexercised coordinate is reported as
//! `NotChecked`, unless full coverage is disabled.
//!
//! # Example
//!
//! ```ignore
//! use tessera_verifier::{Classification, Exchange, Verifier, VerifierConfig};
//!
//! let verifier = Verifier::new(&spec_bytes, VerifierConfig::new().with_base_path("/api"))?;
//! verifier.record(&Exchange::new(request, response));
//!
//! if let Some(errors) = verifier.current_error() {
//!     assert!(!errors.has_classification(Classification::ResponseInvalid));
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classification;
pub mod config;
pub mod coverage;
pub mod dump;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod route;
pub mod verifier;

// Re-exports for convenience
pub use classification::{
    find_cause, has_classification, Classification, ClassifiedError, Fault, VerificationErrors,
};
pub use config::{normalize_base_path, VerifierConfig};
pub use coverage::{Coordinate, CoverageTable, HttpMethod};
pub use dump::{DumpKind, DumpRecord, RequestLogger};
pub use error::{VerifierError, VerifierResult};
pub use exchange::Exchange;
pub use ledger::ErrorLedger;
pub use route::{RouteMatch, RouteMatcher};
pub use verifier::{CoverageSummary, Failer, PanicFailer, Verifier};
