//! # Tessera
//!
//! **OpenAPI contract verification for HTTP test suites**
//!
//! Tessera watches the HTTP exchanges a test suite makes and checks them
//! against an OpenAPI document:
//!
//! - **Conformance** – requests (optionally) and responses are validated
//!   against the documented parameters, media types and schemas
//! - **Completeness** – every documented (path, method, status) coordinate
//!   must be exercised at least once before the suite passes
//! - **Undocumented traffic** – calls to paths, methods or statuses the
//!   document does not describe are reported
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! #[tokio::test]
//! async fn test_api_contract() {
//!     let client = ValidatingClient::wrap(
//!         reqwest::Client::new(),
//!         std::fs::File::open("openapi.yaml").unwrap(),
//!         VerifierConfig::new().with_request_validation(),
//!     )
//!     .unwrap();
//!
//!     client.get("http://localhost:8080/ping").await.unwrap();
//!     client.verify(&PanicFailer);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ValidatingClient ─► Exchange ─► Verifier ─► RouteMatcher ─► Specification
//!                                    │                          (validation)
//!                                    ├─► CoverageTable
//!                                    └─► ErrorLedger ─► VerificationErrors ─► Failer
//! ```

#![doc(html_root_url = "https://docs.rs/tessera/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the document model and validation
pub use tessera_spec as spec;

// Re-export coverage and verification
pub use tessera_verifier as verifier;

// Re-export the recording client
pub use tessera_client as client;

// Re-export logging setup
pub use tessera_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use tessera_spec::{Specification, SpecError, ValidationFailure};

    // Verification session
    pub use tessera_verifier::{
        Classification, ClassifiedError, CoverageSummary, Exchange, Failer, PanicFailer,
        RequestLogger, VerificationErrors, Verifier, VerifierConfig, VerifierError,
    };

    // Recording client
    pub use tessera_client::{ClientError, UriBuilder, ValidatingClient};

    // Logging
    pub use tessera_telemetry::{init_logging, LogConfig, TracingRequestLogger};
}
