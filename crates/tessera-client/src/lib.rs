//! Tessera Client - a recording HTTP client
//!
//! [`ValidatingClient`] wraps a [`reqwest::Client`]. Every exchange it makes
//! is recorded with a shared [`tessera_verifier::Verifier`], so a test suite
//! that talks to a running service through it gets contract verification and
//! coverage for free.
//!
//! ```ignore
//! use tessera_client::{UriBuilder, ValidatingClient};
//! use tessera_verifier::{PanicFailer, VerifierConfig};
//!
//! let uris = UriBuilder::new(server_url, "/api");
//! let client = ValidatingClient::wrap(
//!     reqwest::Client::new(),
//!     std::fs::File::open("openapi.yaml")?,
//!     VerifierConfig::new().with_base_path("/api"),
//! )?;
//!
//! client.get(uris.absolute("/ping")).await?;
//! client.verify(&PanicFailer);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod uri;

// Re-exports for convenience
pub use client::ValidatingClient;
pub use error::{ClientError, ClientResult};
pub use uri::UriBuilder;
