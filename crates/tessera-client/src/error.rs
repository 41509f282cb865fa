//! Error types for the validating client.

use thiserror::Error;

use tessera_verifier::VerifierError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`ValidatingClient`](crate::ValidatingClient).
///
/// Transport failures never produce a recorded exchange; a verification
/// failure is not an error here but an entry in the verifier's ledger.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The specification could not be read.
    #[error("could not read spec: {0}")]
    SpecRead(#[source] std::io::Error),

    /// The verifier could not be built from the specification.
    #[error("could not create verifier: {0}")]
    Verifier(#[from] VerifierError),

    /// Building, sending, or reading the HTTP exchange failed.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The exchange could not be converted for recording.
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    /// The request URL is not a valid URI.
    #[error("invalid request URI: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_read_display() {
        let err = ClientError::SpecRead(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "truncated",
        ));
        assert_eq!(err.to_string(), "could not read spec: truncated");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_uri_from() {
        let parse = "http://exa mple.test/".parse::<http::Uri>().unwrap_err();
        let err = ClientError::from(parse);
        assert!(matches!(err, ClientError::InvalidUri(_)));
        assert!(err.to_string().starts_with("invalid request URI"));
    }
}
