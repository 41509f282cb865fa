//! URL composition under a base path.

/// Builds request URLs for a service mounted under a base path.
///
/// # Example
///
/// ```
/// use tessera_client::UriBuilder;
///
/// let uris = UriBuilder::new("http://localhost:8080", "/api/v1/");
/// assert_eq!(uris.relative("/users/7"), "/api/v1/users/7");
/// assert_eq!(uris.absolute("users/7"), "http://localhost:8080/api/v1/users/7");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriBuilder {
    /// Scheme and authority, e.g. `http://localhost:8080`.
    pub host: String,
    /// Path the service is mounted under.
    pub base_path: String,
}

impl UriBuilder {
    /// Create a builder for `host` and `base_path`.
    pub fn new(host: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_path: base_path.into(),
        }
    }

    /// `path` prefixed with the host and base path.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.relative(path))
    }

    /// `path` prefixed with the base path.
    pub fn relative(&self, path: &str) -> String {
        let base = self.base_path.trim_matches('/');
        let path = path.trim_start_matches('/');
        if base.is_empty() {
            format!("/{path}")
        } else {
            format!("/{base}/{path}")
        }
    }
}
