//! The validating client.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::Method;
use reqwest::{Body, Client, IntoUrl, Request, Response};
use tracing::debug;

use tessera_verifier::{
    ClassifiedError, Exchange, Failer, VerificationErrors, Verifier, VerifierConfig,
};

use crate::error::{ClientError, ClientResult};

/// Wraps a [`reqwest::Client`] and records every exchange it makes.
///
/// Each successful call buffers the response body, records the exchange with
/// the shared [`Verifier`] and hands back an equivalent [`Response`]. Calls
/// that fail in transport are returned as errors and not recorded.
///
/// Responses are rebuilt from the buffered parts, so [`Response::url`] does
/// not reflect the requested URL.
///
/// # Example
///
/// ```ignore
/// use tessera_client::ValidatingClient;
/// use tessera_verifier::{PanicFailer, VerifierConfig};
///
/// let spec = std::fs::File::open("openapi.yaml")?;
/// let client = ValidatingClient::wrap(reqwest::Client::new(), spec, VerifierConfig::new())?;
///
/// let response = client.get("http://localhost:8080/ping").await?;
/// assert!(response.status().is_success());
///
/// client.verify(&PanicFailer);
/// ```
#[derive(Debug, Clone)]
pub struct ValidatingClient {
    client: Client,
    verifier: Arc<Verifier>,
}

impl ValidatingClient {
    /// Read a specification and wrap `client` with a new verifier for it.
    pub fn wrap(client: Client, mut spec: impl Read, config: VerifierConfig) -> ClientResult<Self> {
        let mut bytes = Vec::new();
        spec.read_to_end(&mut bytes).map_err(ClientError::SpecRead)?;
        let verifier = Verifier::new(&bytes, config)?;
        Ok(Self::from_verifier(client, Arc::new(verifier)))
    }

    /// Wrap `client` with an existing verifier.
    pub fn from_verifier(client: Client, verifier: Arc<Verifier>) -> Self {
        Self { client, verifier }
    }

    /// A wrapper around a different client that records into the same
    /// verifier, e.g. with other transport or authorization settings.
    #[must_use]
    pub fn with_client(&self, client: Client) -> Self {
        Self {
            client,
            verifier: Arc::clone(&self.verifier),
        }
    }

    /// The shared verifier.
    pub fn verifier(&self) -> &Arc<Verifier> {
        &self.verifier
    }

    /// The wrapped client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send `request` and record the exchange.
    pub async fn execute(&self, request: Request) -> ClientResult<Response> {
        let recorded = snapshot_request(&request)?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut buffered = http::Response::builder()
            .status(status)
            .version(version)
            .body(body)?;
        *buffered.headers_mut() = headers;

        let exchange = Exchange::new(recorded, buffered);
        self.verifier.record(&exchange);
        debug!(
            method = %exchange.request().method(),
            uri = %exchange.request().uri(),
            status = status.as_u16(),
            "client exchange recorded"
        );

        let (_, response) = exchange.into_parts();
        Ok(Response::from(response))
    }

    /// Send a GET request.
    pub async fn get(&self, url: impl IntoUrl) -> ClientResult<Response> {
        self.send(Method::GET, url, None).await
    }

    /// Send a HEAD request.
    pub async fn head(&self, url: impl IntoUrl) -> ClientResult<Response> {
        self.send(Method::HEAD, url, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, url: impl IntoUrl) -> ClientResult<Response> {
        self.send(Method::DELETE, url, None).await
    }

    /// Send a POST request. An empty `content_type` sends no `Content-Type`.
    pub async fn post(
        &self,
        url: impl IntoUrl,
        content_type: &str,
        body: impl Into<Body>,
    ) -> ClientResult<Response> {
        self.send(Method::POST, url, Some((content_type, body.into())))
            .await
    }

    /// Send a PUT request. An empty `content_type` sends no `Content-Type`.
    pub async fn put(
        &self,
        url: impl IntoUrl,
        content_type: &str,
        body: impl Into<Body>,
    ) -> ClientResult<Response> {
        self.send(Method::PUT, url, Some((content_type, body.into())))
            .await
    }

    /// Send a PATCH request. An empty `content_type` sends no `Content-Type`.
    pub async fn patch(
        &self,
        url: impl IntoUrl,
        content_type: &str,
        body: impl Into<Body>,
    ) -> ClientResult<Response> {
        self.send(Method::PATCH, url, Some((content_type, body.into())))
            .await
    }

    /// Errors recorded so far, plus uncovered coordinates.
    pub fn current_errors(&self) -> Vec<ClassifiedError> {
        self.verifier.current_errors()
    }

    /// All current errors joined, or `None` when there are none.
    pub fn current_error(&self) -> Option<VerificationErrors> {
        self.verifier.current_error()
    }

    /// Report any current errors to `failer`.
    pub fn verify(&self, failer: &impl Failer) {
        self.verifier.verify(failer);
    }

    /// Clear recorded errors and coverage.
    pub fn reset(&self) {
        self.verifier.reset();
    }

    async fn send(
        &self,
        method: Method,
        url: impl IntoUrl,
        body: Option<(&str, Body)>,
    ) -> ClientResult<Response> {
        let mut builder = self.client.request(method, url);
        if let Some((content_type, body)) = body {
            if !content_type.is_empty() {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body);
        }
        self.execute(builder.build()?).await
    }
}

// Streaming bodies cannot be read without consuming them and are recorded
// as empty.
fn snapshot_request(request: &Request) -> ClientResult<http::Request<Bytes>> {
    let body = request
        .body()
        .and_then(Body::as_bytes)
        .map(Bytes::copy_from_slice)
        .unwrap_or_default();

    let mut snapshot = http::Request::builder()
        .method(request.method().clone())
        .uri(request.url().as_str().parse::<http::Uri>()?)
        .version(request.version())
        .body(body)?;
    *snapshot.headers_mut() = request.headers().clone();
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "openapi: 3.0.3
info:
  title: Snapshot
  version: '1'
paths:
  /ping:
    get:
      responses:
        '204':
          description: pong
";

    #[test]
    fn test_snapshot_request() {
        let client = Client::new();
        let request = client
            .post("http://localhost:9/items?x=1")
            .header(CONTENT_TYPE, "application/json")
            .body(r#"{"a":1}"#)
            .build()
            .unwrap();

        let snapshot = snapshot_request(&request).unwrap();
        assert_eq!(snapshot.method(), Method::POST);
        assert_eq!(snapshot.uri().path(), "/items");
        assert_eq!(snapshot.uri().query(), Some("x=1"));
        assert_eq!(snapshot.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(snapshot.body().as_ref(), br#"{"a":1}"#);
    }

    #[test]
    fn test_snapshot_without_body() {
        let request = Client::new().get("http://localhost:9/ping").build().unwrap();
        let snapshot = snapshot_request(&request).unwrap();
        assert!(snapshot.body().is_empty());
    }

    #[test]
    fn test_with_client_shares_verifier() {
        let client =
            ValidatingClient::wrap(Client::new(), SPEC.as_bytes(), VerifierConfig::new()).unwrap();
        let other = client.with_client(Client::new());
        assert!(Arc::ptr_eq(client.verifier(), other.verifier()));
        assert_eq!(client.current_errors().len(), 1);
    }

    #[test]
    fn test_wrap_rejects_invalid_spec() {
        let err = ValidatingClient::wrap(Client::new(), &b"openapi: ["[..], VerifierConfig::new())
            .unwrap_err();
        assert!(matches!(err, ClientError::Verifier(_)));
    }
}
