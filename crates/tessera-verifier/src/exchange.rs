//! Observed request/response pairs.

use bytes::Bytes;
use http::{Request, Response};

/// A completed exchange with both bodies fully buffered.
///
/// Validation only borrows the buffered bodies, so callers can still read
/// them after the exchange has been recorded.
#[derive(Debug, Clone)]
pub struct Exchange {
    request: Request<Bytes>,
    response: Response<Bytes>,
}

impl Exchange {
    /// Pair a request with the response it produced.
    pub fn new(request: Request<Bytes>, response: Response<Bytes>) -> Self {
        Self { request, response }
    }

    /// The request.
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// The response.
    pub fn response(&self) -> &Response<Bytes> {
        &self.response
    }

    /// Take the request and response back.
    pub fn into_parts(self) -> (Request<Bytes>, Response<Bytes>) {
        (self.request, self.response)
    }
}

impl From<(Request<Bytes>, Response<Bytes>)> for Exchange {
    fn from((request, response): (Request<Bytes>, Response<Bytes>)) -> Self {
        Self::new(request, response)
    }
}
