//! Request and response dumps for request logging.

use bytes::Bytes;
use http::{HeaderMap, Request, Response};

/// Which half of an exchange a dump describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    /// The outbound request.
    Request,
    /// The response to it.
    Response,
}

/// One request-log entry.
#[derive(Debug, Clone)]
pub struct DumpRecord {
    /// Strictly increasing per verifier; shared by both halves of an exchange.
    pub sequence: u64,
    /// Request or response.
    pub kind: DumpKind,
    /// Wire-style dump of the message.
    pub text: String,
}

/// Receives request and response dumps when request logging is enabled.
///
/// Implemented for any `Fn(&DumpRecord) + Send + Sync` closure.
pub trait RequestLogger: Send + Sync {
    /// Log one dump.
    fn log(&self, record: &DumpRecord);
}

impl<F> RequestLogger for F
where
    F: Fn(&DumpRecord) + Send + Sync,
{
    fn log(&self, record: &DumpRecord) {
        self(record);
    }
}

/// Dump a request as `METHOD uri HTTP/x`, headers, blank line and body.
pub fn dump_request(request: &Request<Bytes>) -> String {
    let mut out = format!(
        "{} {} {:?}\r\n",
        request.method(),
        request.uri(),
        request.version()
    );
    write_headers(&mut out, request.headers());
    write_body(&mut out, request.body());
    out
}

/// Dump a response as `HTTP/x status`, headers, blank line and body.
pub fn dump_response(response: &Response<Bytes>) -> String {
    let mut out = format!("{:?} {}\r\n", response.version(), response.status());
    write_headers(&mut out, response.headers());
    write_body(&mut out, response.body());
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
}

fn write_body(out: &mut String, body: &Bytes) {
    out.push_str(&String::from_utf8_lossy(body));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_dump_request() {
        let request = Request::builder()
            .method("POST")
            .uri("http://localhost/req?id=1")
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(br#"{"input":"pem"}"#))
            .unwrap();

        let dump = dump_request(&request);
        assert!(dump.starts_with("POST http://localhost/req?id=1 HTTP/1.1\r\n"));
        assert!(dump.contains("content-type: application/json\r\n\r\n"));
        assert!(dump.ends_with(r#"{"input":"pem"}"#));
    }

    #[test]
    fn test_dump_response() {
        let response = Response::builder()
            .status(204)
            .body(Bytes::new())
            .unwrap();
        assert_eq!(dump_response(&response), "HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn test_closure_logger() {
        let seen = parking_lot::Mutex::new(Vec::new());
        let logger = |record: &DumpRecord| seen.lock().push(record.sequence);
        logger.log(&DumpRecord {
            sequence: 7,
            kind: DumpKind::Request,
            text: String::new(),
        });
        assert_eq!(*seen.lock(), vec![7]);
    }
}
