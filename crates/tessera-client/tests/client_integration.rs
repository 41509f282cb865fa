//! End-to-end tests of the validating client against a local hyper server.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use tessera_client::{UriBuilder, ValidatingClient};
use tessera_verifier::{
    has_classification, Classification, DumpRecord, PanicFailer, RequestLogger,
    VerificationErrors, VerifierConfig,
};

#[derive(Default)]
struct Log(Mutex<Vec<String>>);

impl RequestLogger for Log {
    fn log(&self, record: &DumpRecord) {
        self.0.lock().push(record.text.clone());
    }
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!("{}/tests/testdata/{name}", env!("CARGO_MANIFEST_DIR"))).unwrap()
}

fn reply(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    if !content_type.is_empty() {
        builder = builder.header("content-type", content_type);
    }
    builder.body(Full::new(body.into())).unwrap()
}

/// Serve `handler` on an ephemeral port and return the base URL.
async fn serve<F>(handler: F) -> String
where
    F: Fn(&Request<Incoming>) -> Response<Full<Bytes>> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let response = handler(&req);
                    async move { Ok::<_, Infallible>(response) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    format!("http://{addr}")
}

fn non_coverage(errors: Option<VerificationErrors>) -> usize {
    errors.map_or(0, |errors| {
        errors.len() - errors.count(Classification::NotChecked)
    })
}

#[tokio::test]
async fn test_different_base_path() {
    let url = serve(|req| {
        if req.uri().path() == "/mybase/thing/10" {
            reply(StatusCode::NO_CONTENT, "", Bytes::new())
        } else {
            reply(StatusCode::BAD_REQUEST, "", Bytes::new())
        }
    })
    .await;

    let client = ValidatingClient::wrap(
        reqwest::Client::new(),
        fixture("delete-spec.yaml").as_slice(),
        VerifierConfig::new().with_base_path("/mybase"),
    )
    .unwrap();

    let uris = UriBuilder::new(&url, "mybase");
    let response = client.delete(uris.absolute("/thing/10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    client.verify(&PanicFailer);
}

#[tokio::test]
async fn test_path_parameter_validation() {
    let url = serve(|_| reply(StatusCode::NO_CONTENT, "", Bytes::new())).await;
    let spec = fixture("param-spec.yaml");

    let cases = [
        ("too short name", "Bob", "2", "other", false),
        ("empty name", "", "2", "other", false),
        ("invalid age", "Bobaloo", "-1", "other", false),
        ("fine female", "Mrs Bobaloo", "105", "female", true),
        ("fine male", "Bobaloo", "62", "male", true),
        ("fine other", "Bobaloo", "62", "other", true),
        ("bad alien", "Bobaloo", "62", "alien", false),
        ("empty gender", "Bobaloo", "62", "", false),
        ("empty age", "Bobaloo", "", "", false),
    ];

    for (case, name, age, gender, valid) in cases {
        let client = ValidatingClient::wrap(
            reqwest::Client::new(),
            spec.as_slice(),
            VerifierConfig::new().with_request_validation(),
        )
        .unwrap();

        let response = client
            .head(format!("{url}/{name}/{age}/{gender}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{case}");

        let errors = client.current_errors();
        if valid {
            assert!(errors.is_empty(), "{case}: {errors:?}");
        } else {
            assert!(!errors.is_empty(), "{case}");
        }
    }
}

#[tokio::test]
async fn test_wrap_and_switch_client() {
    let url = serve(|req| {
        if req.uri().path() == "/ping" {
            reply(StatusCode::OK, "application/json", r#"{"message":"pong!"}"#)
        } else {
            reply(StatusCode::OK, "application/json", r#"{"thing": "yes"}"#)
        }
    })
    .await;

    let client = ValidatingClient::wrap(
        reqwest::Client::new(),
        fixture("thing-spec.yaml").as_slice(),
        VerifierConfig::new(),
    )
    .unwrap();

    let response = client.get(format!("{url}/ping")).await.unwrap();
    let body = response.text().await.unwrap();
    assert_eq!(body, r#"{"message":"pong!"}"#);

    let other = client.with_client(reqwest::Client::builder().build().unwrap());
    other.get(format!("{url}/other")).await.unwrap();

    client.verify(&PanicFailer);
}

#[tokio::test]
async fn test_request_logging() {
    let url = serve(|_| reply(StatusCode::NO_CONTENT, "", Bytes::new())).await;

    let log = Arc::new(Log::default());
    let client = ValidatingClient::wrap(
        reqwest::Client::new(),
        fixture("minimal-spec.yaml").as_slice(),
        VerifierConfig::new().with_request_logger(log.clone()),
    )
    .unwrap();

    client.get(format!("{url}/ping")).await.unwrap();

    let logs = log.0.lock();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|entry| !entry.is_empty()));
    assert!(logs[0].starts_with("GET "));
    drop(logs);

    client.verify(&PanicFailer);
}

#[tokio::test]
async fn test_response_validation_errors() {
    let spec = fixture("number-spec.yaml");

    let cases = [
        ("wrong path", "application/json", "2", "/wrong"),
        ("not a number", "application/json", "two", "/mini"),
        ("base path", "application/json", "2", "/"),
        ("no content type", "", "2", "/mini"),
        ("wrong content type", "text/plain", "2", "/mini"),
        ("empty number", "application/json", "", "/mini"),
    ];

    for (case, content_type, number, path) in cases {
        let body = format!(r#"{{"number": {number}}}"#);
        let url = serve(move |_| reply(StatusCode::OK, content_type, body.clone())).await;

        let client = ValidatingClient::wrap(
            reqwest::Client::new(),
            spec.as_slice(),
            VerifierConfig::new(),
        )
        .unwrap();

        client.get(format!("{url}{path}")).await.unwrap();
        assert!(non_coverage(client.current_error()) > 0, "{case}");
    }
}

#[tokio::test]
async fn test_request_body_validation() {
    let url = serve(|_| reply(StatusCode::NO_CONTENT, "", Bytes::new())).await;
    let spec = fixture("request-body-spec.yaml");

    let cases = [
        ("according to spec", "application/json", r#"{"input":"pem"}"#, false),
        ("wrong content type", "text/plain", r#"{"input":"pem"}"#, true),
        ("wrong input field type", "application/json", r#"{"input":5}"#, true),
        ("missing input field", "application/json", r#"{"message":"stuff"}"#, true),
        ("extra fields in body", "application/json", r#"{"input": "yes", "message":"stuff"}"#, false),
        ("empty content type", "", r#"{"input":"pem"}"#, true),
        ("empty body", "application/json", "", true),
    ];

    for (case, content_type, body, should_error) in cases {
        let client = ValidatingClient::wrap(
            reqwest::Client::new(),
            spec.as_slice(),
            VerifierConfig::new().with_request_validation(),
        )
        .unwrap();

        let response = client
            .post(format!("{url}/req"), content_type, body)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{case}");

        match client.current_error() {
            Some(errors) => {
                assert!(should_error, "{case}: {errors}");
                assert!(
                    has_classification(&errors, Classification::RequestInvalid),
                    "{case}"
                );
            }
            None => assert!(!should_error, "{case}"),
        }
    }
}

#[tokio::test]
async fn test_transport_error_is_not_recorded() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let log = Arc::new(Log::default());
    let client = ValidatingClient::wrap(
        reqwest::Client::new(),
        fixture("minimal-spec.yaml").as_slice(),
        VerifierConfig::new().with_request_logger(log.clone()),
    )
    .unwrap();

    assert!(client.get(format!("http://{addr}/ping")).await.is_err());

    let errors = client.current_error().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors.iter().all(|e| e.is(Classification::NotChecked)));
    assert!(log.0.lock().is_empty());
}
