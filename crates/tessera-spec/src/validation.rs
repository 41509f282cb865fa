//! Request and response validation against a resolved operation.
//!
//! Validation never stops at the first problem: every issue found in an
//! exchange is collected into one [`ValidationFailure`].

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, Method, Request, StatusCode};
use tracing::debug;

use crate::document::{MediaType, ParameterIn};
use crate::error::{IssueKind, ValidationFailure, ValidationIssue};
use crate::media::{decode, negotiate, DecodeError, Decoded};
use crate::model::{OperationRef, Specification};
use crate::params::{coerce, parse_pairs};
use crate::schema::SchemaValidator;

impl Specification {
    /// Validate a request against the operation it was resolved to.
    ///
    /// `path_params` are the decoded path parameter values captured while
    /// matching the request path.
    pub fn validate_request(
        &self,
        op: OperationRef<'_>,
        request: &Request<Bytes>,
        path_params: &HashMap<String, String>,
    ) -> Result<(), ValidationFailure> {
        let validator = self.schema_validator();
        let mut issues = Vec::new();

        let query = group_pairs(parse_pairs(request.uri().query().unwrap_or_default(), '&'));
        let cookies = group_pairs(
            request
                .headers()
                .get_all(COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|v| parse_pairs(v, ';'))
                .collect(),
        );

        for param in &op.operation.parameters {
            let Some(location) = param.location else {
                continue;
            };
            let values: Vec<&str> = match location {
                ParameterIn::Path => path_params
                    .get(&param.name)
                    .map(|v| vec![v.as_str()])
                    .unwrap_or_default(),
                ParameterIn::Query => lookup(&query, &param.name),
                ParameterIn::Cookie => lookup(&cookies, &param.name),
                ParameterIn::Header => request
                    .headers()
                    .get_all(param.name.as_str())
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .collect(),
            };

            let path = format!("{}.{}", location.as_str(), param.name);
            if values.is_empty() {
                if param.required {
                    issues.push(ValidationIssue::new(
                        IssueKind::Parameter,
                        path,
                        format!("missing required {} parameter", location.as_str()),
                    ));
                }
                continue;
            }

            if let Some(schema) = &param.schema {
                let value = coerce(&values, schema, &validator);
                issues.extend(validator.validate(schema, &value, &path).into_iter().map(
                    |v| ValidationIssue::new(IssueKind::Parameter, v.path, v.message),
                ));
            }
        }

        if let Some(body_spec) = &op.operation.request_body {
            let body = request.body();
            if body.is_empty() {
                if body_spec.required {
                    issues.push(ValidationIssue::new(
                        IssueKind::Body,
                        "body",
                        "request body is required",
                    ));
                }
            } else {
                match content_type(request.headers()) {
                    None => issues.push(ValidationIssue::new(
                        IssueKind::ContentType,
                        "body",
                        "missing Content-Type header",
                    )),
                    Some(ct) => match negotiate(&body_spec.content, ct) {
                        None => issues.push(ValidationIssue::new(
                            IssueKind::ContentType,
                            "body",
                            format!("request content type {ct:?} is not declared"),
                        )),
                        Some((_, media)) => {
                            check_body(&validator, "body", ct, body, media, &mut issues);
                        }
                    },
                }
            }
        }

        if !issues.is_empty() {
            debug!(
                method = %op.method,
                template = op.template,
                issues = issues.len(),
                "request failed validation"
            );
        }
        ValidationFailure::from_issues(issues)
    }

    /// Validate a response against the operation its request resolved to.
    ///
    /// The response is looked up by exact status, then its `NXX` range, then
    /// `default`. Bodies of responses to `HEAD` requests are not inspected.
    pub fn validate_response(
        &self,
        op: OperationRef<'_>,
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), ValidationFailure> {
        let Some(key) = op.operation.response_key(status.as_u16()) else {
            return ValidationFailure::from_issues(vec![ValidationIssue::new(
                IssueKind::Status,
                "",
                format!(
                    "status {} is not documented for {} {}",
                    status.as_u16(),
                    op.method,
                    op.template
                ),
            )]);
        };
        let Some(response) = op.operation.responses.get(key) else {
            return Ok(());
        };

        let validator = self.schema_validator();
        let mut issues = Vec::new();

        for (name, header) in &response.headers {
            if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            let path = format!("header.{name}");
            let values: Vec<&str> = headers
                .get_all(name.as_str())
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if values.is_empty() {
                if header.required {
                    issues.push(ValidationIssue::new(
                        IssueKind::Header,
                        path,
                        "missing required response header",
                    ));
                }
                continue;
            }
            if let Some(schema) = &header.schema {
                let value = coerce(&values, schema, &validator);
                issues.extend(
                    validator
                        .validate(schema, &value, &path)
                        .into_iter()
                        .map(|v| ValidationIssue::new(IssueKind::Header, v.path, v.message)),
                );
            }
        }

        if !response.content.is_empty() && *op.method != Method::HEAD {
            match content_type(headers) {
                None if body.is_empty() => {}
                None => issues.push(ValidationIssue::new(
                    IssueKind::ContentType,
                    "response body",
                    "missing Content-Type header",
                )),
                Some(ct) => match negotiate(&response.content, ct) {
                    None => issues.push(ValidationIssue::new(
                        IssueKind::ContentType,
                        "response body",
                        format!("response content type {ct:?} is not declared"),
                    )),
                    Some((_, media)) => {
                        check_body(&validator, "response body", ct, body, media, &mut issues);
                    }
                },
            }
        }

        if !issues.is_empty() {
            debug!(
                method = %op.method,
                template = op.template,
                status = status.as_u16(),
                issues = issues.len(),
                "response failed validation"
            );
        }
        ValidationFailure::from_issues(issues)
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

fn group_pairs(pairs: Vec<(String, String)>) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in pairs {
        grouped.entry(name).or_default().push(value);
    }
    grouped
}

fn lookup<'a>(grouped: &'a HashMap<String, Vec<String>>, name: &str) -> Vec<&'a str> {
    grouped
        .get(name)
        .map(|values| values.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn check_body(
    validator: &SchemaValidator<'_>,
    location: &str,
    content_type: &str,
    body: &[u8],
    media: &MediaType,
    issues: &mut Vec<ValidationIssue>,
) {
    match decode(content_type, body, media.schema.as_ref(), validator) {
        Ok(Decoded::Value(value)) => {
            if let Some(schema) = &media.schema {
                issues.extend(
                    validator
                        .validate(schema, &value, location)
                        .into_iter()
                        .map(|v| ValidationIssue::new(IssueKind::Body, v.path, v.message)),
                );
            }
        }
        Ok(Decoded::Opaque) => {}
        Err(DecodeError::Unsupported(media_type)) => issues.push(ValidationIssue::new(
            IssueKind::UnsupportedMediaType,
            location,
            format!("unsupported media type {media_type}"),
        )),
        Err(DecodeError::Malformed(reason)) => {
            issues.push(ValidationIssue::new(IssueKind::Body, location, reason));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETS: &str = r#"
openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
paths:
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema:
          type: integer
          minimum: 1
    get:
      parameters:
        - name: fields
          in: query
          schema:
            type: array
            items:
              type: string
        - name: X-Tenant
          in: header
          required: true
          schema:
            type: string
      responses:
        '200':
          description: a pet
          headers:
            X-Rate-Limit:
              required: true
              schema:
                type: integer
          content:
            application/json:
              schema:
                type: object
                required: [name]
                properties:
                  name:
                    type: string
        '404':
          description: not found
  /pets:
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name:
                  type: string
      responses:
        '201':
          description: created
"#;

    fn pets() -> Specification {
        Specification::from_slice(PETS.as_bytes()).unwrap()
    }

    fn request(method: Method, uri: &str, body: &'static [u8]) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body))
            .unwrap()
    }

    #[test]
    fn test_valid_get_request() {
        let spec = pets();
        let mut req = request(Method::GET, "/pets/7?fields=name,age", b"");
        req.headers_mut().insert("x-tenant", "acme".parse().unwrap());

        let found = spec.find_operation(req.method(), req.uri().path()).unwrap();
        spec.validate_request(found.operation, &req, &found.path_params)
            .unwrap();
    }

    #[test]
    fn test_parameter_issues_are_collected() {
        let spec = pets();
        let req = request(Method::GET, "/pets/0", b"");

        let found = spec.find_operation(req.method(), req.uri().path()).unwrap();
        let failure = spec
            .validate_request(found.operation, &req, &found.path_params)
            .unwrap_err();
        assert_eq!(failure.issues().len(), 2);
        assert!(failure.issues().iter().all(|i| i.kind == IssueKind::Parameter));
        assert!(failure.to_string().contains("header.X-Tenant"));
    }

    #[test]
    fn test_request_body_rules() {
        let spec = pets();
        let op = spec.operation("/pets", &Method::POST).unwrap();
        let none = HashMap::new();

        let empty = request(Method::POST, "/pets", b"");
        let failure = spec.validate_request(op, &empty, &none).unwrap_err();
        assert!(failure.has_kind(IssueKind::Body));

        let untyped = request(Method::POST, "/pets", br#"{"name":"Rex"}"#);
        let failure = spec.validate_request(op, &untyped, &none).unwrap_err();
        assert!(failure.has_kind(IssueKind::ContentType));

        let mut wrong = request(Method::POST, "/pets", br#"{"name":5}"#);
        wrong
            .headers_mut()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let failure = spec.validate_request(op, &wrong, &none).unwrap_err();
        assert_eq!(failure.issues()[0].path, "body.name");
    }

    #[test]
    fn test_response_validation() {
        let spec = pets();
        let op = spec.operation("/pets/{petId}", &Method::GET).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        headers.insert("x-rate-limit", "100".parse().unwrap());
        spec.validate_response(op, StatusCode::OK, &headers, br#"{"name":"Rex"}"#)
            .unwrap();

        let failure = spec
            .validate_response(op, StatusCode::OK, &headers, br#"{}"#)
            .unwrap_err();
        assert!(failure.has_kind(IssueKind::Body));

        headers.remove("x-rate-limit");
        let failure = spec
            .validate_response(op, StatusCode::OK, &headers, br#"{"name":"Rex"}"#)
            .unwrap_err();
        assert!(failure.has_kind(IssueKind::Header));
    }

    #[test]
    fn test_undocumented_status() {
        let spec = pets();
        let op = spec.operation("/pets/{petId}", &Method::GET).unwrap();
        let failure = spec
            .validate_response(op, StatusCode::CONFLICT, &HeaderMap::new(), b"")
            .unwrap_err();
        assert!(failure.has_kind(IssueKind::Status));
    }

    #[test]
    fn test_response_without_content_ignores_body() {
        let spec = pets();
        let op = spec.operation("/pets/{petId}", &Method::GET).unwrap();
        spec.validate_response(op, StatusCode::NOT_FOUND, &HeaderMap::new(), b"gone")
            .unwrap();
    }
}
