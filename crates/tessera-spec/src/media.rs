//! Content negotiation and body decoding.

use indexmap::IndexMap;
use mime::Mime;
use serde_json::{Map, Value};

use crate::document::{MediaType, Schema};
use crate::params::coerce;
use crate::schema::SchemaValidator;

/// A body decoded according to its media type.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A value that can be checked against the media type schema.
    Value(Value),
    /// Raw bytes with no structure to validate (`application/octet-stream`).
    Opaque,
}

/// Why a body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No decoder exists for the media type.
    Unsupported(String),
    /// The body does not parse as the media type claims.
    Malformed(String),
}

/// Find the declared media type entry matching a `Content-Type` value.
///
/// Matching ignores parameters such as `charset` and prefers an exact match,
/// then a `type/*` wildcard, then `*/*`.
pub fn negotiate<'a>(
    content: &'a IndexMap<String, MediaType>,
    content_type: &str,
) -> Option<(&'a str, &'a MediaType)> {
    let actual: Mime = content_type.parse().ok()?;
    let declared: Vec<(&'a str, Mime, &'a MediaType)> = content
        .iter()
        .filter_map(|(key, media)| key.parse::<Mime>().ok().map(|m| (key.as_str(), m, media)))
        .collect();

    let exact = declared
        .iter()
        .find(|(_, m, _)| m.essence_str() == actual.essence_str());
    let partial = || {
        declared
            .iter()
            .find(|(_, m, _)| m.type_() == actual.type_() && m.subtype() == mime::STAR)
    };
    let any = || declared.iter().find(|(_, m, _)| m.type_() == mime::STAR);

    exact
        .or_else(partial)
        .or_else(any)
        .map(|(key, _, media)| (*key, *media))
}

/// Decode a body according to its actual `Content-Type`.
///
/// `schema` is only used for form bodies, whose string fields are coerced to
/// the declared property types.
pub fn decode(
    content_type: &str,
    body: &[u8],
    schema: Option<&Schema>,
    validator: &SchemaValidator<'_>,
) -> Result<Decoded, DecodeError> {
    let mime: Mime = content_type
        .parse()
        .map_err(|_| DecodeError::Malformed(format!("invalid Content-Type {content_type:?}")))?;

    if is_json(&mime) {
        return serde_json::from_slice(body)
            .map(Decoded::Value)
            .map_err(|e| DecodeError::Malformed(format!("invalid JSON body: {e}")));
    }

    if mime.type_() == mime::TEXT {
        return std::str::from_utf8(body)
            .map(|s| Decoded::Value(Value::String(s.to_string())))
            .map_err(|e| DecodeError::Malformed(format!("body is not valid UTF-8: {e}")));
    }

    if mime.essence_str() == mime::APPLICATION_OCTET_STREAM.essence_str() {
        return Ok(Decoded::Opaque);
    }

    if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
        return decode_form(body, schema, validator).map(Decoded::Value);
    }

    Err(DecodeError::Unsupported(mime.essence_str().to_string()))
}

fn is_json(mime: &Mime) -> bool {
    mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)
}

fn decode_form(
    body: &[u8],
    schema: Option<&Schema>,
    validator: &SchemaValidator<'_>,
) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DecodeError::Malformed(format!("form body is not valid UTF-8: {e}")))?;
    let properties = schema.and_then(|s| validator.resolve(s)).map(|s| &s.properties);

    let mut map = Map::new();
    for (name, raw) in crate::params::parse_pairs(text, '&') {
        let value = match properties.and_then(|p| p.get(&name)) {
            Some(prop) => coerce(&[raw.as_str()], prop, validator),
            None => Value::String(raw),
        };
        map.insert(name, value);
    }
    Ok(Value::Object(map))
}
