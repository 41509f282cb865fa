//! Parameter decoding.
//!
//! Parameters arrive as strings; they are coerced to the type their schema
//! declares before schema validation, so `?page=2` validates against
//! `type: integer` and `?page=two` fails it.

use serde_json::{Number, Value};

use crate::document::{Schema, SchemaType};
use crate::schema::SchemaValidator;

/// Split `a=1<sep>b=2` into decoded name/value pairs.
///
/// `+` is treated as a space and percent escapes are decoded; pairs without
/// `=` get an empty value.
pub fn parse_pairs(text: &str, separator: char) -> Vec<(String, String)> {
    text.split(separator)
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

/// Percent-decode a single URL component, keeping the raw text if it is not
/// valid UTF-8 once decoded.
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Percent-decode a path segment. Unlike query components, `+` is kept
/// as a literal plus.
pub fn decode_path_segment(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Coerce raw parameter values into a JSON value shaped by `schema`.
///
/// Array schemas take every value (or a single comma separated value);
/// scalar schemas use the first value. Values that do not parse as the
/// declared type are kept as strings so schema validation reports them.
pub fn coerce(values: &[&str], schema: &Schema, validator: &SchemaValidator<'_>) -> Value {
    let schema = validator.resolve(schema).unwrap_or(schema);

    if schema.primary_type() == Some(SchemaType::Array) {
        let items: Vec<&str> = match values {
            [single] => single.split(',').collect(),
            many => many.to_vec(),
        };
        let item_schema = schema.items.as_deref();
        return Value::Array(
            items
                .into_iter()
                .map(|item| match item_schema {
                    Some(s) => coerce(&[item], s, validator),
                    None => Value::String(item.to_string()),
                })
                .collect(),
        );
    }

    let raw = values.first().copied().unwrap_or_default();
    coerce_scalar(raw, schema.primary_type())
}

fn coerce_scalar(raw: &str, schema_type: Option<SchemaType>) -> Value {
    let parsed = match schema_type {
        Some(SchemaType::Integer) => raw.parse::<i64>().ok().map(Value::from),
        Some(SchemaType::Number) => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Some(SchemaType::Boolean) => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs("id=1&name=Bob%20Smith&flag&q=a+b", '&');
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), "1".to_string()),
                ("name".to_string(), "Bob Smith".to_string()),
                ("flag".to_string(), String::new()),
                ("q".to_string(), "a b".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_path_segment_keeps_plus() {
        assert_eq!(decode_path_segment("a+b"), "a+b");
        assert_eq!(decode_path_segment("Mrs%20Bobaloo"), "Mrs Bobaloo");
        assert_eq!(decode_path_segment("%2B1"), "+1");
        assert_eq!(decode_component("a+b"), "a b");
    }

    #[test]
    fn test_parse_cookie_pairs() {
        let pairs = parse_pairs("session=abc; theme=dark", ';');
        assert_eq!(pairs[1], ("theme".to_string(), "dark".to_string()));
    }

    #[test]
    fn test_coerce_scalars() {
        let schemas = IndexMap::new();
        let validator = SchemaValidator::new(&schemas);
        assert_eq!(
            coerce(&["42"], &Schema::of_type(SchemaType::Integer), &validator),
            json!(42)
        );
        assert_eq!(
            coerce(&["-1.5"], &Schema::of_type(SchemaType::Number), &validator),
            json!(-1.5)
        );
        assert_eq!(
            coerce(&["true"], &Schema::of_type(SchemaType::Boolean), &validator),
            json!(true)
        );
        assert_eq!(
            coerce(&["two"], &Schema::of_type(SchemaType::Integer), &validator),
            json!("two")
        );
    }

    #[test]
    fn test_coerce_arrays() {
        let schemas = IndexMap::new();
        let validator = SchemaValidator::new(&schemas);
        let mut schema = Schema::of_type(SchemaType::Array);
        schema.items = Some(Box::new(Schema::of_type(SchemaType::Integer)));

        assert_eq!(coerce(&["1,2,3"], &schema, &validator), json!([1, 2, 3]));
        assert_eq!(coerce(&["1", "x"], &schema, &validator), json!([1, "x"]));
    }
}
