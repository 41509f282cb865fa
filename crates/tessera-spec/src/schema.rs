//! JSON Schema validation for OpenAPI schema objects.
//!
//! [`SchemaValidator`] checks a decoded `serde_json::Value` against a
//! [`Schema`], resolving `#/components/schemas/...` references against the
//! document's components. All violations are collected rather than stopping
//! at the first one.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::document::{AdditionalProperties, ExclusiveBound, Schema, SchemaType};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const MAX_DEPTH: usize = 64;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Location of the offending value (e.g. `body.items[2].name`).
    pub path: String,
    /// What was wrong.
    pub message: String,
}

/// Validates values against schemas of one document.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    schemas: &'a IndexMap<String, Schema>,
}

impl<'a> SchemaValidator<'a> {
    /// Create a validator resolving references against `schemas`.
    pub fn new(schemas: &'a IndexMap<String, Schema>) -> Self {
        Self { schemas }
    }

    /// Follow `$ref` links until a concrete schema is reached.
    ///
    /// Returns `None` for references outside `#/components/schemas/`, missing
    /// targets, and reference cycles.
    pub fn resolve<'s>(&'s self, schema: &'s Schema) -> Option<&'s Schema> {
        let mut current = schema;
        for _ in 0..MAX_DEPTH {
            match &current.reference {
                None => return Some(current),
                Some(reference) => current = self.lookup(reference)?,
            }
        }
        None
    }

    /// Look up a single `#/components/schemas/<name>` reference.
    pub fn lookup(&self, reference: &str) -> Option<&'a Schema> {
        let name = reference.strip_prefix(SCHEMA_REF_PREFIX)?;
        let name = name.replace("~1", "/").replace("~0", "~");
        self.schemas.get(&name)
    }

    /// Validate `value` against `schema`, reporting violations under `path`.
    pub fn validate(&self, schema: &Schema, value: &Value, path: &str) -> Vec<SchemaViolation> {
        let mut out = Vec::new();
        self.check(schema, value, path, 0, &mut out);
        out
    }

    /// Whether `value` satisfies `schema`.
    pub fn is_valid(&self, schema: &Schema, value: &Value) -> bool {
        self.validate(schema, value, "").is_empty()
    }

    fn check(
        &self,
        schema: &Schema,
        value: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        let mut fail = |message: String| {
            out.push(SchemaViolation {
                path: path.to_string(),
                message,
            });
        };

        if depth > MAX_DEPTH {
            fail("schema nesting too deep".to_string());
            return;
        }

        let Some(schema) = self.resolve(schema) else {
            fail(format!(
                "unresolvable schema reference {}",
                schema.reference.as_deref().unwrap_or_default()
            ));
            return;
        };

        if value.is_null() && allows_null(schema) {
            return;
        }

        if let Some(types) = &schema.schema_type {
            let allowed = types.as_slice();
            if !allowed.iter().any(|t| matches_type(*t, value)) {
                let names: Vec<_> = allowed.iter().map(|t| t.as_str()).collect();
                fail(format!(
                    "expected {}, got {}",
                    names.join(" or "),
                    type_name(value)
                ));
                return;
            }
        }

        if let Some(values) = &schema.enum_values {
            if !values.contains(value) {
                fail(format!("value {value} is not one of the allowed values"));
            }
        }

        if let Some(expected) = &schema.const_value {
            if expected != value {
                fail(format!("expected constant {expected}, got {value}"));
            }
        }

        match value {
            Value::String(s) => self.check_string(schema, s, &mut fail),
            Value::Number(_) => {
                if let Some(n) = value.as_f64() {
                    check_number(schema, n, &mut fail);
                }
            }
            _ => {}
        }
        drop(fail);

        match value {
            Value::Array(items) => self.check_array(schema, items, path, depth, out),
            Value::Object(map) => self.check_object(schema, map, path, depth, out),
            _ => {}
        }

        self.check_composition(schema, value, path, depth, out);
    }

    fn check_string(&self, schema: &Schema, s: &str, fail: &mut impl FnMut(String)) {
        let len = s.chars().count() as u64;
        if let Some(min) = schema.min_length {
            if len < min {
                fail(format!("string shorter than minLength {min}"));
            }
        }
        if let Some(max) = schema.max_length {
            if len > max {
                fail(format!("string longer than maxLength {max}"));
            }
        }
        if let Some(pattern) = &schema.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => fail(format!("string does not match pattern {pattern}")),
                Ok(_) => {}
                Err(e) => fail(format!("invalid pattern {pattern}: {e}")),
            }
        }
        if let Some(format) = &schema.format {
            if !matches_format(format, s) {
                fail(format!("string is not a valid {format}"));
            }
        }
    }

    fn check_array(
        &self,
        schema: &Schema,
        items: &[Value],
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        let len = items.len() as u64;
        if schema.min_items.is_some_and(|min| len < min) {
            out.push(violation(path, format!("array has fewer than {} items", schema.min_items.unwrap_or_default())));
        }
        if schema.max_items.is_some_and(|max| len > max) {
            out.push(violation(path, format!("array has more than {} items", schema.max_items.unwrap_or_default())));
        }
        if schema.unique_items {
            let duplicate = items
                .iter()
                .enumerate()
                .any(|(i, a)| items[i + 1..].iter().any(|b| a == b));
            if duplicate {
                out.push(violation(path, "array items are not unique".to_string()));
            }
        }
        if let Some(item_schema) = &schema.items {
            for (i, item) in items.iter().enumerate() {
                self.check(item_schema, item, &format!("{path}[{i}]"), depth + 1, out);
            }
        }
    }

    fn check_object(
        &self,
        schema: &Schema,
        map: &serde_json::Map<String, Value>,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        for name in &schema.required {
            if !map.contains_key(name) {
                out.push(violation(path, format!("missing required property '{name}'")));
            }
        }

        let len = map.len() as u64;
        if schema.min_properties.is_some_and(|min| len < min) {
            out.push(violation(path, "object has too few properties".to_string()));
        }
        if schema.max_properties.is_some_and(|max| len > max) {
            out.push(violation(path, "object has too many properties".to_string()));
        }

        for (name, value) in map {
            let child = join_path(path, name);
            if let Some(prop) = schema.properties.get(name) {
                self.check(prop, value, &child, depth + 1, out);
                continue;
            }
            match &schema.additional_properties {
                Some(AdditionalProperties::Allowed(false)) => {
                    out.push(violation(&child, "additional property is not allowed".to_string()));
                }
                Some(AdditionalProperties::Schema(extra)) => {
                    self.check(extra, value, &child, depth + 1, out);
                }
                Some(AdditionalProperties::Allowed(true)) | None => {}
            }
        }
    }

    fn check_composition(
        &self,
        schema: &Schema,
        value: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        for sub in &schema.all_of {
            self.check(sub, value, path, depth + 1, out);
        }

        if !schema.any_of.is_empty() {
            let matched = schema.any_of.iter().any(|sub| self.passes(sub, value, depth));
            if !matched {
                out.push(violation(path, "value does not match any schema in anyOf".to_string()));
            }
        }

        if !schema.one_of.is_empty() {
            let matched = schema
                .one_of
                .iter()
                .filter(|sub| self.passes(sub, value, depth))
                .count();
            if matched != 1 {
                out.push(violation(
                    path,
                    format!("value matches {matched} schemas in oneOf, expected exactly 1"),
                ));
            }
        }

        if let Some(not) = &schema.not {
            if self.passes(not, value, depth) {
                out.push(violation(path, "value must not match the schema in not".to_string()));
            }
        }
    }

    fn passes(&self, schema: &Schema, value: &Value, depth: usize) -> bool {
        let mut scratch = Vec::new();
        self.check(schema, value, "", depth + 1, &mut scratch);
        scratch.is_empty()
    }
}

fn check_number(schema: &Schema, n: f64, fail: &mut impl FnMut(String)) {
    let exclusive_flag = |bound: Option<ExclusiveBound>| matches!(bound, Some(ExclusiveBound::Flag(true)));

    if let Some(min) = schema.minimum {
        if exclusive_flag(schema.exclusive_minimum) {
            if n <= min {
                fail(format!("value must be greater than {min}"));
            }
        } else if n < min {
            fail(format!("value must be at least {min}"));
        }
    }
    if let Some(max) = schema.maximum {
        if exclusive_flag(schema.exclusive_maximum) {
            if n >= max {
                fail(format!("value must be less than {max}"));
            }
        } else if n > max {
            fail(format!("value must be at most {max}"));
        }
    }
    if let Some(ExclusiveBound::Bound(min)) = schema.exclusive_minimum {
        if n <= min {
            fail(format!("value must be greater than {min}"));
        }
    }
    if let Some(ExclusiveBound::Bound(max)) = schema.exclusive_maximum {
        if n >= max {
            fail(format!("value must be less than {max}"));
        }
    }
    if let Some(divisor) = schema.multiple_of {
        if divisor > 0.0 {
            let quotient = n / divisor;
            if (quotient - quotient.round()).abs() > 1e-9 {
                fail(format!("value must be a multiple of {divisor}"));
            }
        }
    }
    if schema.primary_type() == Some(SchemaType::Integer) {
        let out_of_range = match schema.format.as_deref() {
            Some("int32") => n < f64::from(i32::MIN) || n > f64::from(i32::MAX),
            _ => false,
        };
        if out_of_range {
            fail("value does not fit in int32".to_string());
        }
    }
}

fn allows_null(schema: &Schema) -> bool {
    schema.nullable
        || schema
            .schema_type
            .as_ref()
            .is_some_and(|types| types.as_slice().contains(&SchemaType::Null))
}

fn matches_type(schema_type: SchemaType, value: &Value) -> bool {
    match schema_type {
        SchemaType::String => value.is_string(),
        SchemaType::Number => value.is_number(),
        SchemaType::Integer => is_integer(value),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Array => value.is_array(),
        SchemaType::Object => value.is_object(),
        SchemaType::Null => value.is_null(),
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value
            .as_f64()
            .is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn matches_format(format: &str, s: &str) -> bool {
    match format {
        "uuid" => uuid::Uuid::parse_str(s).is_ok(),
        "date" => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        "date-time" => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
        "email" => s
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.')),
        other => {
            debug!(format = other, "unchecked string format");
            true
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn violation(path: &str, message: String) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        message,
    }
}
