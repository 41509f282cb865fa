//! Coverage tracking for documented coordinates.
//!
//! A coordinate is a (path template, method, response key) triple taken from
//! the specification. The key set is fixed when the table is loaded; recording
//! exchanges only flips the checked flag.

use std::collections::BTreeMap;
use std::fmt;

use http::Method;
use tessera_spec::{resolve_status_key, Specification};

const INTERNAL_SERVER_ERROR_KEY: &str = "500";

/// HTTP methods whose operations are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// HEAD
    Head,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Every tracked method.
    pub const ALL: [HttpMethod; 7] = [
        Self::Get,
        Self::Head,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Patch,
        Self::Options,
    ];

    /// The tracked method for an `http::Method`, if it is tracked at all.
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_method() == method)
    }

    /// The corresponding `http::Method`.
    pub fn as_method(self) -> &'static Method {
        match self {
            Self::Get => &Method::GET,
            Self::Head => &Method::HEAD,
            Self::Put => &Method::PUT,
            Self::Post => &Method::POST,
            Self::Delete => &Method::DELETE,
            Self::Patch => &Method::PATCH,
            Self::Options => &Method::OPTIONS,
        }
    }

    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        self.as_method().as_str()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A documented (template, method, response key) triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// Path template.
    pub template: String,
    /// Method.
    pub method: HttpMethod,
    /// Documented response key (`"204"`, `"2XX"`, `"default"`).
    pub status_key: String,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.template, self.status_key)
    }
}

/// Checked flags for every documented coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageTable {
    paths: BTreeMap<String, BTreeMap<HttpMethod, BTreeMap<String, bool>>>,
}

impl CoverageTable {
    /// Build an all-unchecked table from a specification.
    ///
    /// Documented `"500"` responses are only tracked when
    /// `include_internal_server_errors` is set.
    pub fn load(spec: &Specification, include_internal_server_errors: bool) -> Self {
        let mut table = Self::default();
        for entry in spec.paths() {
            for (method, operation) in entry.operations() {
                let Some(method) = HttpMethod::from_method(method) else {
                    continue;
                };
                for key in operation.response_keys() {
                    if key == INTERNAL_SERVER_ERROR_KEY && !include_internal_server_errors {
                        continue;
                    }
                    table.insert(entry.template(), method, key);
                }
            }
        }
        table
    }

    /// Insert an unchecked coordinate.
    pub fn insert(&mut self, template: &str, method: HttpMethod, status_key: &str) {
        self.paths
            .entry(template.to_string())
            .or_default()
            .entry(method)
            .or_default()
            .entry(status_key.to_string())
            .or_insert(false);
    }

    fn responses(&self, template: &str, method: HttpMethod) -> Option<&BTreeMap<String, bool>> {
        self.paths.get(template)?.get(&method)
    }

    /// Whether a coordinate exists and has been checked.
    pub fn is_checked(&self, template: &str, method: HttpMethod, status_key: &str) -> bool {
        self.responses(template, method)
            .and_then(|responses| responses.get(status_key))
            .copied()
            .unwrap_or(false)
    }

    /// Mark a coordinate checked, returning whether it exists.
    ///
    /// Never inserts new coordinates.
    pub fn mark_checked(&mut self, template: &str, method: HttpMethod, status_key: &str) -> bool {
        let flag = self
            .paths
            .get_mut(template)
            .and_then(|methods| methods.get_mut(&method))
            .and_then(|responses| responses.get_mut(status_key));
        match flag {
            Some(checked) => {
                *checked = true;
                true
            }
            None => false,
        }
    }

    /// The documented key a concrete status maps to under a template and
    /// method: the exact code, then its `NXX` range, then `default`.
    pub fn resolve_status(&self, template: &str, method: HttpMethod, status: u16) -> Option<String> {
        let responses = self.responses(template, method)?;
        resolve_status_key(responses.keys().map(String::as_str), status).map(str::to_string)
    }

    /// Whether any method is tracked under the template.
    pub fn has_template(&self, template: &str) -> bool {
        self.paths.contains_key(template)
    }

    /// All coordinates not yet checked.
    pub fn unchecked(&self) -> Vec<Coordinate> {
        self.iter()
            .filter(|(_, checked)| !checked)
            .map(|(coordinate, _)| coordinate)
            .collect()
    }

    /// Iterate over every coordinate with its checked flag.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, bool)> + '_ {
        self.paths.iter().flat_map(|(template, methods)| {
            methods.iter().flat_map(move |(method, responses)| {
                responses.iter().map(move |(key, checked)| {
                    (
                        Coordinate {
                            template: template.clone(),
                            method: *method,
                            status_key: key.clone(),
                        },
                        *checked,
                    )
                })
            })
        })
    }

    /// Number of coordinates.
    pub fn len(&self) -> usize {
        self.paths
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Whether the table has no coordinates.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of checked coordinates.
    pub fn checked_count(&self) -> usize {
        self.paths
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .filter(|checked| **checked)
            .count()
    }
}
