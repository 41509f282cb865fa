//! The resolved specification model.
//!
//! Loading happens in three stages, each with its own [`SpecError`] variant:
//! parsing the bytes, checking structural rules, and building the resolved
//! model (component references followed, parameters merged).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use http::Method;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::document::{
    Components, OpenApi, Operation, Parameter, ParameterIn, PathItem, RequestBody, Response,
    Schema, Server,
};
use crate::error::{SpecError, SpecResult};
use crate::params::decode_path_segment;
use crate::schema::SchemaValidator;
use crate::template::{match_segment, parse_template, template_params, template_specificity};

const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";
const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// A parsed, validated and resolved OpenAPI document.
///
/// The model is read-only once built and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Specification {
    title: String,
    version: String,
    server_prefixes: Vec<String>,
    paths: IndexMap<String, PathEntry>,
    components: Components,
}

/// All operations declared under one path template.
#[derive(Debug, Clone)]
pub struct PathEntry {
    template: String,
    operations: IndexMap<Method, ResolvedOperation>,
}

impl PathEntry {
    /// The path template (e.g. `/users/{id}`).
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Declared operations with their method, in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&Method, &ResolvedOperation)> {
        self.operations.iter()
    }
}

/// An operation with every reference resolved.
#[derive(Debug, Clone)]
pub struct ResolvedOperation {
    /// Operation ID, if the document declares one.
    pub operation_id: Option<String>,
    /// Whether deprecated.
    pub deprecated: bool,
    /// Path-level and operation-level parameters, merged.
    pub parameters: Vec<Parameter>,
    /// Request body.
    pub request_body: Option<RequestBody>,
    /// Responses by status key.
    pub responses: IndexMap<String, Response>,
}

impl ResolvedOperation {
    /// Documented response keys (`"200"`, `"4XX"`, `"default"`).
    pub fn response_keys(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(String::as_str)
    }

    /// The documented response key a concrete status maps to.
    ///
    /// Exact codes win over `NXX` ranges, which win over `default`.
    pub fn response_key(&self, status: u16) -> Option<&str> {
        resolve_status_key(self.responses.keys().map(String::as_str), status)
    }
}

/// Map a concrete status onto one of the given documented response keys.
///
/// Exact codes win over `NXX` ranges (case-insensitive), which win over
/// `default`.
pub fn resolve_status_key<'a>(
    keys: impl Iterator<Item = &'a str> + Clone,
    status: u16,
) -> Option<&'a str> {
    let exact = status.to_string();
    let range = format!("{}XX", status / 100);

    keys.clone()
        .find(|k| *k == exact)
        .or_else(|| keys.clone().find(|k| k.eq_ignore_ascii_case(&range)))
        .or_else(|| keys.clone().find(|k| *k == "default"))
}

/// A borrowed view of one operation, keyed by its template and method.
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    /// Path template the operation is declared under.
    pub template: &'a str,
    /// HTTP method.
    pub method: &'a Method,
    /// The operation itself.
    pub operation: &'a ResolvedOperation,
}

/// Result of resolving a concrete request to an operation.
#[derive(Debug, Clone)]
pub struct OperationMatch<'a> {
    /// The matched operation.
    pub operation: OperationRef<'a>,
    /// Decoded path parameters.
    pub path_params: HashMap<String, String>,
}

impl Specification {
    /// Parse, validate and build a specification from YAML or JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> SpecResult<Self> {
        let document: OpenApi = serde_yaml::from_slice(bytes)?;
        Self::from_document(document)
    }

    /// Read and load a specification from a file.
    pub fn from_file(path: impl AsRef<Path>) -> SpecResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading specification from file");
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Validate and build a specification from an already parsed document.
    pub fn from_document(document: OpenApi) -> SpecResult<Self> {
        let problems = validate_document(&document);
        if !problems.is_empty() {
            return Err(SpecError::Invalid { problems });
        }
        Self::build(document)
    }

    fn build(document: OpenApi) -> SpecResult<Self> {
        check_schema_refs(&document)?;

        let components = &document.components;
        let mut paths = IndexMap::with_capacity(document.paths.len());
        for (template, item) in &document.paths {
            let operations = item
                .operations()
                .map(|(method, op)| {
                    resolve_operation(item, op, components)
                        .map(|resolved| (method, resolved))
                        .map_err(|reason| {
                            SpecError::model(format!("{template}: {reason}"))
                        })
                })
                .collect::<SpecResult<IndexMap<_, _>>>()?;
            paths.insert(
                template.clone(),
                PathEntry {
                    template: template.clone(),
                    operations,
                },
            );
        }

        let server_prefixes = server_prefixes(&document.servers);

        debug!(
            title = %document.info.title,
            paths = paths.len(),
            operations = paths.values().map(|p| p.operations.len()).sum::<usize>(),
            prefixes = ?server_prefixes,
            "specification model built"
        );

        Ok(Self {
            title: document.info.title,
            version: document.info.version,
            server_prefixes,
            paths,
            components: document.components,
        })
    }

    /// API title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// API version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All path entries, in document order.
    pub fn paths(&self) -> impl Iterator<Item = &PathEntry> {
        self.paths.values()
    }

    /// Path prefixes derived from the document's server URLs, in declaration
    /// order, always ending with the root prefix `""`.
    pub fn server_prefixes(&self) -> &[String] {
        &self.server_prefixes
    }

    /// The document's reusable components.
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// A schema validator bound to this document's components.
    pub fn schema_validator(&self) -> SchemaValidator<'_> {
        SchemaValidator::new(&self.components.schemas)
    }

    /// Look up the operation declared for a template and method.
    pub fn operation(&self, template: &str, method: &Method) -> Option<OperationRef<'_>> {
        let (template, entry) = self.paths.get_key_value(template)?;
        let (method, operation) = entry.operations.get_key_value(method)?;
        Some(OperationRef {
            template,
            method,
            operation,
        })
    }

    /// Resolve a concrete request path to an operation.
    ///
    /// Server prefixes from the document are tried in order, then the root.
    /// A base path configured outside the document is not known here; strip
    /// it before calling. Among templates matching under a prefix, the first
    /// in [`template_specificity`] order wins.
    pub fn find_operation(&self, method: &Method, path: &str) -> Option<OperationMatch<'_>> {
        self.server_prefixes.iter().find_map(|prefix| {
            let rest = strip_prefix(path, prefix)?;
            self.match_under_prefix(method, rest)
        })
    }

    fn match_under_prefix(&self, method: &Method, path: &str) -> Option<OperationMatch<'_>> {
        let segments: Vec<&str> = match path.strip_prefix('/') {
            Some("") => Vec::new(),
            Some(rest) => rest.split('/').collect(),
            None => return None,
        };

        let mut best: Option<OperationMatch<'_>> = None;
        for entry in self.paths.values() {
            let Some((method, operation)) = entry.operations.get_key_value(method) else {
                continue;
            };
            let Ok(parsed) = parse_template(&entry.template) else {
                continue;
            };
            if parsed.len() != segments.len() {
                continue;
            }

            let mut captures = Vec::new();
            let matched = parsed
                .iter()
                .zip(&segments)
                .all(|(parts, segment)| match_segment(parts, segment, &mut captures));
            if !matched {
                continue;
            }

            let Ok(names) = template_params(&entry.template) else {
                continue;
            };
            if best.as_ref().is_some_and(|current| {
                template_specificity(current.operation.template, &entry.template) != Ordering::Greater
            }) {
                continue;
            }
            let path_params = names
                .iter()
                .zip(captures)
                .map(|(name, value)| ((*name).to_string(), decode_path_segment(value)))
                .collect();
            best = Some(OperationMatch {
                operation: OperationRef {
                    template: &entry.template,
                    method,
                    operation,
                },
                path_params,
            });
        }

        best
    }
}

/// Strip a path prefix on a segment boundary.
pub fn strip_prefix<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Path components of server URLs with variables substituted.
fn server_prefixes(servers: &[Server]) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    for server in servers {
        let mut url = server.url.clone();
        for (name, variable) in &server.variables {
            url = url.replace(&format!("{{{name}}}"), &variable.default);
        }
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |idx| &rest[idx..]),
            None => url.as_str(),
        };
        let prefix = path.trim_end_matches('/').to_string();
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    if !prefixes.iter().any(String::is_empty) {
        prefixes.push(String::new());
    }
    prefixes
}

fn validate_document(doc: &OpenApi) -> Vec<String> {
    let mut problems = Vec::new();

    if !doc.openapi.starts_with("3.") {
        problems.push(format!("unsupported openapi version {:?}", doc.openapi));
    }
    if doc.info.title.is_empty() {
        problems.push("info.title is required".to_string());
    }
    if doc.info.version.is_empty() {
        problems.push("info.version is required".to_string());
    }

    for (template, item) in &doc.paths {
        let names = match template_params(template) {
            Ok(names) => names,
            Err(e) => {
                problems.push(e.to_string());
                continue;
            }
        };

        for (method, op) in item.operations() {
            let label = format!("{method} {template}");
            validate_operation(&label, &names, item, op, &doc.components, &mut problems);
        }
    }

    for (name, schema) in &doc.components.schemas {
        check_patterns(&format!("components.schemas.{name}"), schema, &mut problems);
    }

    problems
}

fn validate_operation(
    label: &str,
    template_names: &[&str],
    item: &PathItem,
    op: &Operation,
    components: &Components,
    problems: &mut Vec<String>,
) {
    if op.responses.is_empty() {
        problems.push(format!("{label}: at least one response is required"));
    }
    for key in op.responses.keys() {
        if !is_response_key(key) {
            problems.push(format!("{label}: invalid response key {key:?}"));
        }
    }

    let declared: Vec<&Parameter> = item
        .parameters
        .iter()
        .chain(&op.parameters)
        .filter_map(|p| match &p.reference {
            Some(reference) => component(&components.parameters, PARAMETER_REF_PREFIX, reference),
            None => Some(p),
        })
        .collect();

    for param in &declared {
        if param.name.is_empty() || param.location.is_none() {
            problems.push(format!("{label}: parameters need both name and in"));
            continue;
        }
        if param.location == Some(ParameterIn::Path) {
            if !template_names.contains(&param.name.as_str()) {
                problems.push(format!(
                    "{label}: path parameter {:?} does not appear in the template",
                    param.name
                ));
            } else if !param.required {
                problems.push(format!(
                    "{label}: path parameter {:?} must be required",
                    param.name
                ));
            }
        }
        if let Some(schema) = &param.schema {
            check_patterns(&format!("{label}: parameter {}", param.name), schema, problems);
        }
    }

    for name in template_names {
        let found = declared
            .iter()
            .any(|p| p.location == Some(ParameterIn::Path) && p.name == *name);
        if !found {
            problems.push(format!(
                "{label}: template parameter {name:?} is not declared"
            ));
        }
    }
}

fn check_patterns(label: &str, schema: &Schema, problems: &mut Vec<String>) {
    schema.walk(&mut |s| {
        if let Some(pattern) = &s.pattern {
            if let Err(e) = regex::Regex::new(pattern) {
                problems.push(format!("{label}: invalid pattern {pattern:?}: {e}"));
            }
        }
    });
}

fn is_response_key(key: &str) -> bool {
    if key == "default" {
        return true;
    }
    let bytes = key.as_bytes();
    bytes.len() == 3
        && (b'1'..=b'5').contains(&bytes[0])
        && (bytes[1..].iter().all(u8::is_ascii_digit)
            || bytes[1..].iter().all(|b| b.eq_ignore_ascii_case(&b'x')))
}

fn component<'a, T>(map: &'a IndexMap<String, T>, prefix: &str, reference: &str) -> Option<&'a T> {
    reference.strip_prefix(prefix).and_then(|name| map.get(name))
}

fn resolve_operation(
    item: &PathItem,
    op: &Operation,
    components: &Components,
) -> Result<ResolvedOperation, String> {
    let mut parameters: Vec<Parameter> = Vec::new();
    for param in item.parameters.iter().chain(&op.parameters) {
        let param = match &param.reference {
            Some(reference) => component(&components.parameters, PARAMETER_REF_PREFIX, reference)
                .ok_or_else(|| format!("unresolvable parameter reference {reference}"))?,
            None => param,
        };
        // Operation-level parameters override path-level ones with the same name and location.
        parameters.retain(|p| !(p.name == param.name && p.location == param.location));
        parameters.push(param.clone());
    }

    let request_body = match &op.request_body {
        Some(body) => Some(match &body.reference {
            Some(reference) => {
                component(&components.request_bodies, REQUEST_BODY_REF_PREFIX, reference)
                    .cloned()
                    .ok_or_else(|| format!("unresolvable request body reference {reference}"))?
            }
            None => body.clone(),
        }),
        None => None,
    };

    let mut responses = IndexMap::with_capacity(op.responses.len());
    for (key, response) in &op.responses {
        let response = match &response.reference {
            Some(reference) => component(&components.responses, RESPONSE_REF_PREFIX, reference)
                .cloned()
                .ok_or_else(|| format!("unresolvable response reference {reference}"))?,
            None => response.clone(),
        };
        responses.insert(key.clone(), response);
    }

    Ok(ResolvedOperation {
        operation_id: op.operation_id.clone(),
        deprecated: op.deprecated,
        parameters,
        request_body,
        responses,
    })
}

/// Every schema `$ref` anywhere in the document must resolve.
fn check_schema_refs(doc: &OpenApi) -> SpecResult<()> {
    let validator = SchemaValidator::new(&doc.components.schemas);
    let mut missing: Vec<String> = Vec::new();
    let mut check = |schema: &Schema| {
        if let Some(reference) = &schema.reference {
            if validator.lookup(reference).is_none() && !missing.contains(reference) {
                missing.push(reference.clone());
            }
        }
    };

    let components = &doc.components;
    let media_schemas = |content: &IndexMap<String, crate::document::MediaType>| {
        content
            .values()
            .filter_map(|m| m.schema.as_ref())
            .cloned()
            .collect::<Vec<_>>()
    };

    let mut roots: Vec<Schema> = components.schemas.values().cloned().collect();
    let all_params = components.parameters.values().chain(
        doc.paths
            .values()
            .flat_map(|item| item.parameters.iter().chain(item.operations().flat_map(|(_, op)| op.parameters.iter()))),
    );
    roots.extend(all_params.filter_map(|p| p.schema.clone()));

    let bodies = components
        .request_bodies
        .values()
        .chain(doc.paths.values().flat_map(|item| {
            item.operations().filter_map(|(_, op)| op.request_body.as_ref())
        }));
    for body in bodies {
        roots.extend(media_schemas(&body.content));
    }

    let responses = components.responses.values().chain(
        doc.paths
            .values()
            .flat_map(|item| item.operations().flat_map(|(_, op)| op.responses.values())),
    );
    for response in responses {
        roots.extend(media_schemas(&response.content));
        roots.extend(response.headers.values().filter_map(|h| h.schema.clone()));
    }

    for root in &roots {
        root.walk(&mut check);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SpecError::model(format!(
            "unresolvable schema reference(s): {}",
            missing.join(", ")
        )))
    }
}
