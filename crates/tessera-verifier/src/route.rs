//! Route matching from request paths to path templates.
//!
//! Each documented template is compiled into an anchored regular expression.
//! Matching is independent of the method; the coverage table decides whether
//! a method and status are documented under the matched template.

use std::collections::HashMap;

use regex::Regex;
use tessera_spec::model::strip_prefix;
use tessera_spec::{parse_template, template_specificity, Specification, TemplatePart};
use tracing::debug;

use crate::error::{VerifierError, VerifierResult};

/// A successful route match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matched template.
    pub template: &'a str,
    /// The prefix that was stripped before matching.
    pub prefix: &'a str,
    /// Captured path parameters, still percent-encoded.
    pub params: HashMap<String, String>,
}

/// Matches concrete request paths against documented templates.
#[derive(Debug)]
pub struct RouteMatcher {
    /// Routes sorted by specificity.
    routes: Vec<CompiledRoute>,
    /// Prefixes tried in order.
    prefixes: Vec<String>,
}

/// A compiled route.
#[derive(Debug)]
struct CompiledRoute {
    /// Original path template.
    template: String,
    /// Regex for matching paths.
    pattern: Regex,
    /// Parameter names in order.
    param_names: Vec<String>,
}

impl RouteMatcher {
    /// Compile routes for every template in a specification.
    ///
    /// With a base path the base path is the only prefix; otherwise the
    /// document's server paths are tried, followed by the root.
    pub fn from_specification(spec: &Specification, base_path: Option<&str>) -> VerifierResult<Self> {
        let prefixes = match base_path {
            Some(base) => vec![base.trim_end_matches('/').to_string()],
            None => spec.server_prefixes().to_vec(),
        };
        Self::new(spec.paths().map(|entry| entry.template()), prefixes)
    }

    /// Compile the given templates.
    pub fn new<'t>(
        templates: impl IntoIterator<Item = &'t str>,
        prefixes: Vec<String>,
    ) -> VerifierResult<Self> {
        let mut routes = templates
            .into_iter()
            .map(Self::compile_route)
            .collect::<VerifierResult<Vec<_>>>()?;

        routes.sort_by(|a, b| template_specificity(&a.template, &b.template));

        debug!(
            routes = routes.len(),
            prefixes = ?prefixes,
            "route matcher initialized"
        );

        Ok(Self { routes, prefixes })
    }

    /// Match an escaped request path.
    ///
    /// The first prefix under which any route matches wins; within a prefix
    /// the most specific route wins.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.prefixes.iter().find_map(|prefix| {
            let rest = strip_prefix(path, prefix)?;
            self.routes.iter().find_map(|route| {
                let captures = route.pattern.captures(rest)?;
                let params = route
                    .param_names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        captures
                            .get(i + 1)
                            .map(|value| (name.clone(), value.as_str().to_string()))
                    })
                    .collect();
                Some(RouteMatch {
                    template: &route.template,
                    prefix,
                    params,
                })
            })
        })
    }

    /// Prefixes tried before matching, in order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Compiled templates in matching order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.template.as_str())
    }

    fn compile_route(template: &str) -> VerifierResult<CompiledRoute> {
        let (pattern, param_names) = Self::compile_path(template)?;
        Ok(CompiledRoute {
            template: template.to_string(),
            pattern,
            param_names,
        })
    }

    fn compile_path(template: &str) -> VerifierResult<(Regex, Vec<String>)> {
        let segments = parse_template(template)
            .map_err(|e| VerifierError::route(template, e.reason))?;

        let mut pattern = String::from("^");
        let mut param_names = Vec::new();

        for parts in &segments {
            pattern.push('/');
            let mut parts = parts.iter().peekable();
            while let Some(part) = parts.next() {
                match part {
                    TemplatePart::Literal(literal) => pattern.push_str(&regex::escape(literal)),
                    TemplatePart::Param(name) => {
                        param_names.push((*name).to_string());
                        // Lazy when followed by a literal in the same segment.
                        if parts.peek().is_some() {
                            pattern.push_str("([^/]+?)");
                        } else {
                            pattern.push_str("([^/]+)");
                        }
                    }
                }
            }
        }

        if segments.is_empty() {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| VerifierError::route(template, e.to_string()))?;
        Ok((regex, param_names))
    }
}
