//! Path template parsing.
//!
//! A path template such as `/files/{name}.{ext}` is split into `/`-separated
//! segments, each made of literal text and `{placeholder}` parts.

use std::cmp::Ordering;
use std::fmt;

/// One piece of a template segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart<'a> {
    /// Literal text, matched as-is.
    Literal(&'a str),
    /// A named placeholder.
    Param(&'a str),
}

/// Why a path template could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    /// The offending template.
    pub template: String,
    /// Description of the problem.
    pub reason: &'static str,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path template {:?}: {}", self.template, self.reason)
    }
}

impl std::error::Error for TemplateError {}

/// Parse a template into its segments.
///
/// The leading `/` does not produce an empty segment, so `/` parses to no
/// segments and `/users/{id}` to two.
pub fn parse_template(template: &str) -> Result<Vec<Vec<TemplatePart<'_>>>, TemplateError> {
    let fail = |reason| TemplateError {
        template: template.to_string(),
        reason,
    };

    let Some(rest) = template.strip_prefix('/') else {
        return Err(fail("must start with '/'"));
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    rest.split('/')
        .map(|segment| parse_segment(segment).map_err(fail))
        .collect()
}

/// Order templates from most to least specific: fewer placeholders first,
/// then longer templates, then lexically so the order is total.
///
/// Both operation lookup and route matching try templates in this order.
pub fn template_specificity(a: &str, b: &str) -> Ordering {
    let a_params = a.matches('{').count();
    let b_params = b.matches('{').count();

    a_params
        .cmp(&b_params)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.cmp(b))
}

fn parse_segment(segment: &str) -> Result<Vec<TemplatePart<'_>>, &'static str> {
    let mut parts = Vec::new();
    let mut rest = segment;

    while !rest.is_empty() {
        match rest.find(&['{', '}'][..]) {
            None => {
                parts.push(TemplatePart::Literal(rest));
                break;
            }
            Some(idx) if rest.as_bytes()[idx] == b'}' => return Err("unbalanced '}'"),
            Some(idx) => {
                if idx > 0 {
                    parts.push(TemplatePart::Literal(&rest[..idx]));
                }
                let after = &rest[idx + 1..];
                let close = after.find('}').ok_or("unclosed '{'")?;
                let name = &after[..close];
                if name.is_empty() {
                    return Err("empty placeholder name");
                }
                if name.contains('{') {
                    return Err("nested '{'");
                }
                if matches!(parts.last(), Some(TemplatePart::Param(_))) {
                    return Err("adjacent placeholders");
                }
                parts.push(TemplatePart::Param(name));
                rest = &after[close + 1..];
            }
        }
    }

    Ok(parts)
}

/// Placeholder names of a template, in order.
pub fn template_params(template: &str) -> Result<Vec<&str>, TemplateError> {
    Ok(parse_template(template)?
        .into_iter()
        .flatten()
        .filter_map(|part| match part {
            TemplatePart::Param(name) => Some(name),
            TemplatePart::Literal(_) => None,
        })
        .collect())
}

/// Match one concrete path segment against parsed template parts.
///
/// A placeholder captures the shortest non-empty run that lets the next
/// literal match; a trailing placeholder captures the remainder.
pub(crate) fn match_segment<'p>(
    parts: &[TemplatePart<'_>],
    segment: &'p str,
    captures: &mut Vec<&'p str>,
) -> bool {
    let mut rest = segment;
    let mut iter = parts.iter().peekable();

    while let Some(part) = iter.next() {
        match part {
            TemplatePart::Literal(lit) => match rest.strip_prefix(*lit) {
                Some(r) => rest = r,
                None => return false,
            },
            TemplatePart::Param(_) => match iter.peek() {
                None => {
                    if rest.is_empty() {
                        return false;
                    }
                    captures.push(rest);
                    rest = "";
                }
                Some(TemplatePart::Literal(lit)) => {
                    let Some(pos) = rest.get(1..).and_then(|r| r.find(*lit)).map(|p| p + 1)
                    else {
                        return false;
                    };
                    captures.push(&rest[..pos]);
                    rest = &rest[pos..];
                }
                Some(TemplatePart::Param(_)) => return false,
            },
        }
    }

    rest.is_empty()
}
