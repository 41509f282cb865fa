//! Specification error types.

use std::fmt;

use thiserror::Error;

/// Result type for specification operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while turning document bytes into a [`Specification`].
///
/// Each variant corresponds to one loading stage; none of them leave a
/// partially built specification behind.
///
/// [`Specification`]: crate::Specification
#[derive(Debug, Error)]
pub enum SpecError {
    /// The bytes are not a well-formed OpenAPI document.
    #[error("unable to parse specification: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but breaks one or more structural rules.
    #[error("specification is not valid: {}", .problems.join("; "))]
    Invalid {
        /// Every problem that was found, in document order.
        problems: Vec<String>,
    },

    /// The document is valid but the resolved model could not be built.
    #[error("unable to build specification model: {reason}")]
    Model {
        /// Why the model could not be built.
        reason: String,
    },

    /// IO error while reading a document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpecError {
    pub(crate) fn model(reason: impl Into<String>) -> Self {
        Self::Model {
            reason: reason.into(),
        }
    }
}

/// What part of an exchange a [`ValidationIssue`] concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// A path, query, header or cookie parameter.
    Parameter,
    /// A declared response header.
    Header,
    /// A request or response body that failed schema validation or decoding.
    Body,
    /// The `Content-Type` is missing or not declared for the operation.
    ContentType,
    /// The media type is declared but has no decoder.
    UnsupportedMediaType,
    /// The response status is not documented for the operation.
    Status,
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Category of the problem.
    pub kind: IssueKind,
    /// Location of the problem (e.g. `body.items[0]`, `query.page`).
    pub path: String,
    /// Error message.
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A failed request or response validation, carrying every issue found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    /// Turn collected issues into a result; no issues means success.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self { issues })
        }
    }

    /// The issues making up this failure.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Whether the failure is caused only by media types that cannot be decoded.
    ///
    /// A failure that mixes unsupported media types with any other issue is
    /// not considered unsupported.
    pub fn is_unsupported_media_type(&self) -> bool {
        !self.issues.is_empty()
            && self
                .issues
                .iter()
                .all(|issue| issue.kind == IssueKind::UnsupportedMediaType)
    }

    /// Whether any issue has the given kind.
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display_lists_problems() {
        let err = SpecError::Invalid {
            problems: vec!["missing info.title".to_string(), "bad path".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing info.title"));
        assert!(msg.contains("bad path"));
    }

    #[test]
    fn test_parse_error_from_yaml() {
        let err: SpecError = serde_yaml::from_str::<Vec<String>>("{ nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, SpecError::Parse(_)));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_empty_issues_are_success() {
        assert!(ValidationFailure::from_issues(vec![]).is_ok());
    }

    #[test]
    fn test_unsupported_media_type_requires_only_unsupported_issues() {
        let only = ValidationFailure::from_issues(vec![ValidationIssue::new(
            IssueKind::UnsupportedMediaType,
            "body",
            "unsupported media type video/mp4",
        )])
        .unwrap_err();
        assert!(only.is_unsupported_media_type());

        let mixed = ValidationFailure::from_issues(vec![
            ValidationIssue::new(IssueKind::UnsupportedMediaType, "body", "unsupported"),
            ValidationIssue::new(IssueKind::Header, "header.x-id", "missing"),
        ])
        .unwrap_err();
        assert!(!mixed.is_unsupported_media_type());
        assert!(mixed.has_kind(IssueKind::Header));
    }

    #[test]
    fn test_failure_display_joins_issues() {
        let failure = ValidationFailure::from_issues(vec![
            ValidationIssue::new(IssueKind::Body, "body.input", "expected string"),
            ValidationIssue::new(IssueKind::ContentType, "", "missing Content-Type"),
        ])
        .unwrap_err();
        assert_eq!(
            failure.to_string(),
            "body.input: expected string; missing Content-Type"
        );
    }
}
