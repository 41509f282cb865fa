//! Classified verification errors.
//!
//! Every problem found during a verification session is a [`ClassifiedError`]:
//! an arbitrary cause tagged with one [`Classification`]. Causes can
//! themselves be classified errors or [`VerificationErrors`] collections, and
//! [`has_classification`] and [`find_cause`] look through any depth of both.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use http::Method;
use tessera_spec::ValidationFailure;
use thiserror::Error;

use crate::coverage::HttpMethod;

/// The category of a verification problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// A documented coordinate was never exercised.
    NotChecked,
    /// An exchange does not correspond to any documented coordinate.
    NotPartOfSpec,
    /// A request failed validation.
    RequestInvalid,
    /// A response failed validation.
    ResponseInvalid,
}

impl Classification {
    /// Short, stable description of the classification.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotChecked => "endpoint not checked",
            Self::NotPartOfSpec => "response is not part of spec",
            Self::RequestInvalid => "request invalid",
            Self::ResponseInvalid => "response invalid",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cause paired with exactly one classification.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    classification: Classification,
    cause: Arc<dyn Error + Send + Sync + 'static>,
}

impl ClassifiedError {
    /// Classify a cause.
    pub fn new(classification: Classification, cause: impl Error + Send + Sync + 'static) -> Self {
        Self {
            classification,
            cause: Arc::new(cause),
        }
    }

    /// The classification.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// The underlying cause.
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.cause
    }

    /// Whether this error, or anything it wraps, has the given classification.
    pub fn is(&self, classification: Classification) -> bool {
        has_classification(self, classification)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.classification, self.cause)
    }
}

impl Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.cause)
    }
}

/// Several classified errors joined into one.
///
/// Never empty: sessions without problems produce no value at all.
#[derive(Debug, Clone)]
pub struct VerificationErrors {
    errors: Vec<ClassifiedError>,
}

impl VerificationErrors {
    /// Join errors; `None` when there is nothing to join.
    pub fn join(errors: Vec<ClassifiedError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// The joined errors, in the order they were reported.
    pub fn errors(&self) -> &[ClassifiedError] {
        &self.errors
    }

    /// Number of joined errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; kept for symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the joined errors.
    pub fn iter(&self) -> std::slice::Iter<'_, ClassifiedError> {
        self.errors.iter()
    }

    /// Whether any joined error, at any depth, has the given classification.
    pub fn has_classification(&self, classification: Classification) -> bool {
        has_classification(self, classification)
    }

    /// Number of joined errors with the given top-level classification.
    pub fn count(&self, classification: Classification) -> usize {
        self.errors
            .iter()
            .filter(|e| e.classification == classification)
            .count()
    }
}

impl fmt::Display for VerificationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl Error for VerificationErrors {}

impl IntoIterator for VerificationErrors {
    type Item = ClassifiedError;
    type IntoIter = std::vec::IntoIter<ClassifiedError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a VerificationErrors {
    type Item = &'a ClassifiedError;
    type IntoIter = std::slice::Iter<'a, ClassifiedError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Whether `err` or anything in its source chain carries `classification`.
///
/// Joined collections are searched member by member.
pub fn has_classification(err: &(dyn Error + 'static), classification: Classification) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(classified) = err.downcast_ref::<ClassifiedError>() {
            if classified.classification == classification {
                return true;
            }
        }
        if let Some(joined) = err.downcast_ref::<VerificationErrors>() {
            return joined
                .errors
                .iter()
                .any(|e| has_classification(e, classification));
        }
        current = err.source();
    }
    false
}

/// Find the first error of type `E` in `err`'s source chain.
///
/// Joined collections are searched member by member.
pub fn find_cause<'a, E: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a E> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(found) = err.downcast_ref::<E>() {
            return Some(found);
        }
        if let Some(joined) = err.downcast_ref::<VerificationErrors>() {
            return joined.errors.iter().find_map(|e| find_cause::<E>(e));
        }
        current = err.source();
    }
    None
}

/// What went wrong with a single exchange or coordinate.
#[derive(Debug, Error)]
pub enum Fault {
    /// No documented coordinate matches the exchange.
    #[error("{method} {path}: {status}")]
    Undocumented {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Response status.
        status: u16,
    },

    /// The request failed validation.
    #[error("{method} {path}: {failure}")]
    RequestInvalid {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Validation issues.
        #[source]
        failure: ValidationFailure,
    },

    /// The response failed validation.
    #[error("{method} {path}: {status}: {failure}")]
    ResponseInvalid {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Response status.
        status: u16,
        /// Validation issues.
        #[source]
        failure: ValidationFailure,
    },

    /// A documented coordinate was never exercised.
    #[error("{method} {template}: {status_key}")]
    Uncovered {
        /// Path template.
        template: String,
        /// Method.
        method: HttpMethod,
        /// Documented response key.
        status_key: String,
    },
}
