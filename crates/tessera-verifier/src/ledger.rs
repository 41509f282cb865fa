//! The error ledger of a verification session.

use crate::classification::{ClassifiedError, Classification, Fault};
use crate::coverage::CoverageTable;

/// Append-only list of errors found while recording exchanges.
#[derive(Debug, Clone, Default)]
pub struct ErrorLedger {
    entries: Vec<ClassifiedError>,
}

impl ErrorLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error.
    pub fn push(&mut self, error: ClassifiedError) {
        self.entries.push(error);
    }

    /// Recorded errors, oldest first.
    pub fn entries(&self) -> &[ClassifiedError] {
        &self.entries
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every recorded error.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recorded errors followed by one `NotChecked` error per unchecked
    /// coordinate of `coverage`, when given.
    pub fn snapshot(&self, coverage: Option<&CoverageTable>) -> Vec<ClassifiedError> {
        let mut errors = self.entries.clone();
        if let Some(coverage) = coverage {
            errors.extend(coverage.unchecked().into_iter().map(|coordinate| {
                ClassifiedError::new(
                    Classification::NotChecked,
                    Fault::Uncovered {
                        template: coordinate.template,
                        method: coordinate.method,
                        status_key: coordinate.status_key,
                    },
                )
            }));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::HttpMethod;
    use http::Method;

    #[test]
    fn test_snapshot_appends_unchecked_coordinates() {
        let mut coverage = CoverageTable::default();
        coverage.insert("/ping", HttpMethod::Get, "200");
        coverage.insert("/ping", HttpMethod::Get, "404");
        coverage.mark_checked("/ping", HttpMethod::Get, "200");

        let mut ledger = ErrorLedger::new();
        ledger.push(ClassifiedError::new(
            Classification::NotPartOfSpec,
            Fault::Undocumented {
                method: Method::GET,
                path: "/pong".to_string(),
                status: 200,
            },
        ));

        let errors = ledger.snapshot(Some(&coverage));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].classification(), Classification::NotPartOfSpec);
        assert_eq!(errors[1].classification(), Classification::NotChecked);
        assert_eq!(errors[1].to_string(), "endpoint not checked: GET /ping: 404");

        assert_eq!(ledger.snapshot(None).len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut ledger = ErrorLedger::new();
        ledger.push(ClassifiedError::new(
            Classification::RequestInvalid,
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        ));
        assert_eq!(ledger.len(), 1);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
