//! The verifier: matches, classifies and tracks recorded exchanges.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tessera_spec::params::decode_path_segment;
use tessera_spec::Specification;
use tracing::{debug, info};

use crate::classification::{Classification, ClassifiedError, Fault, VerificationErrors};
use crate::config::VerifierConfig;
use crate::coverage::{CoverageTable, HttpMethod};
use crate::dump::{dump_request, dump_response, DumpKind, DumpRecord};
use crate::error::VerifierResult;
use crate::exchange::Exchange;
use crate::ledger::ErrorLedger;
use crate::route::RouteMatcher;

const INTERNAL_SERVER_ERROR: u16 = 500;
const INTERNAL_SERVER_ERROR_KEY: &str = "500";

/// Reports the errors of a verification session.
///
/// Implemented for any `Fn(&VerificationErrors)` closure.
pub trait Failer {
    /// Report a failed verification.
    fn fail(&self, errors: &VerificationErrors);
}

impl<F> Failer for F
where
    F: Fn(&VerificationErrors),
{
    fn fail(&self, errors: &VerificationErrors) {
        self(errors);
    }
}

/// A [`Failer`] that panics with every joined error, for use in `#[test]`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicFailer;

impl Failer for PanicFailer {
    fn fail(&self, errors: &VerificationErrors) {
        panic!("contract verification failed:\n{errors}");
    }
}

/// Coverage counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSummary {
    /// Documented coordinates being tracked.
    pub total: usize,
    /// Coordinates exercised so far.
    pub checked: usize,
}

impl CoverageSummary {
    /// Coordinates not exercised yet.
    pub fn unchecked(&self) -> usize {
        self.total - self.checked
    }
}

#[derive(Debug)]
struct State {
    coverage: CoverageTable,
    ledger: ErrorLedger,
}

/// Verifies recorded exchanges against a specification and tracks coverage.
///
/// A verifier is `Send + Sync`; share it through an `Arc` between tests
/// running in parallel.
///
/// # Example
///
/// ```ignore
/// use tessera_verifier::{Exchange, PanicFailer, Verifier, VerifierConfig};
///
/// let verifier = Verifier::new(&spec_bytes, VerifierConfig::new().with_request_validation())?;
/// verifier.record(&Exchange::new(request, response));
/// verifier.verify(&PanicFailer);
/// ```
#[derive(Debug)]
pub struct Verifier {
    spec: Arc<Specification>,
    config: VerifierConfig,
    routes: RouteMatcher,
    state: Mutex<State>,
    sequence: AtomicU64,
}

impl Verifier {
    /// Load a specification from bytes and build a verifier for it.
    pub fn new(spec_bytes: &[u8], config: VerifierConfig) -> VerifierResult<Self> {
        let spec = Specification::from_slice(spec_bytes)?;
        Self::from_specification(Arc::new(spec), config)
    }

    /// Build a verifier for an already loaded specification.
    pub fn from_specification(
        spec: Arc<Specification>,
        mut config: VerifierConfig,
    ) -> VerifierResult<Self> {
        config.base_path = config.normalized_base_path();
        let routes = RouteMatcher::from_specification(&spec, config.base_path.as_deref())?;
        let coverage = CoverageTable::load(&spec, config.include_internal_server_errors);

        info!(
            title = spec.title(),
            coordinates = coverage.len(),
            base_path = config.base_path.as_deref().unwrap_or_default(),
            "verifier created"
        );

        Ok(Self {
            spec,
            config,
            routes,
            state: Mutex::new(State {
                coverage,
                ledger: ErrorLedger::new(),
            }),
            sequence: AtomicU64::new(0),
        })
    }

    /// The specification being verified against.
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// The configuration in effect.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Record one exchange.
    ///
    /// Problems are kept for [`current_errors`](Self::current_errors); this
    /// never fails.
    pub fn record(&self, exchange: &Exchange) {
        let mut state = self.state.lock();

        if let Some(logger) = &self.config.request_logger {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            logger.log(&DumpRecord {
                sequence,
                kind: DumpKind::Request,
                text: dump_request(exchange.request()),
            });
            logger.log(&DumpRecord {
                sequence,
                kind: DumpKind::Response,
                text: dump_response(exchange.response()),
            });
        }

        let request = exchange.request();
        let response = exchange.response();
        let method = request.method();
        let path = request.uri().path();
        let status = response.status().as_u16();

        let undocumented = |ledger: &mut ErrorLedger| {
            if status == INTERNAL_SERVER_ERROR && !self.config.include_internal_server_errors {
                debug!(%method, path, status, "ignoring undocumented internal server error");
                return;
            }
            debug!(%method, path, status, "exchange is not part of the specification");
            ledger.push(ClassifiedError::new(
                Classification::NotPartOfSpec,
                Fault::Undocumented {
                    method: method.clone(),
                    path: path.to_string(),
                    status,
                },
            ));
        };

        let Some(route) = self.routes.match_path(path) else {
            undocumented(&mut state.ledger);
            return;
        };

        let operation = self.spec.operation(route.template, method);

        // An excluded 500 must not fall back to a `5XX` or `default` key.
        if !self.config.include_internal_server_errors
            && operation.is_some_and(|op| {
                op.operation.response_key(status) == Some(INTERNAL_SERVER_ERROR_KEY)
            })
        {
            debug!(%method, path, status, "ignoring documented internal server error");
            return;
        }

        let coordinate = HttpMethod::from_method(method).and_then(|tracked| {
            let key = state.coverage.resolve_status(route.template, tracked, status)?;
            Some((tracked, key))
        });
        let (Some((tracked, key)), Some(operation)) = (coordinate, operation) else {
            undocumented(&mut state.ledger);
            return;
        };

        state.coverage.mark_checked(route.template, tracked, &key);

        if self.config.validate_requests {
            let params: HashMap<String, String> = route
                .params
                .iter()
                .map(|(name, value)| (name.clone(), decode_path_segment(value)))
                .collect();
            if let Err(failure) = self.spec.validate_request(operation, request, &params) {
                state.ledger.push(ClassifiedError::new(
                    Classification::RequestInvalid,
                    Fault::RequestInvalid {
                        method: method.clone(),
                        path: path.to_string(),
                        failure,
                    },
                ));
            }
        }

        match self.spec.validate_response(
            operation,
            response.status(),
            response.headers(),
            response.body(),
        ) {
            Ok(()) => {}
            Err(failure)
                if failure.is_unsupported_media_type()
                    && self.config.ignore_unsupported_body_formats =>
            {
                debug!(%method, path, status, "ignoring unsupported response body format");
            }
            Err(failure) => state.ledger.push(ClassifiedError::new(
                Classification::ResponseInvalid,
                Fault::ResponseInvalid {
                    method: method.clone(),
                    path: path.to_string(),
                    status,
                    failure,
                },
            )),
        }

        debug!(
            %method,
            path,
            status,
            template = route.template,
            status_key = %key,
            errors = state.ledger.len(),
            "exchange recorded"
        );
    }

    /// Errors so far, followed by one `NotChecked` error per unexercised
    /// coordinate unless full coverage is disabled.
    pub fn current_errors(&self) -> Vec<ClassifiedError> {
        let state = self.state.lock();
        let coverage = (!self.config.disable_full_coverage).then_some(&state.coverage);
        state.ledger.snapshot(coverage)
    }

    /// [`current_errors`](Self::current_errors) joined into one error, or
    /// `None` when there are none.
    pub fn current_error(&self) -> Option<VerificationErrors> {
        VerificationErrors::join(self.current_errors())
    }

    /// Report the current error, if any, through `failer`.
    pub fn verify(&self, failer: &impl Failer) {
        if let Some(errors) = self.current_error() {
            failer.fail(&errors);
        }
    }

    /// Forget every recorded exchange: clear the ledger and mark every
    /// coordinate unchecked again.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.ledger.clear();
        state.coverage = CoverageTable::load(&self.spec, self.config.include_internal_server_errors);
        info!(coordinates = state.coverage.len(), "verifier reset");
    }

    /// Coverage counters.
    pub fn coverage(&self) -> CoverageSummary {
        let state = self.state.lock();
        CoverageSummary {
            total: state.coverage.len(),
            checked: state.coverage.checked_count(),
        }
    }

    /// A copy of the coverage table.
    pub fn coverage_table(&self) -> CoverageTable {
        self.state.lock().coverage.clone()
    }
}
