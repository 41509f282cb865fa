//! Tessera Spec - OpenAPI document model and validation
//!
//! This crate turns an OpenAPI 3.x document into a resolved, read-only
//! [`Specification`] and validates concrete HTTP requests and responses
//! against it.
//!
//! # Overview
//!
//! - Parsing YAML or JSON documents into serde types ([`document`])
//! - Structural validation, reporting every problem at once
//! - Resolving `#/components/...` references into a flat model
//! - Resolving a concrete method and path to an operation
//! - Validating parameters, headers and bodies against schemas
//!
//! # Loading stages
//!
//! ```text
//!   bytes ──parse──► OpenApi ──validate──► OpenApi ──build──► Specification
//!           │                   │                     │
//!     SpecError::Parse   SpecError::Invalid     SpecError::Model
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tessera_spec::Specification;
//!
//! let spec = Specification::from_file("openapi.yaml")?;
//!
//! let found = spec.find_operation(request.method(), request.uri().path()).unwrap();
//! spec.validate_request(found.operation, &request, &found.path_params)?;
//! spec.validate_response(found.operation, status, &headers, &body)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod media;
pub mod model;
pub mod params;
pub mod schema;
pub mod template;
mod validation;

// Re-exports for convenience
pub use document::{OpenApi, Operation, Parameter, ParameterIn, Schema, SchemaType};
pub use error::{IssueKind, SpecError, SpecResult, ValidationFailure, ValidationIssue};
pub use model::{
    resolve_status_key, OperationMatch, OperationRef, PathEntry, ResolvedOperation,
    Specification,
};
pub use schema::{SchemaValidator, SchemaViolation};
pub use template::{
    parse_template, template_params, template_specificity, TemplateError, TemplatePart,
};
