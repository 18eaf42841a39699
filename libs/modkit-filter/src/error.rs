//! Binding and compilation errors.
//!
//! [`BindError`] is a request-level failure and maps to HTTP 422.
//! [`CompileError`] means a filter type and the record type it targets disagree;
//! run [`crate::verify`] at start-up to surface it before any request arrives.

use http::StatusCode;
use thiserror::Error;

use crate::coerce::CoercionError;
use crate::kind::FieldKind;
use crate::op::FilterOperationKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("invalid value for filter '{field}': {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },

    #[error("operation '{op}' is not supported on field '{field}' of type {kind}")]
    UnsupportedOperationForType {
        field: String,
        op: FilterOperationKind,
        kind: FieldKind,
    },

    #[error("filter limit exceeded: {0}")]
    LimitExceeded(String),
}

impl BindError {
    /// HTTP status for this error. Every bind failure is a client error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            BindError::Coercion { .. } => "filter_errors.invalid_value.v1",
            BindError::UnsupportedOperationForType { .. } => {
                "filter_errors.unsupported_operation.v1"
            }
            BindError::LimitExceeded(_) => "filter_errors.limit_exceeded.v1",
        }
    }

    /// Dotted path of the offending key, if the error is tied to one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            BindError::Coercion { field, .. }
            | BindError::UnsupportedOperationForType { field, .. } => Some(field.as_str()),
            BindError::LimitExceeded(_) => None,
        }
    }
}

pub type BindResult<T> = Result<T, BindError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("field '{field}': filter expects {expected}, record provides {found}")]
    SchemaMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{field}': stored values do not fit operation '{op}'")]
    UnsupportedOperationKind {
        field: String,
        op: FilterOperationKind,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;
