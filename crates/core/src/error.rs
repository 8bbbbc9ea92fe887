//! Domain error model.

use thiserror::Error;

use crate::job_type::JobType;

/// Result type used across the analysis domain.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// These are the failures a caller can observe directly (bad input, missing
/// wiring, broken invariants). Tool failures during processing never become a
/// `DomainError`; they are recorded on the job instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A job type name did not match any known job type.
    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    /// No processor was registered for an otherwise valid job type.
    #[error("No processor registered for job type: {0}")]
    NoProcessorRegistered(JobType),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn unknown_job_type(name: impl Into<String>) -> Self {
        Self::UnknownJobType(name.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
