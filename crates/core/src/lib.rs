//! `quack-core`: analysis domain building blocks.
//!
//! Pure types and functions only: identifiers, job types, severity handling,
//! raw tool diagnostics and their normalized issue form. Nothing in here
//! spawns processes or touches the filesystem.

pub mod diagnostics;
pub mod error;
pub mod id;
pub mod issue;
pub mod job_type;
pub mod severity;

pub use diagnostics::{Diagnostic, DiagnosticReport, Position, Range, filter_diagnostics};
pub use error::{DomainError, DomainResult};
pub use id::JobId;
pub use issue::{Issue, source_lines};
pub use job_type::JobType;
pub use severity::{Severity, SeverityFilter, TopN};
