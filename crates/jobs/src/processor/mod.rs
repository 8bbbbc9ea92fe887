//! Job processors: the components that actually analyse a job's code.
//!
//! A processor owns a job from `Pending` to a terminal state. It never
//! returns an error; every failure is written to the job itself.

pub mod basedpyright;
pub mod runner;
pub mod scratch;

#[cfg(test)]
pub(crate) mod testing;

use std::io;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::{RetryPolicy, SharedJob};

pub use basedpyright::BasedPyrightProcessor;
pub use runner::{TokioToolRunner, ToolOutput, ToolRunner};

/// Processor for one job type.
#[async_trait]
pub trait JobProcessor: Send + Sync + 'static {
    /// Run the job to completion, mutating it in place.
    async fn process(&self, job: SharedJob);
}

/// How to invoke an external analysis tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Executable name or path
    pub program: String,
    /// Deadline for a single attempt
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "basedpyright".to_string(),
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ToolConfig {
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

/// Failures while running an analysis tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The process could not be spawned or collected.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// A single attempt exceeded its deadline.
    #[error("Process timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),
    /// The tool wrote to stderr.
    #[error("{tool} error: {stderr}")]
    Reported { tool: &'static str, stderr: String },
    /// The scratch file holding the code could not be written.
    #[error("failed to prepare scratch file: {0}")]
    Artifact(#[source] io::Error),
}

impl ToolError {
    /// Spawn failures and timeouts may succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ToolError::Spawn { .. } | ToolError::Timeout(_))
    }

    /// Text recorded on a job that failed with this error.
    pub fn job_message(&self) -> String {
        match self {
            ToolError::Timeout(_) | ToolError::Reported { .. } => self.to_string(),
            ToolError::Spawn { .. } | ToolError::Artifact(_) => format!("Error: {self}"),
        }
    }
}
