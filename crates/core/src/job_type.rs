//! Kinds of analysis a caller can request.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Job type for routing a job to its processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Lint,
    StaticAnalysis,
    #[serde(rename = "basedpyright")]
    BasedPyright,
}

impl JobType {
    pub const ALL: [JobType; 3] = [JobType::Lint, JobType::StaticAnalysis, JobType::BasedPyright];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Lint => "lint",
            JobType::StaticAnalysis => "static_analysis",
            JobType::BasedPyright => "basedpyright",
        }
    }

    /// Whether jobs of this type honour severity filtering and result caps.
    pub fn uses_filtering(&self) -> bool {
        matches!(self, JobType::BasedPyright)
    }
}

impl core::fmt::Display for JobType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lint" => Ok(JobType::Lint),
            "static_analysis" => Ok(JobType::StaticAnalysis),
            "basedpyright" => Ok(JobType::BasedPyright),
            _ => Err(DomainError::unknown_job_type(s)),
        }
    }
}
