use serde::Deserialize;

use quack_core::{SeverityFilter, TopN};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitCodeRequest {
    pub job_type: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Body of `submit_code_for_basedpyright`.
///
/// `severity` stays a string so unknown values reach the tool and get its
/// in-band error instead of a rejected body.
#[derive(Debug, Deserialize)]
pub struct BasedPyrightRequest {
    pub code: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

#[derive(Debug, Deserialize)]
pub struct JobResultsRequest {
    pub job_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsRequest {
    #[serde(default)]
    pub job_type: Option<String>,
}

fn default_severity() -> String {
    SeverityFilter::default().to_string()
}

fn default_top_n() -> i64 {
    TopN::UNBOUNDED_SENTINEL
}
