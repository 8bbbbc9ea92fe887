//! Tool operations exposed to clients.
//!
//! Every operation answers with a JSON object, and failures are reported
//! in-band as `{"status": "error", "message": ...}` rather than as transport
//! errors. Submissions need a Tokio runtime because processing is spawned
//! onto it.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use quack_core::{DomainError, JobId, JobType, SeverityFilter, TopN};
use quack_jobs::{
    BasedPyrightProcessor, InMemoryJobStore, Job, JobFactory, JobManager, JobStatus,
    ProcessorRegistry,
};

use crate::config::Config;

/// The tool surface over a [`JobManager`].
#[derive(Debug, Clone)]
pub struct QuackTools {
    manager: JobManager,
}

impl QuackTools {
    pub fn new(manager: JobManager) -> Self {
        Self { manager }
    }

    /// Wire up the processors and the job store described by `config`.
    ///
    /// Only basedpyright has a processor; lint and static analysis
    /// submissions are answered with an error.
    pub fn from_config(config: &Config) -> Self {
        let registry = ProcessorRegistry::arc();
        registry.register(
            JobType::BasedPyright,
            Arc::new(BasedPyrightProcessor::new(config.tool.clone())),
        );
        info!(
            job_types = ?registry.registered_types(),
            program = %config.tool.program,
            timeout_secs = config.tool.timeout.as_secs(),
            max_attempts = config.tool.retry_policy.max_attempts,
            "registered processors"
        );

        let store = Arc::new(InMemoryJobStore::with_max_retained(config.max_retained_jobs));
        Self::new(JobManager::with_store(JobFactory::new(registry), store))
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    /// Submit code for analysis by job type name.
    pub fn submit_code(&self, job_type: &str, code: &str) -> Value {
        let job_type: JobType = match job_type.parse() {
            Ok(t) => t,
            Err(err) => {
                warn!(job_type, "invalid job type");
                return error(message_of(&err));
            }
        };
        self.submit(job_type, code)
    }

    pub fn submit_code_for_linting(&self, code: &str) -> Value {
        self.submit(JobType::Lint, code)
    }

    pub fn submit_code_for_static_analysis(&self, code: &str) -> Value {
        self.submit(JobType::StaticAnalysis, code)
    }

    /// Submit code for basedpyright with a severity filter and an issue cap.
    ///
    /// `top_n` of `-1` keeps every issue.
    pub fn submit_code_for_basedpyright(&self, code: &str, severity: &str, top_n: i64) -> Value {
        let severity: SeverityFilter = match severity.parse() {
            Ok(s) => s,
            Err(err) => {
                warn!(severity, "invalid severity");
                return error(message_of(&err));
            }
        };
        let limit = match TopN::from_raw(top_n) {
            Ok(limit) => limit,
            Err(err) => {
                warn!(top_n, "invalid top_n");
                return error(message_of(&err));
            }
        };

        match self
            .manager
            .submit(JobType::BasedPyright, code, severity, limit)
        {
            Ok(job) => json!({
                "status": "accepted",
                "job_id": job.id,
                "job_type": job.job_type,
                "severity": severity,
                "top_n": top_n,
                "message": "Code submitted for basedpyright analysis. Use get_job_results to check status.",
            }),
            Err(err) => submission_failed(JobType::BasedPyright, &err),
        }
    }

    /// Current status of a job, with its result or error once finished.
    pub fn get_job_results(&self, job_id: &str) -> Value {
        let Some(job) = job_id
            .parse::<JobId>()
            .ok()
            .and_then(|id| self.manager.get(id))
        else {
            warn!(job_id, "requested unknown job");
            return error(format!("No job found with ID: {job_id}"));
        };

        info!(job_id = %job.id, job_type = %job.job_type, status = %job.status(), "status check");
        job_results(&job)
    }

    /// All jobs in creation order plus registry statistics.
    ///
    /// An empty `job_type` is treated as no filter.
    pub fn list_jobs(&self, job_type: Option<&str>) -> Value {
        let filter = match job_type.filter(|t| !t.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<JobType>() {
                Ok(t) => Some(t),
                Err(_) => return error(format!("Invalid job type: {raw}")),
            },
        };

        json!({
            "jobs": self.manager.list(filter),
            "stats": self.manager.stats(),
        })
    }

    fn submit(&self, job_type: JobType, code: &str) -> Value {
        match self
            .manager
            .submit(job_type, code, SeverityFilter::All, TopN::unbounded())
        {
            Ok(job) => json!({
                "status": "accepted",
                "job_id": job.id,
                "job_type": job.job_type,
                "message": format!(
                    "Code submitted for {job_type}. Use get_job_results to check status."
                ),
            }),
            Err(err) => submission_failed(job_type, &err),
        }
    }
}

fn job_results(job: &Job) -> Value {
    match job.status() {
        JobStatus::Completed => json!({
            "status": JobStatus::Completed,
            "job_type": job.job_type,
            "results": job.result(),
            "execution_time": job.execution_time(),
        }),
        JobStatus::Failed => json!({
            "status": JobStatus::Failed,
            "job_type": job.job_type,
            "error": job.error(),
            "execution_time": job.execution_time(),
        }),
        status @ (JobStatus::Pending | JobStatus::Running) => json!({
            "status": status,
            "job_type": job.job_type,
            "message": format!("Job is {status}. Please check again later."),
        }),
    }
}

fn submission_failed(job_type: JobType, err: &DomainError) -> Value {
    warn!(%job_type, error = %err, "submission rejected");
    error(message_of(err))
}

fn error(message: impl Into<String>) -> Value {
    json!({
        "status": "error",
        "message": message.into(),
    })
}

/// Caller-facing text of a domain error, without the validation prefix.
fn message_of(err: &DomainError) -> String {
    match err {
        DomainError::Validation(msg) => msg.clone(),
        other => other.to_string(),
    }
}
