//! Core job types and policies.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quack_core::{
    DiagnosticReport, DomainError, DomainResult, Issue, JobId, JobType, SeverityFilter, TopN,
    filter_diagnostics, source_lines,
};

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, not yet picked up by its processor
    Pending,
    /// Processor is working on it
    Running,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry policy for invoking the analysis tool.
///
/// Exponential backoff: the delay after the n-th failed attempt is
/// `base_delay * 2^(n-1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to wait after `failed_attempts` attempts have failed (1-indexed).
    pub fn delay_for_attempt(&self, failed_attempts: u32) -> Duration {
        match failed_attempts {
            0 => Duration::ZERO,
            n => self.base_delay.saturating_mul(1u32 << (n - 1).min(31)),
        }
    }

    /// Check whether another attempt may follow attempt number `attempt`.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Counts reported alongside the issues of a finished analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Diagnostics reported by the tool before filtering
    pub total_issue_count: usize,
    /// Issues kept after severity filtering and capping
    pub filtered_issue_count: usize,
    pub severity_filter: SeverityFilter,
    pub top_n_limit: TopN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
}

/// Result payload of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub summary: AnalysisSummary,
    pub issues: Vec<Issue>,
}

impl AnalysisResult {
    fn new(total: usize, issues: Vec<Issue>, severity: SeverityFilter, top_n: TopN) -> Self {
        Self {
            status: AnalysisStatus::Success,
            summary: AnalysisSummary {
                total_issue_count: total,
                filtered_issue_count: issues.len(),
                severity_filter: severity,
                top_n_limit: top_n,
            },
            issues,
        }
    }

    /// Result for a tool run that printed nothing.
    pub fn empty(severity: SeverityFilter, top_n: TopN) -> Self {
        Self::new(0, Vec::new(), severity, top_n)
    }

    /// Result for tool output that was not a diagnostic report.
    pub fn raw_output(output: &str, severity: SeverityFilter, top_n: TopN) -> Self {
        Self::new(1, vec![Issue::raw_output(output)], severity, top_n)
    }

    /// Filter a parsed report and normalize what survives against `code`.
    pub fn from_report(
        report: DiagnosticReport,
        code: &str,
        severity: SeverityFilter,
        top_n: TopN,
    ) -> Self {
        let total = report.general_diagnostics.len();
        let lines = source_lines(code);
        let issues = filter_diagnostics(report.general_diagnostics, severity, top_n)
            .iter()
            .map(|d| Issue::from_diagnostic(d, &lines))
            .collect();
        Self::new(total, issues, severity, top_n)
    }
}

/// One analysis request and its evolving state.
///
/// State only moves forward: `Pending -> Running -> Completed | Failed`.
/// A terminal job carries exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    code: String,
    pub severity: SeverityFilter,
    pub top_n: TopN,
    status: JobStatus,
    result: Option<AnalysisResult>,
    error: Option<String>,
    pub created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(
        job_type: JobType,
        code: impl Into<String>,
        severity: SeverityFilter,
        top_n: TopN,
    ) -> Self {
        Self {
            id: JobId::new(),
            job_type,
            code: code.into(),
            severity,
            top_n,
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Seconds between start and completion, once both happened.
    pub fn execution_time(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => {
                Some((end - start).num_microseconds().unwrap_or(0).max(0) as f64 / 1_000_000.0)
            }
            _ => None,
        }
    }

    /// Mark job as running.
    pub fn mark_running(&mut self) -> DomainResult<()> {
        if self.status != JobStatus::Pending {
            return Err(self.transition_error(JobStatus::Running));
        }
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Mark job as completed with its result.
    pub fn mark_completed(&mut self, result: AnalysisResult) -> DomainResult<()> {
        if self.status != JobStatus::Running {
            return Err(self.transition_error(JobStatus::Completed));
        }
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark job as failed with a description of what went wrong.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> DomainResult<()> {
        if self.status != JobStatus::Running {
            return Err(self.transition_error(JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition_error(&self, to: JobStatus) -> DomainError {
        DomainError::invariant(format!(
            "job {} cannot move from {} to {}",
            self.id, self.status, to
        ))
    }
}

/// Job handle shared between the registry and the processor task.
///
/// Locks are only held inside the closures passed to [`SharedJob::read`] and
/// [`SharedJob::update`], never across an `.await`.
#[derive(Debug, Clone)]
pub struct SharedJob(Arc<RwLock<Job>>);

impl SharedJob {
    pub fn new(job: Job) -> Self {
        Self(Arc::new(RwLock::new(job)))
    }

    pub fn read<R>(&self, f: impl FnOnce(&Job) -> R) -> R {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Job) -> R) -> R {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Point-in-time copy of the job.
    pub fn snapshot(&self) -> Job {
        self.read(Job::clone)
    }

    pub fn id(&self) -> JobId {
        self.read(|j| j.id)
    }
}

impl From<Job> for SharedJob {
    fn from(job: Job) -> Self {
        Self::new(job)
    }
}

/// Listing entry for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub execution_time: Option<f64>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            job_type: job.job_type,
            status: job.status,
            created_at: job.created_at,
            execution_time: job.execution_time(),
        }
    }
}
