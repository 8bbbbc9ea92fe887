//! In-memory job registry.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::task::JoinHandle;

use quack_core::{JobId, JobType};

use crate::types::{JobStatus, JobSummary, SharedJob};

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
}

/// Counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Counts by job type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub lint: usize,
    pub static_analysis: usize,
    pub basedpyright: usize,
}

/// Job statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_type: TypeCounts,
}

#[derive(Debug)]
struct JobEntry {
    job: SharedJob,
    /// Processing task; kept so cancellation can be added later.
    task: Option<JoinHandle<()>>,
}

/// Process-lifetime registry of jobs.
///
/// Optionally bounded: once more than `max_retained` jobs are stored, the
/// oldest finished jobs are evicted. Pending and running jobs are never
/// evicted, so the bound can be exceeded while many jobs are in flight.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
    max_retained: Option<NonZeroUsize>,
}

impl InMemoryJobStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retained(max_retained: Option<NonZeroUsize>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            max_retained,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new job, evicting old finished jobs if over capacity.
    ///
    /// Returns the ids of evicted jobs.
    pub fn insert(&self, job: SharedJob) -> Result<Vec<JobId>, JobStoreError> {
        let id = job.id();
        let mut jobs = self.write();
        if jobs.contains_key(&id) {
            return Err(JobStoreError::AlreadyExists(id));
        }
        jobs.insert(id, JobEntry { job, task: None });

        let Some(max) = self.max_retained else {
            return Ok(Vec::new());
        };
        let excess = jobs.len().saturating_sub(max.get());
        if excess == 0 {
            return Ok(Vec::new());
        }

        let mut finished: Vec<_> = jobs
            .iter()
            .filter_map(|(id, entry)| {
                entry.job.read(|j| {
                    j.status()
                        .is_terminal()
                        .then(|| (j.completed_at().unwrap_or(j.created_at), *id))
                })
            })
            .collect();
        finished.sort();

        let evicted: Vec<JobId> = finished.into_iter().take(excess).map(|(_, id)| id).collect();
        for id in &evicted {
            jobs.remove(id);
        }
        Ok(evicted)
    }

    /// Remember the task processing a job. No-op if the job is gone.
    pub fn attach_task(&self, id: JobId, task: JoinHandle<()>) {
        if let Some(entry) = self.write().get_mut(&id) {
            entry.task = Some(task);
        }
    }

    /// Whether the processing task of a job has finished running.
    pub fn task_finished(&self, id: JobId) -> Option<bool> {
        self.read()
            .get(&id)
            .and_then(|e| e.task.as_ref().map(JoinHandle::is_finished))
    }

    pub fn get(&self, id: JobId) -> Option<SharedJob> {
        self.read().get(&id).map(|e| e.job.clone())
    }

    /// Summaries in creation order, optionally restricted to one job type.
    pub fn list(&self, job_type: Option<JobType>) -> Vec<JobSummary> {
        let mut summaries: Vec<JobSummary> = self
            .read()
            .values()
            // `JobSummary::from` alone is not general over the borrow's lifetime.
            .map(|e| e.job.read(|j| JobSummary::from(j)))
            .filter(|s| job_type.is_none_or(|t| s.job_type == t))
            .collect();
        summaries.sort_by_key(|s| (s.created_at, s.job_id));
        summaries
    }

    pub fn stats(&self) -> JobStats {
        let jobs = self.read();
        let mut stats = JobStats {
            total: jobs.len(),
            ..Default::default()
        };

        for entry in jobs.values() {
            let (status, job_type) = entry.job.read(|j| (j.status(), j.job_type));
            match status {
                JobStatus::Pending => stats.by_status.pending += 1,
                JobStatus::Running => stats.by_status.running += 1,
                JobStatus::Completed => stats.by_status.completed += 1,
                JobStatus::Failed => stats.by_status.failed += 1,
            }
            match job_type {
                JobType::Lint => stats.by_type.lint += 1,
                JobType::StaticAnalysis => stats.by_type.static_analysis += 1,
                JobType::BasedPyright => stats.by_type.basedpyright += 1,
            }
        }

        stats
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
