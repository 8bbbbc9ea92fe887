//! Job submission and polling.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info};

use quack_core::{DomainError, DomainResult, JobId, JobType, SeverityFilter, TopN};

use crate::factory::JobFactory;
use crate::processor::JobProcessor;
use crate::store::{InMemoryJobStore, JobStats};
use crate::types::{Job, JobStatus, JobSummary, SharedJob};

/// Accepts analysis requests and hands them to processors in the background.
///
/// Processors own every job transition; the manager only steps in to fail
/// a job whose processor panicked.
/// There is no way to cancel a submitted job.
#[derive(Debug, Clone)]
pub struct JobManager {
    factory: JobFactory,
    store: Arc<InMemoryJobStore>,
}

impl JobManager {
    pub fn new(factory: JobFactory) -> Self {
        Self::with_store(factory, Arc::new(InMemoryJobStore::new()))
    }

    pub fn with_store(factory: JobFactory, store: Arc<InMemoryJobStore>) -> Self {
        Self { factory, store }
    }

    pub fn factory(&self) -> &JobFactory {
        &self.factory
    }

    /// Create a job, store it and start processing it on the Tokio runtime.
    ///
    /// Returns right away with a snapshot of the new job (still pending).
    /// Must be called from within a Tokio runtime.
    pub fn submit(
        &self,
        job_type: JobType,
        code: impl Into<String>,
        severity: SeverityFilter,
        top_n: TopN,
    ) -> DomainResult<Job> {
        let processor = self.factory.get_processor(job_type)?;
        let job = self.factory.create(job_type, code, severity, top_n);
        let snapshot = job.clone();
        let shared = SharedJob::new(job);

        let evicted = self
            .store
            .insert(shared.clone())
            .map_err(|e| DomainError::invariant(e.to_string()))?;
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "evicted finished jobs");
        }

        let task = tokio::spawn(run_processor(processor, shared));
        self.store.attach_task(snapshot.id, task);

        info!(
            job_id = %snapshot.id,
            job_type = %snapshot.job_type,
            bytes = snapshot.code().len(),
            severity = %snapshot.severity,
            top_n = snapshot.top_n.to_raw(),
            "submitted job"
        );

        Ok(snapshot)
    }

    /// Current state of a job.
    pub fn get(&self, id: JobId) -> Option<Job> {
        self.store.get(id).map(|job| job.snapshot())
    }

    pub fn list(&self, job_type: Option<JobType>) -> Vec<JobSummary> {
        self.store.list(job_type)
    }

    pub fn stats(&self) -> JobStats {
        self.store.stats()
    }
}

/// Drive a processor, failing the job if the processor panics.
async fn run_processor(processor: Arc<dyn JobProcessor>, job: SharedJob) {
    let outcome = AssertUnwindSafe(processor.process(job.clone()))
        .catch_unwind()
        .await;
    let Err(payload) = outcome else {
        return;
    };

    let message = format!("Error: processor panicked: {}", panic_message(payload.as_ref()));
    let recorded = job.update(|j| {
        if j.status() == JobStatus::Pending {
            j.mark_running()?;
        }
        j.mark_failed(message.clone())
    });
    match recorded {
        Ok(()) => error!(job_id = %job.id(), error = %message, "processor panicked"),
        Err(e) => error!(
            job_id = %job.id(),
            error = %message,
            state_error = %e,
            "processor panicked after finishing the job"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
