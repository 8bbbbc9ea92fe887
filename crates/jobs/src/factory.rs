//! Job construction and processor lookup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use quack_core::{DomainError, DomainResult, JobType, SeverityFilter, TopN};

use crate::processor::JobProcessor;
use crate::types::Job;

/// Processors keyed by the job type they handle.
///
/// Built once at startup and shared by the factory and the manager.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: RwLock<HashMap<JobType, Arc<dyn JobProcessor>>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a processor, replacing any previous one for the type.
    pub fn register(&self, job_type: JobType, processor: Arc<dyn JobProcessor>) {
        self.processors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_type, processor);
    }

    pub fn get(&self, job_type: JobType) -> DomainResult<Arc<dyn JobProcessor>> {
        self.processors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_type)
            .cloned()
            .ok_or(DomainError::NoProcessorRegistered(job_type))
    }

    pub fn registered_types(&self) -> Vec<JobType> {
        let mut types: Vec<_> = self
            .processors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("job_types", &self.registered_types())
            .finish()
    }
}

/// Creates jobs and resolves the processor responsible for them.
#[derive(Debug, Clone)]
pub struct JobFactory {
    registry: Arc<ProcessorRegistry>,
}

impl JobFactory {
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    /// Create a pending job of the given type.
    ///
    /// Job types that do not filter their results drop `severity` and `top_n`
    /// in favour of "all" and unbounded.
    pub fn create(
        &self,
        job_type: JobType,
        code: impl Into<String>,
        severity: SeverityFilter,
        top_n: TopN,
    ) -> Job {
        if job_type.uses_filtering() {
            Job::new(job_type, code, severity, top_n)
        } else {
            Job::new(job_type, code, SeverityFilter::All, TopN::unbounded())
        }
    }

    /// Like [`JobFactory::create`], for a job type given by name.
    pub fn create_named(
        &self,
        job_type: &str,
        code: impl Into<String>,
        severity: SeverityFilter,
        top_n: TopN,
    ) -> DomainResult<Job> {
        let job_type: JobType = job_type.parse()?;
        Ok(self.create(job_type, code, severity, top_n))
    }

    pub fn register_processor(&self, job_type: JobType, processor: Arc<dyn JobProcessor>) {
        self.registry.register(job_type, processor);
    }

    pub fn get_processor(&self, job_type: JobType) -> DomainResult<Arc<dyn JobProcessor>> {
        self.registry.get(job_type)
    }
}
