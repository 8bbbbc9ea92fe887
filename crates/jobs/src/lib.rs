//! Background analysis jobs: creation, processing and polling.
//!
//! ## Design
//!
//! - Jobs are typed (`lint`, `static_analysis`, `basedpyright`) and move
//!   strictly forward: pending, running, then completed or failed
//! - Processors are looked up through an explicit registry instance
//! - Tool invocations retry spawn failures and timeouts with exponential backoff
//! - Everything lives in memory for the lifetime of the process
//!
//! ## Components
//!
//! - `Job`: one analysis request, its state and its result
//! - `JobFactory` / `ProcessorRegistry`: job construction and processor lookup
//! - `BasedPyrightProcessor`: runs basedpyright and normalizes its diagnostics
//! - `InMemoryJobStore`: registry of jobs and their processing tasks
//! - `JobManager`: submit, get, list, stats

pub mod factory;
pub mod manager;
pub mod processor;
pub mod store;
pub mod types;

pub use factory::{JobFactory, ProcessorRegistry};
pub use manager::JobManager;
pub use processor::{
    BasedPyrightProcessor, JobProcessor, TokioToolRunner, ToolConfig, ToolError, ToolOutput,
    ToolRunner,
};
pub use store::{InMemoryJobStore, JobStats, JobStoreError, StatusCounts, TypeCounts};
pub use types::{
    AnalysisResult, AnalysisStatus, AnalysisSummary, Job, JobStatus, JobSummary,
    RetryPolicy, SharedJob,
};
