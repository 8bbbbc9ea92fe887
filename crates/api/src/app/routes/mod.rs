use axum::{Router, routing::post};

pub mod system;
pub mod tools;

/// Router for the tool operations, mounted under `/tools`.
pub fn router() -> Router {
    Router::new()
        .route("/submit_code", post(tools::submit_code))
        .route("/submit_code_for_linting", post(tools::submit_code_for_linting))
        .route(
            "/submit_code_for_static_analysis",
            post(tools::submit_code_for_static_analysis),
        )
        .route(
            "/submit_code_for_basedpyright",
            post(tools::submit_code_for_basedpyright),
        )
        .route("/get_job_results", post(tools::get_job_results))
        .route("/list_jobs", post(tools::list_jobs))
}
