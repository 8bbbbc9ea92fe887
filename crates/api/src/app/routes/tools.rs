//! Tool handlers. Each one unpacks its body and delegates to [`QuackTools`].

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use crate::app::dto::{
    BasedPyrightRequest, CodeRequest, JobResultsRequest, ListJobsRequest, SubmitCodeRequest,
};
use crate::app::errors;
use crate::tools::QuackTools;

type Body<T> = Result<Json<T>, JsonRejection>;

pub async fn submit_code(
    Extension(tools): Extension<Arc<QuackTools>>,
    body: Body<SubmitCodeRequest>,
) -> Response {
    match body {
        Ok(Json(req)) => Json(tools.submit_code(&req.job_type, &req.code)).into_response(),
        Err(rejection) => errors::rejection_to_response(rejection),
    }
}

pub async fn submit_code_for_linting(
    Extension(tools): Extension<Arc<QuackTools>>,
    body: Body<CodeRequest>,
) -> Response {
    match body {
        Ok(Json(req)) => Json(tools.submit_code_for_linting(&req.code)).into_response(),
        Err(rejection) => errors::rejection_to_response(rejection),
    }
}

pub async fn submit_code_for_static_analysis(
    Extension(tools): Extension<Arc<QuackTools>>,
    body: Body<CodeRequest>,
) -> Response {
    match body {
        Ok(Json(req)) => Json(tools.submit_code_for_static_analysis(&req.code)).into_response(),
        Err(rejection) => errors::rejection_to_response(rejection),
    }
}

pub async fn submit_code_for_basedpyright(
    Extension(tools): Extension<Arc<QuackTools>>,
    body: Body<BasedPyrightRequest>,
) -> Response {
    match body {
        Ok(Json(req)) => {
            Json(tools.submit_code_for_basedpyright(&req.code, &req.severity, req.top_n))
                .into_response()
        }
        Err(rejection) => errors::rejection_to_response(rejection),
    }
}

pub async fn get_job_results(
    Extension(tools): Extension<Arc<QuackTools>>,
    body: Body<JobResultsRequest>,
) -> Response {
    match body {
        Ok(Json(req)) => Json(tools.get_job_results(&req.job_id)).into_response(),
        Err(rejection) => errors::rejection_to_response(rejection),
    }
}

/// The body is optional here; an empty body lists every job.
pub async fn list_jobs(Extension(tools): Extension<Arc<QuackTools>>, body: Bytes) -> Response {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        ListJobsRequest::default()
    } else {
        match Json::<ListJobsRequest>::from_bytes(&body) {
            Ok(Json(req)) => req,
            Err(rejection) => return errors::rejection_to_response(rejection),
        }
    };
    Json(tools.list_jobs(req.job_type.as_deref())).into_response()
}
