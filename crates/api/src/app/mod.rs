//! HTTP binding of the tool surface (Axum router).
//!
//! - `routes/`: handlers, one `POST /tools/<operation>` per tool
//! - `dto.rs`: request bodies and their defaults
//! - `errors.rs`: JSON error responses for requests that never reach a tool

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use crate::tools::QuackTools;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(tools: Arc<QuackTools>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/tools", routes::router())
        .fallback(routes::system::not_found)
        .layer(Extension(tools))
}
