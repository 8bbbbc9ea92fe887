use std::sync::Arc;

use anyhow::Context;

use quack_api::{Config, QuackTools, app, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if config::debug_from_env() {
        quack_observability::init_with_default("debug");
    } else {
        quack_observability::init();
    }

    let config = Config::from_env();
    let tools = Arc::new(QuackTools::from_config(&config));
    let app = app::build_app(tools);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
