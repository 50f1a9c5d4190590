//! Chatgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod maintenance;
mod middleware;
mod request_context;
mod state;

use std::sync::Arc;
use std::time::Duration;

use chatgate_application::ChatBackend;
use chatgate_core::{AppError, SystemClock};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, build_ollama_backend};
use crate::maintenance::MaintenanceTasks;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let ollama_backend = build_ollama_backend(&config)?;
    if config.ollama.pull_on_start {
        info!(model = ollama_backend.model(), "pulling chat model");
        if let Err(error) = ollama_backend.pull_model().await {
            warn!(error = %error, "chat model pull failed, continuing startup");
        }
    }

    let chat_backend: Arc<dyn ChatBackend> = ollama_backend;
    let app_state = build_app_state(&config, Arc::new(SystemClock), chat_backend)?;
    let maintenance = MaintenanceTasks::start(
        &app_state,
        Duration::from_secs(config.response_cache_ttl_seconds.unsigned_abs()),
        Duration::from_secs(config.abuse_log_sweep_interval_seconds),
    );
    let app = build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "chatgate-api listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    maintenance.shutdown().await;
    info!("chatgate-api stopped");

    served
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
