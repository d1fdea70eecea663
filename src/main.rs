// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::monitor_service::MonitorService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::http_level_source::HttpLevelSource;
use crate::infrastructure::json_history_store::JsonHistoryStore;
use crate::infrastructure::toml_settings_store::TomlSettingsStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    delete_history, get_history, get_settings, get_status, health_check, poll_now, put_goal_level,
    put_settings, start_monitoring, stop_monitoring, stream_events,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;

    // Create collaborators (infrastructure layer)
    let level_source = Arc::new(HttpLevelSource::new(&config.source)?);
    let history = Arc::new(JsonHistoryStore::new(config.storage.history_dir.clone()));
    let settings = Arc::new(TomlSettingsStore::open(config.storage.settings_path.clone()).await?);
    tracing::info!("History is stored in {}", history.dir().display());

    // Create services (application layer)
    let monitor_service =
        MonitorService::new(level_source, history, settings, config.monitor.clone());

    if let Some(name) = &config.monitor.character {
        if let Err(e) = monitor_service.start(name).await {
            tracing::error!("Could not start monitoring {}: {}", name, e);
        }
    }

    // Create application state
    let state = Arc::new(AppState {
        monitor_service: monitor_service.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/monitor", post(start_monitoring).delete(stop_monitoring))
        .route("/monitor/poll", post(poll_now))
        .route("/status", get(get_status))
        .route("/events", get(stream_events))
        .route("/history/:name", get(get_history).delete(delete_history))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/settings/goal", put(put_goal_level))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server.bind_addr()?;
    tracing::info!("Starting levelwatch on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            monitor_service.stop().await;
        })
        .await?;

    Ok(())
}
