// HTTP request handlers
use crate::domain::events::MonitorSnapshot;
use crate::domain::observation::TimeSeries;
use crate::domain::settings::UserSettings;
use crate::infrastructure::event_stream::sse_from_receiver;
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct StartRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct GoalRequest {
    pub level: u32,
}

#[derive(Serialize)]
pub struct StopResponse {
    pub stopped: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Start monitoring a character, replacing any current session
pub async fn start_monitoring(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<Option<MonitorSnapshot>>, ApiError> {
    state.monitor_service.start(&request.name).await?;
    Ok(Json(state.monitor_service.snapshot().await))
}

pub async fn stop_monitoring(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    Json(StopResponse {
        stopped: state.monitor_service.stop().await,
    })
}

/// Poll the active character immediately
pub async fn poll_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<MonitorSnapshot>>, ApiError> {
    state.monitor_service.poll_now().await?;
    Ok(Json(state.monitor_service.snapshot().await))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.monitor_service.snapshot().await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Stream monitor events as server-sent events
pub async fn stream_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse_from_receiver(state.monitor_service.subscribe())
}

pub async fn get_history(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimeSeries>, ApiError> {
    Ok(Json(state.monitor_service.history(&name).await?))
}

pub async fn delete_history(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.monitor_service.clear_history(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.monitor_service.user_settings().await?))
}

pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<UserSettings>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.monitor_service.update_settings(settings).await?))
}

/// Confirm a new goal level
pub async fn put_goal_level(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GoalRequest>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.monitor_service.set_goal_level(request.level).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::monitor_service::MonitorService;
    use crate::application::testing::{
        MemoryHistoryStore, MemorySettingsStore, ScriptedLevelSource,
    };
    use crate::domain::error::MonitorError;
    use crate::domain::observation::LevelReading;
    use crate::infrastructure::config::MonitorConfig;

    fn app_state(script: Vec<LevelReading>) -> Arc<AppState> {
        let source = ScriptedLevelSource::new(script.into_iter().map(Ok).collect());
        let service = MonitorService::new(
            Arc::new(source),
            Arc::new(MemoryHistoryStore::default()),
            Arc::new(MemorySettingsStore::default()),
            MonitorConfig {
                poll_interval_secs: 3600,
                ..MonitorConfig::default()
            },
        );
        Arc::new(AppState {
            monitor_service: service,
        })
    }

    #[tokio::test]
    async fn test_status_is_not_found_when_idle() {
        let state = app_state(vec![]);
        let response = get_status(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_returns_first_snapshot() {
        let state = app_state(vec![LevelReading::new(88, true)]);
        let Json(snapshot) = start_monitoring(
            State(state.clone()),
            Json(StartRequest {
                name: "Rook".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(snapshot.map(|s| s.level), Some(88));

        let Json(stopped) = stop_monitoring(State(state)).await;
        assert_eq!(stopped.stopped.as_deref(), Some("Rook"));
    }

    #[tokio::test]
    async fn test_start_with_blank_name_is_bad_request() {
        let state = app_state(vec![]);
        let err = start_monitoring(
            State(state),
            Json(StartRequest {
                name: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err.0, MonitorError::InvalidInput(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_poll_unknown_character_is_not_found() {
        let state = app_state(vec![]);
        start_monitoring(
            State(state.clone()),
            Json(StartRequest {
                name: "Nobody".to_string(),
            }),
        )
        .await
        .unwrap();

        let err = poll_now(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        stop_monitoring(State(state)).await;
    }

    #[tokio::test]
    async fn test_put_settings_validates() {
        let state = app_state(vec![]);
        let Json(mut settings) = get_settings(State(state.clone())).await.unwrap();
        settings.volume = 2.0;
        let err = put_settings(State(state.clone()), Json(settings.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        settings.volume = 0.8;
        settings.muted = true;
        let Json(saved) = put_settings(State(state), Json(settings)).await.unwrap();
        assert!(saved.muted);
    }

    #[tokio::test]
    async fn test_put_goal_level_range() {
        let state = app_state(vec![]);
        let err = put_goal_level(State(state.clone()), Json(GoalRequest { level: 401 }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(saved) = put_goal_level(State(state), Json(GoalRequest { level: 250 }))
            .await
            .unwrap();
        assert_eq!(saved.goal_level, 250);
    }
}
