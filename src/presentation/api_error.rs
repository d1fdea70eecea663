// Mapping of monitor errors onto HTTP responses
use crate::domain::error::{FetchError, MonitorError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
pub struct ApiError(pub MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MonitorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MonitorError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
            MonitorError::Fetch(_) => StatusCode::BAD_GATEWAY,
            MonitorError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
