// Presentation layer - HTTP API over the monitor service
pub mod api_error;
pub mod app_state;
pub mod handlers;
