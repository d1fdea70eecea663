// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod event_stream;
pub mod http_level_source;
pub mod json_history_store;
pub mod toml_settings_store;
