// Application layer - Monitoring use cases and collaborator interfaces
pub mod history_store;
pub mod level_source;
pub mod monitor_service;
pub mod scheduler;
pub mod session;
pub mod settings_store;

#[cfg(test)]
pub mod testing;
