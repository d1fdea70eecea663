// Application state for HTTP handlers
use crate::application::monitor_service::MonitorService;

#[derive(Clone)]
pub struct AppState {
    pub monitor_service: MonitorService,
}
