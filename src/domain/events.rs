// Events emitted to the presentation layer on every tick
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::alerts::AlertEvent;
use super::progress::LevelProgress;
use super::statistics::{ChartBucket, RunningStats};

/// Derived state of a monitored character after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub name: String,
    pub level: u32,
    pub is_online: bool,
    pub observed_at: DateTime<Utc>,
    /// When the current level was reached.
    pub level_started_at: DateTime<Utc>,
    pub stats: RunningStats,
    pub chart: Vec<ChartBucket>,
    pub progress: LevelProgress,
    /// Time in level, wrapped at the display ceiling, as `HH:MM:SS`.
    pub time_in_level: String,
    pub time_to_level_up: String,
    pub next_poll_in_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Fetch,
    Persistence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MonitorEvent {
    Status(MonitorSnapshot),
    Alert(AlertEvent),
    Error {
        name: String,
        kind: ErrorKind,
        message: String,
    },
    Stopped {
        name: String,
    },
}
