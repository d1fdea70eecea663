// Time spent in the current level and the derived level-up estimate
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::observation::TimeSeries;

/// Tracks when the monitored character reached its current level.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTracker {
    level_up_start: DateTime<Utc>,
    last_level_up_secs: Option<f64>,
}

impl ProgressTracker {
    pub fn new(level_up_start: DateTime<Utc>, last_level_up_secs: Option<f64>) -> Self {
        Self {
            level_up_start,
            last_level_up_secs,
        }
    }

    /// Start from stored history, or from `now` when there is none.
    pub fn from_series(series: &TimeSeries, now: DateTime<Utc>) -> Self {
        let start = series.current_level_since().unwrap_or(now);
        Self::new(start, super::statistics::last_level_duration(series))
    }

    pub fn level_up_start(&self) -> DateTime<Utc> {
        self.level_up_start
    }

    pub fn last_level_up_secs(&self) -> Option<f64> {
        self.last_level_up_secs
    }

    pub fn time_in_current_level(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.level_up_start).num_milliseconds().max(0);
        elapsed_ms as f64 / 1000.0
    }

    pub fn record_level_up(&mut self, now: DateTime<Utc>, duration_secs: Option<f64>) {
        self.level_up_start = now;
        if duration_secs.is_some() {
            self.last_level_up_secs = duration_secs;
        }
    }
}

/// Progress toward the next level, measured against the typical level time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub elapsed_secs: f64,
    pub percent: f64,
    pub remaining_secs: f64,
    /// Elapsed time has reached the typical level time.
    pub overdue: bool,
}

impl LevelProgress {
    pub fn estimate(elapsed_secs: f64, average_level_time_secs: Option<f64>) -> Self {
        let Some(average) = average_level_time_secs.filter(|a| *a > 0.0) else {
            return Self::default();
        };

        let percent = (elapsed_secs / average * 100.0).min(100.0);
        let percent = if percent.is_nan() { 0.0 } else { percent };

        Self {
            elapsed_secs,
            percent,
            remaining_secs: (average - elapsed_secs).max(0.0),
            overdue: percent >= 100.0,
        }
    }
}

/// Render seconds as `HH:MM:SS`, rounding to the nearest second.
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() { secs.max(0.0).round() as u64 } else { 0 };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Elapsed time for display, wrapping back to zero past `ceiling_secs`.
/// A zero ceiling disables wrapping.
pub fn display_elapsed(elapsed_secs: f64, ceiling_secs: u64) -> f64 {
    if ceiling_secs == 0 || elapsed_secs < 0.0 {
        return elapsed_secs.max(0.0);
    }
    elapsed_secs % ceiling_secs as f64
}
