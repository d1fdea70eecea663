// Per-character monitoring session - synchronous tick processing
use chrono::{DateTime, Utc};

use crate::domain::alerts::{AlertCoordinator, AlertEvent, AlertState};
use crate::domain::events::MonitorSnapshot;
use crate::domain::observation::{LevelReading, Observation, TimeSeries};
use crate::domain::progress::{LevelProgress, ProgressTracker, display_elapsed, format_clock};
use crate::domain::settings::UserSettings;
use crate::domain::statistics::{self, RunningStats};
use crate::infrastructure::config::MonitorConfig;

/// Result of applying one fetched reading.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// The reading differed from the last entry and was appended.
    pub appended: bool,
    /// Alerts in firing order.
    pub alerts: Vec<AlertEvent>,
    /// Latches changed and should be persisted.
    pub alert_state_changed: bool,
}

#[derive(Debug, Clone)]
pub struct MonitorSession {
    name: String,
    generation: u64,
    series: TimeSeries,
    tracker: ProgressTracker,
    alerts: AlertCoordinator,
    stats: RunningStats,
    last_reading: Option<(LevelReading, DateTime<Utc>)>,
    config: MonitorConfig,
}

impl MonitorSession {
    pub fn new(
        name: impl Into<String>,
        generation: u64,
        series: TimeSeries,
        alert_state: AlertState,
        settings: UserSettings,
        config: MonitorConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let tracker = ProgressTracker::from_series(&series, now);
        let stats = RunningStats::compute(&series, config.statistics_window_size);
        let alerts = AlertCoordinator::new(
            name.clone(),
            alert_state,
            settings,
            config.max_level,
            config.slow_threshold_formula,
        );

        Self {
            name,
            generation,
            series,
            tracker,
            alerts,
            stats,
            last_reading: None,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn alert_state(&self) -> AlertState {
        self.alerts.state()
    }

    pub fn update_settings(&mut self, settings: UserSettings) {
        self.alerts.update_settings(settings);
    }

    /// Fold a fetched reading into the session: append on change, refresh
    /// statistics and the progress tracker, then run every alert check.
    pub fn apply(&mut self, reading: LevelReading, now: DateTime<Utc>) -> TickOutcome {
        let before = self.alerts.state();
        let previous = self.series.last().copied();

        let mut appended = false;
        if previous.is_none_or(|p| !p.same_state(&reading)) {
            appended = self.series.push(Observation::from_reading(reading, now));
        }

        if appended {
            self.stats = RunningStats::compute(&self.series, self.config.statistics_window_size);
            if previous.is_some_and(|p| reading.level > p.level) {
                let duration = statistics::last_level_duration(&self.series);
                self.tracker.record_level_up(now, duration);
            } else if previous.is_some_and(|p| reading.level < p.level) {
                // Level dropped (e.g. a reset); the new level starts now
                self.tracker.record_level_up(now, None);
            }
        }

        let mut alerts = self.alerts.on_observation(previous.as_ref(), reading);
        alerts.extend(self.alerts.check_slow_level_up(&self.tracker, now, reading.level));
        self.last_reading = Some((reading, now));

        TickOutcome {
            appended,
            alerts,
            alert_state_changed: self.alerts.state() != before,
        }
    }

    /// Derived state for display, or `None` before anything was observed.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<MonitorSnapshot> {
        let (reading, observed_at) = self.last_reading.or_else(|| {
            self.series
                .last()
                .map(|o| (LevelReading::new(o.level, o.is_online), o.timestamp))
        })?;

        let elapsed = self.tracker.time_in_current_level(now);
        let progress = LevelProgress::estimate(elapsed, self.stats.average_level_time_secs);
        let time_to_level_up = match self.stats.average_level_time_secs {
            Some(_) if progress.overdue => "due now".to_string(),
            Some(_) => format_clock(progress.remaining_secs),
            None => format_clock(0.0),
        };

        Some(MonitorSnapshot {
            name: self.name.clone(),
            level: reading.level,
            is_online: reading.is_online,
            observed_at,
            level_started_at: self.tracker.level_up_start(),
            stats: self.stats,
            chart: statistics::build_chart_buckets(&self.series, self.config.chart_max_items),
            progress,
            time_in_level: format_clock(display_elapsed(elapsed, self.config.display_ceiling_secs)),
            time_to_level_up,
            next_poll_in_secs: self.config.poll_interval_secs,
        })
    }
}
