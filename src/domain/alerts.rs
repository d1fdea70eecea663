//! One-shot alert latches for a monitored character.
//!
//! Goal-level alerts fire whenever the goal level is newly reached. The
//! level-1, offline and slow-level-up alerts are latched: once fired they stay
//! quiet until their clearing condition is observed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::observation::{LevelReading, Observation};
use super::progress::{ProgressTracker, format_clock};
use super::settings::UserSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    GoalLevel,
    LevelOne,
    Offline,
    SlowLevelUp,
}

impl AlertKind {
    /// Goal and offline cues repeat until the user dismisses them.
    pub fn loops_sound(self) -> bool {
        matches!(self, AlertKind::GoalLevel | AlertKind::Offline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundCue {
    pub play: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
    pub level: u32,
    pub sound: SoundCue,
}

/// Per-character latches, persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertState {
    pub level1_acknowledged: bool,
    pub offline_acknowledged: bool,
    pub slow_level_up_acknowledged: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlowThresholdFormula {
    /// Last measured level-up time plus the configured slack.
    #[default]
    Adaptive,
    /// The configured slack alone.
    Fixed,
}

#[derive(Debug, Clone)]
pub struct AlertCoordinator {
    name: String,
    state: AlertState,
    settings: UserSettings,
    max_level: u32,
    formula: SlowThresholdFormula,
}

impl AlertCoordinator {
    pub fn new(
        name: impl Into<String>,
        state: AlertState,
        settings: UserSettings,
        max_level: u32,
        formula: SlowThresholdFormula,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            settings,
            max_level,
            formula,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn update_settings(&mut self, settings: UserSettings) {
        self.settings = settings;
    }

    /// Evaluate the observation-driven alerts, in firing order: goal level,
    /// level 1, offline. `previous` is the last stored entry before `current`.
    pub fn on_observation(
        &mut self,
        previous: Option<&Observation>,
        current: LevelReading,
    ) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        let level_changed = previous.is_none_or(|p| p.level != current.level);

        if previous.is_some_and(|p| current.level > p.level) {
            self.state.slow_level_up_acknowledged = false;
        }

        if level_changed && current.level == self.settings.goal_level {
            events.push(self.event(
                AlertKind::GoalLevel,
                current.level,
                format!("Goal reached: {} is now level {}", self.name, current.level),
            ));
        }

        if current.level == 1 {
            if !self.state.level1_acknowledged {
                self.state.level1_acknowledged = true;
                events.push(self.event(
                    AlertKind::LevelOne,
                    current.level,
                    format!("{} is back at level 1", self.name),
                ));
            }
        } else if current.level > 1 {
            self.state.level1_acknowledged = false;
        }

        if !current.is_online {
            if !self.state.offline_acknowledged {
                self.state.offline_acknowledged = true;
                events.push(self.event(
                    AlertKind::Offline,
                    current.level,
                    format!("{} is offline", self.name),
                ));
            }
        } else {
            self.state.offline_acknowledged = false;
        }

        events
    }

    /// Seconds the character may stay in its current level before the slow
    /// level-up alert fires.
    pub fn slow_threshold_secs(&self, tracker: &ProgressTracker) -> f64 {
        let slack = self.settings.slow_threshold_secs as f64;
        match self.formula {
            SlowThresholdFormula::Adaptive => tracker.last_level_up_secs().unwrap_or(0.0) + slack,
            SlowThresholdFormula::Fixed => slack,
        }
    }

    /// Evaluated on every tick, whether or not the observation changed.
    pub fn check_slow_level_up(
        &mut self,
        tracker: &ProgressTracker,
        now: DateTime<Utc>,
        level: u32,
    ) -> Option<AlertEvent> {
        if self.state.slow_level_up_acknowledged || level >= self.max_level {
            return None;
        }

        let elapsed = tracker.time_in_current_level(now);
        if elapsed <= self.slow_threshold_secs(tracker) {
            return None;
        }

        self.state.slow_level_up_acknowledged = true;
        Some(self.event(
            AlertKind::SlowLevelUp,
            level,
            format!(
                "{} has been at level {} for {}",
                self.name,
                level,
                format_clock(elapsed)
            ),
        ))
    }

    fn event(&self, kind: AlertKind, level: u32, message: String) -> AlertEvent {
        tracing::info!(character = %self.name, ?kind, "{}", message);
        AlertEvent {
            kind,
            message,
            level,
            sound: SoundCue {
                play: self.settings.audible(),
                looping: kind.loops_sound(),
                volume: self.settings.volume,
            },
        }
    }
}
