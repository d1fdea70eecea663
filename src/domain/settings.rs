// User-adjustable alert and sound settings
use serde::{Deserialize, Serialize};

use super::error::{MonitorError, MonitorResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Level that triggers the goal alert, `1..=max_level`.
    pub goal_level: u32,
    /// Slack added to the slow-level-up threshold.
    pub slow_threshold_secs: i64,
    pub sound_enabled: bool,
    pub muted: bool,
    /// Playback volume in `0.0..=1.0`.
    pub volume: f32,
}

impl UserSettings {
    pub fn with_defaults(max_level: u32, slow_threshold_secs: i64) -> Self {
        Self {
            goal_level: max_level,
            slow_threshold_secs,
            sound_enabled: false,
            muted: false,
            volume: 0.5,
        }
    }

    pub fn validate(&self, max_level: u32) -> MonitorResult<()> {
        validate_goal_level(self.goal_level, max_level)?;
        validate_slow_threshold(self.slow_threshold_secs)?;
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(MonitorError::invalid(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }
        Ok(())
    }

    /// Whether alert cues should be audible at all.
    pub fn audible(&self) -> bool {
        self.sound_enabled && !self.muted
    }
}

pub fn validate_goal_level(level: u32, max_level: u32) -> MonitorResult<()> {
    if level < 1 || level > max_level {
        return Err(MonitorError::invalid(format!(
            "goal level must be between 1 and {max_level}, got {level}"
        )));
    }
    Ok(())
}

pub fn validate_slow_threshold(secs: i64) -> MonitorResult<()> {
    if secs < 0 {
        return Err(MonitorError::invalid(format!(
            "slow level-up threshold must not be negative, got {secs}"
        )));
    }
    Ok(())
}
