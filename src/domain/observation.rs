// Observation and per-character time series
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the level source reports for a character at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReading {
    pub level: u32,
    pub is_online: bool,
}

impl LevelReading {
    pub fn new(level: u32, is_online: bool) -> Self {
        Self { level, is_online }
    }
}

/// One stored sample. Immutable once appended to a [`TimeSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub level: u32,
    // Entries written before online tracking existed carry no flag
    #[serde(default = "default_online")]
    pub is_online: bool,
    pub timestamp: DateTime<Utc>,
}

fn default_online() -> bool {
    true
}

impl Observation {
    pub fn new(level: u32, is_online: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            level,
            is_online,
            timestamp,
        }
    }

    pub fn from_reading(reading: LevelReading, timestamp: DateTime<Utc>) -> Self {
        Self::new(reading.level, reading.is_online, timestamp)
    }

    /// Same level and online status, timestamps ignored.
    pub fn same_state(&self, reading: &LevelReading) -> bool {
        self.level == reading.level && self.is_online == reading.is_online
    }
}

/// Chronological observations for a single character.
///
/// Append-only: timestamps never decrease and no two consecutive entries
/// share both level and online status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Observation>", into = "Vec<Observation>")]
pub struct TimeSeries {
    entries: Vec<Observation>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from stored entries, dropping any that would break the
    /// ordering or no-duplicate invariants.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut series = Self::new();
        for observation in observations {
            if !series.push(observation) {
                tracing::debug!(
                    "Dropping stored observation at {} (level {}): out of order or duplicate",
                    observation.timestamp,
                    observation.level
                );
            }
        }
        series
    }

    /// Append `observation` if it differs from the last entry and is not
    /// older than it. Returns whether it was appended.
    pub fn push(&mut self, observation: Observation) -> bool {
        if let Some(last) = self.entries.last() {
            let reading = LevelReading::new(observation.level, observation.is_online);
            if last.same_state(&reading) || observation.timestamp < last.timestamp {
                return false;
            }
        }
        self.entries.push(observation);
        true
    }

    pub fn last(&self) -> Option<&Observation> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the current level was first observed: the earliest entry of the
    /// trailing run that shares the last entry's level.
    pub fn current_level_since(&self) -> Option<DateTime<Utc>> {
        let last = self.entries.last()?;
        self.entries
            .iter()
            .rev()
            .take_while(|o| o.level == last.level)
            .last()
            .map(|o| o.timestamp)
    }
}

impl From<Vec<Observation>> for TimeSeries {
    fn from(observations: Vec<Observation>) -> Self {
        Self::from_observations(observations)
    }
}

impl From<TimeSeries> for Vec<Observation> {
    fn from(series: TimeSeries) -> Self {
        series.entries
    }
}
