//! Level-progression statistics derived from a [`TimeSeries`].
//!
//! All durations are seconds as `f64`. A level jump spanning several levels
//! between two observations is fanned out into that many equal single-level
//! durations, so a jump from 2 to 4 over 60s counts as two 30s level-ups.

use serde::Serialize;

use super::observation::TimeSeries;

/// A single synthesized level-up: the level reached and how long it took.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LevelUp {
    level: u32,
    duration_secs: f64,
}

/// One bar of the level-time chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBucket {
    pub level: u32,
    /// Zero means "not yet measurable".
    pub duration_secs: f64,
}

impl ChartBucket {
    pub fn new(level: u32, duration_secs: f64) -> Self {
        Self {
            level,
            duration_secs,
        }
    }
}

/// Typical time per level, computed over the trailing statistics window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningStats {
    /// Outlier-tolerant mean.
    pub average_level_time_secs: Option<f64>,
    /// Plain mean over the same window.
    pub recent_window_average_secs: Option<f64>,
}

impl RunningStats {
    pub fn compute(series: &TimeSeries, window_size: usize) -> Self {
        Self {
            average_level_time_secs: average_level_time(series, window_size),
            recent_window_average_secs: recent_window_average(series, window_size),
        }
    }
}

fn level_ups(series: &TimeSeries) -> Vec<LevelUp> {
    let mut level_ups = Vec::new();

    for pair in series.entries().windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.level <= prev.level {
            continue;
        }

        let level_diff = curr.level - prev.level;
        let elapsed_ms = (curr.timestamp - prev.timestamp).num_milliseconds() as f64;
        let per_level = elapsed_ms / 1000.0 / f64::from(level_diff);

        if !per_level.is_finite() || per_level <= 0.0 {
            tracing::debug!(
                "Skipping level-up {} -> {}: invalid per-level duration {}",
                prev.level,
                curr.level,
                per_level
            );
            continue;
        }

        for step in 1..=level_diff {
            level_ups.push(LevelUp {
                level: prev.level + step,
                duration_secs: per_level,
            });
        }
    }

    level_ups
}

/// Per-level durations in chronological order, one per unit level-up.
pub fn synthesize_level_durations(series: &TimeSeries) -> Vec<f64> {
    level_ups(series).into_iter().map(|l| l.duration_secs).collect()
}

fn trailing_window(series: &TimeSeries, window_size: usize) -> Vec<f64> {
    let durations = synthesize_level_durations(series);
    let start = durations.len().saturating_sub(window_size);
    durations[start..].to_vec()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of the last `window_size` durations after discarding anything longer
/// than twice the raw mean.
///
/// Returns `None` when no valid durations exist. If every duration is an
/// outlier the most recent one is returned as-is.
pub fn average_level_time(series: &TimeSeries, window_size: usize) -> Option<f64> {
    let window = trailing_window(series, window_size);
    let raw_mean = mean(&window)?;

    let filtered: Vec<f64> = window
        .iter()
        .copied()
        .filter(|d| *d <= raw_mean * 2.0)
        .collect();

    if filtered.is_empty() {
        return window.last().copied();
    }

    mean(&filtered)
}

/// Unfiltered mean of the last `window_size` durations.
pub fn recent_window_average(series: &TimeSeries, window_size: usize) -> Option<f64> {
    mean(&trailing_window(series, window_size))
}

/// The most recent `max_items` level-ups for charting.
///
/// A series holding exactly one observation yields a single zero-duration
/// bucket for its level.
pub fn build_chart_buckets(series: &TimeSeries, max_items: usize) -> Vec<ChartBucket> {
    if series.len() == 1 {
        return series
            .last()
            .map(|o| vec![ChartBucket::new(o.level, 0.0)])
            .unwrap_or_default();
    }

    let level_ups = level_ups(series);
    let start = level_ups.len().saturating_sub(max_items);
    level_ups[start..]
        .iter()
        .map(|l| ChartBucket::new(l.level, l.duration_secs))
        .collect()
}

/// Duration of the most recent single level-up, if any was measured.
pub fn last_level_duration(series: &TimeSeries) -> Option<f64> {
    level_ups(series).last().map(|l| l.duration_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::observation::Observation;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn series(points: &[(u32, i64)]) -> TimeSeries {
        TimeSeries::from_observations(
            points
                .iter()
                .map(|(level, secs)| Observation::new(*level, true, t(*secs)))
                .collect(),
        )
    }

    #[test]
    fn test_multi_level_jump_fans_out() {
        let s = series(&[(1, 0), (2, 30), (4, 90)]);
        assert_eq!(synthesize_level_durations(&s), vec![30.0, 30.0, 30.0]);
        assert_eq!(average_level_time(&s, 6), Some(30.0));
    }

    #[test]
    fn test_duration_count_matches_total_level_delta() {
        let s = series(&[(10, 0), (13, 90), (14, 100), (20, 400)]);
        assert_eq!(synthesize_level_durations(&s).len(), 10);
    }

    #[test]
    fn test_non_increasing_pairs_are_skipped() {
        let s = TimeSeries::from_observations(vec![
            Observation::new(5, true, t(0)),
            Observation::new(5, false, t(20)),
            Observation::new(3, false, t(40)),
            Observation::new(4, true, t(100)),
        ]);
        assert_eq!(synthesize_level_durations(&s), vec![60.0]);
    }

    #[test]
    fn test_zero_elapsed_level_up_is_discarded() {
        let s = series(&[(1, 0), (2, 0), (3, 50)]);
        assert_eq!(synthesize_level_durations(&s), vec![50.0]);
    }

    #[test]
    fn test_empty_and_single_entry_series() {
        let empty = TimeSeries::new();
        assert!(synthesize_level_durations(&empty).is_empty());
        assert_eq!(average_level_time(&empty, 12), None);
        assert_eq!(recent_window_average(&empty, 12), None);
        assert!(build_chart_buckets(&empty, 10).is_empty());

        let single = series(&[(7, 0)]);
        assert_eq!(average_level_time(&single, 12), None);
        assert_eq!(build_chart_buckets(&single, 10), vec![ChartBucket::new(7, 0.0)]);
    }

    #[test]
    fn test_outliers_are_rejected() {
        // mean = (10+10+10+100)/4 = 32.5, so 100 > 65 is dropped
        let s = series(&[(1, 0), (2, 10), (3, 20), (4, 30), (5, 130)]);
        assert_eq!(average_level_time(&s, 12), Some(10.0));
        assert_eq!(recent_window_average(&s, 12), Some(32.5));
    }

    #[test]
    fn test_average_stays_within_observed_range() {
        let s = series(&[(1, 0), (2, 40), (3, 60), (4, 130), (5, 150), (6, 400)]);
        let durations = synthesize_level_durations(&s);
        let avg = average_level_time(&s, 12).unwrap();
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(avg >= min && avg <= max);
    }

    #[test]
    fn test_window_uses_most_recent_durations() {
        let s = series(&[(1, 0), (2, 100), (3, 110), (4, 120)]);
        assert_eq!(recent_window_average(&s, 2), Some(10.0));
        assert_eq!(recent_window_average(&s, 12), Some(40.0));
    }

    #[test]
    fn test_chart_buckets_keep_levels_and_limit() {
        let s = series(&[(1, 0), (2, 30), (4, 90), (5, 100)]);
        let buckets = build_chart_buckets(&s, 3);
        assert_eq!(
            buckets,
            vec![
                ChartBucket::new(3, 30.0),
                ChartBucket::new(4, 30.0),
                ChartBucket::new(5, 10.0),
            ]
        );
        assert_eq!(build_chart_buckets(&s, 3), buckets);
    }

    #[test]
    fn test_running_stats_and_last_duration() {
        let s = series(&[(1, 0), (2, 30), (3, 50)]);
        let stats = RunningStats::compute(&s, 12);
        assert_eq!(stats.average_level_time_secs, Some(25.0));
        assert_eq!(stats.recent_window_average_secs, Some(25.0));
        assert_eq!(last_level_duration(&s), Some(20.0));
        assert_eq!(last_level_duration(&series(&[(1, 0)])), None);
    }
}
