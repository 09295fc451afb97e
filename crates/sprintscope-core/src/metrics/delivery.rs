//! Delivery flow metrics: trend, predictability, cycle time, utilization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{SprintRecord, StoryRecord, StoryStatus, StoryType};
use crate::stats;

/// Slope beyond which a velocity trend counts as moving.
const TREND_SLOPE_THRESHOLD: f64 = 0.5;

/// Direction of velocity over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

/// Least-squares trend of velocity against sprint number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityTrend {
    pub direction: TrendDirection,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit velocity against sprint number.
pub fn velocity_trend(points: &[(u32, f64)]) -> VelocityTrend {
    let xs: Vec<f64> = points.iter().map(|(n, _)| *n as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    let Some(fit) = stats::linear_fit(&xs, &ys) else {
        return VelocityTrend {
            direction: TrendDirection::InsufficientData,
            slope: 0.0,
            intercept: stats::mean(&ys).unwrap_or(0.0),
            r_squared: 0.0,
        };
    };

    let direction = if fit.slope > TREND_SLOPE_THRESHOLD {
        TrendDirection::Increasing
    } else if fit.slope < -TREND_SLOPE_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    VelocityTrend {
        direction,
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
    }
}

/// Team predictability in [0, 1]: 1 − min(CV, 1). Zero mean scores 0.
pub fn predictability_score(velocities: &[f64]) -> f64 {
    match stats::coefficient_of_variation(velocities) {
        Some(cv) => (1.0 - cv.min(1.0)).max(0.0),
        None => 0.0,
    }
}

/// Cycle-time statistics with 3σ control limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleTimeMetrics {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub upper_control_limit: f64,
    pub lower_control_limit: f64,
    pub outliers: Vec<String>,
    pub outlier_rate: f64,
}

/// Cycle-time metrics over completed stories; `None` when none completed.
pub fn cycle_time_metrics(stories: &[StoryRecord]) -> Option<CycleTimeMetrics> {
    let completed: Vec<&StoryRecord> = stories
        .iter()
        .filter(|s| s.is_completed() && s.cycle_time_days.is_finite() && s.cycle_time_days >= 0.0)
        .collect();
    let times: Vec<f64> = completed.iter().map(|s| s.cycle_time_days).collect();

    let mean = stats::mean(&times)?;
    let std = stats::population_std(&times)?;
    let median = stats::median(&times)?;
    let upper = mean + 3.0 * std;
    let lower = (mean - 3.0 * std).max(0.0);

    let outliers: Vec<String> = completed
        .iter()
        .filter(|s| s.cycle_time_days > upper || s.cycle_time_days < lower)
        .map(|s| s.story_id.clone())
        .collect();
    let outlier_rate = outliers.len() as f64 / completed.len() as f64;

    Some(CycleTimeMetrics {
        mean,
        median,
        std,
        upper_control_limit: upper,
        lower_control_limit: lower,
        outliers,
        outlier_rate,
    })
}

/// Capacity utilization band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationStatus {
    OverUtilized,
    AtCapacity,
    Healthy,
    UnderUtilized,
}

impl UtilizationStatus {
    /// Classify an actual utilization percentage.
    pub fn from_percent(pct: f64) -> Self {
        if pct > 105.0 {
            UtilizationStatus::OverUtilized
        } else if pct > 95.0 {
            UtilizationStatus::AtCapacity
        } else if pct > 70.0 {
            UtilizationStatus::Healthy
        } else {
            UtilizationStatus::UnderUtilized
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, UtilizationStatus::OverUtilized | UtilizationStatus::UnderUtilized)
    }
}

/// Committed and delivered points relative to capacity, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityUtilization {
    pub sprint_number: u32,
    pub commitment_utilization: f64,
    pub actual_utilization: f64,
    pub status: UtilizationStatus,
}

/// Utilization of one sprint. Zero capacity reports 0%.
pub fn capacity_utilization(sprint: &SprintRecord) -> CapacityUtilization {
    let capacity = sprint.team_capacity;
    let (commitment, actual) = if capacity > 0.0 {
        (
            sprint.committed_points.max(0.0) * 100.0 / capacity,
            sprint.completed_points.max(0.0) * 100.0 / capacity,
        )
    } else {
        (0.0, 0.0)
    };

    CapacityUtilization {
        sprint_number: sprint.sprint_number,
        commitment_utilization: commitment,
        actual_utilization: actual,
        status: UtilizationStatus::from_percent(actual),
    }
}

/// Share of stories of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryTypeShare {
    pub story_type: StoryType,
    pub count: usize,
    pub percentage: f64,
}

/// Distribution of story types, ordered by type.
pub fn story_type_mix(stories: &[StoryRecord]) -> Vec<StoryTypeShare> {
    let mut counts: BTreeMap<StoryType, usize> = BTreeMap::new();
    for story in stories {
        *counts.entry(story.story_type).or_default() += 1;
    }
    let total = stories.len() as f64;
    counts
        .into_iter()
        .map(|(story_type, count)| StoryTypeShare {
            story_type,
            count,
            percentage: count as f64 * 100.0 / total,
        })
        .collect()
}

/// Share of stories that are bugs (0-1).
pub fn bug_ratio(stories: &[StoryRecord]) -> f64 {
    share(stories, |s| s.story_type == StoryType::Bug)
}

/// Share of stories carried over to a later sprint (0-1).
pub fn carryover_rate(stories: &[StoryRecord]) -> f64 {
    share(stories, |s| s.status == StoryStatus::CarriedOver)
}

fn share(stories: &[StoryRecord], pred: impl Fn(&StoryRecord) -> bool) -> f64 {
    if stories.is_empty() {
        return 0.0;
    }
    stories.iter().filter(|s| pred(s)).count() as f64 / stories.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str, story_type: StoryType, status: StoryStatus, cycle: f64) -> StoryRecord {
        StoryRecord {
            story_id: id.to_string(),
            sprint_number: 1,
            story_points: 3.0,
            final_story_points: 3.0,
            story_type,
            status,
            cycle_time_days: cycle,
            num_blockers: 0,
            assignee_id: "TM001".to_string(),
            initiative_id: None,
        }
    }

    #[test]
    fn test_velocity_trend_direction() {
        let rising = velocity_trend(&[(1, 30.0), (2, 32.0), (3, 34.0), (4, 36.0)]);
        assert_eq!(rising.direction, TrendDirection::Increasing);
        assert!((rising.slope - 2.0).abs() < 1e-9);

        let flat = velocity_trend(&[(1, 30.0), (2, 30.2), (3, 30.1)]);
        assert_eq!(flat.direction, TrendDirection::Stable);

        let single = velocity_trend(&[(1, 30.0)]);
        assert_eq!(single.direction, TrendDirection::InsufficientData);
    }

    #[test]
    fn test_predictability() {
        assert_eq!(predictability_score(&[30.0, 30.0, 30.0]), 1.0);
        assert_eq!(predictability_score(&[0.0, 0.0]), 0.0);
        assert!((predictability_score(&[10.0, 30.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cycle_time_outliers() {
        let mut stories: Vec<StoryRecord> = (0..20)
            .map(|i| story(&format!("S{i}"), StoryType::Feature, StoryStatus::Completed, 3.0))
            .collect();
        stories.push(story("SLOW", StoryType::Feature, StoryStatus::Completed, 60.0));
        stories.push(story("WIP", StoryType::Feature, StoryStatus::InProgress, 90.0));

        let metrics = cycle_time_metrics(&stories).unwrap();
        assert_eq!(metrics.outliers, vec!["SLOW".to_string()]);
        assert_eq!(metrics.median, 3.0);
        assert_eq!(metrics.lower_control_limit, 0.0);
        assert!(cycle_time_metrics(&[]).is_none());
    }

    #[test]
    fn test_capacity_utilization_bands() {
        let sprint = SprintRecord {
            sprint_number: 4,
            committed_points: 50.0,
            completed_points: 45.0,
            team_capacity: 50.0,
            team_size: 6,
            duration_days: 14,
            start_date: None,
            end_date: None,
        };
        let util = capacity_utilization(&sprint);
        assert_eq!(util.commitment_utilization, 100.0);
        assert_eq!(util.actual_utilization, 90.0);
        assert_eq!(util.status, UtilizationStatus::Healthy);

        assert_eq!(UtilizationStatus::from_percent(110.0), UtilizationStatus::OverUtilized);
        assert_eq!(UtilizationStatus::from_percent(96.0), UtilizationStatus::AtCapacity);
        assert_eq!(UtilizationStatus::from_percent(70.0), UtilizationStatus::UnderUtilized);
    }

    #[test]
    fn test_story_mix_and_ratios() {
        let stories = vec![
            story("A", StoryType::Feature, StoryStatus::Completed, 1.0),
            story("B", StoryType::Bug, StoryStatus::Completed, 1.0),
            story("C", StoryType::Bug, StoryStatus::CarriedOver, 1.0),
            story("D", StoryType::Spike, StoryStatus::Completed, 1.0),
        ];
        let mix = story_type_mix(&stories);
        assert_eq!(mix.len(), 3);
        assert_eq!(mix[1].story_type, StoryType::Bug);
        assert_eq!(mix[1].percentage, 50.0);
        assert_eq!(bug_ratio(&stories), 0.5);
        assert_eq!(carryover_rate(&stories), 0.25);
        assert_eq!(bug_ratio(&[]), 0.0);
    }
}
