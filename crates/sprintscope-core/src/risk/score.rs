//! Multi-factor delivery risk of an initiative.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::records::{
    clamp_input, DataQualityIssue, Initiative, InitiativeStatus, IssueKind, SprintRecord,
};
use crate::stats;
use crate::storage::RiskConfig;

/// Neutral factor value used when a factor cannot be measured.
const NEUTRAL_RISK: f64 = 0.5;

/// Where the team stands right now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    pub current_sprint: u32,
    /// Completed / capacity of the current sprint; `None` when capacity is zero
    pub utilization: Option<f64>,
}

impl TeamState {
    /// State derived from the highest-numbered sprint, or `None` with no sprints.
    pub fn from_sprints(sprints: &[SprintRecord]) -> Option<Self> {
        let current = sprints.iter().max_by_key(|s| s.sprint_number)?;
        let utilization = (current.team_capacity > 0.0 && current.team_capacity.is_finite())
            .then(|| current.completed_points.max(0.0) / current.team_capacity);
        Some(Self {
            current_sprint: current.sprint_number,
            utilization,
        })
    }
}

/// Risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bands are inclusive on their lower bound.
    pub fn from_score(score: f64, config: &RiskConfig) -> Self {
        if score >= config.high_threshold {
            RiskLevel::High
        } else if score >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Which factor a [`RiskFactor`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    Capacity,
    Volatility,
    Utilization,
    Progress,
}

/// One weighted contributor to the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    /// Normalized factor value (0-1)
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Risk assessment of one initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub initiative_id: String,
    pub name: String,
    pub status: InitiativeStatus,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// Largest contribution first
    pub contributing_factors: Vec<RiskFactor>,
    pub remaining_points: f64,
    pub sprints_available: u32,
    pub capacity_available: f64,
    pub recommendation: String,
    pub issues: Vec<DataQualityIssue>,
}

impl RiskResult {
    pub fn factor(&self, kind: RiskFactorKind) -> Option<&RiskFactor> {
        self.contributing_factors.iter().find(|f| f.kind == kind)
    }
}

/// Score the delivery risk of one initiative.
///
/// `velocities` is the sprint velocity history in sprint order; only the
/// most recent `volatility_window` entries are used.
///
/// # Errors
///
/// Returns [`ConfigError`] when the risk weights or thresholds are invalid.
pub fn score_risk(
    initiative: &Initiative,
    team: &TeamState,
    velocities: &[f64],
    config: &RiskConfig,
) -> Result<RiskResult, ConfigError> {
    config.validate()?;
    Ok(score_validated(initiative, team, velocities, config))
}

fn score_validated(
    initiative: &Initiative,
    team: &TeamState,
    velocities: &[f64],
    config: &RiskConfig,
) -> RiskResult {
    let record = format!("initiative {}", initiative.initiative_id);
    let mut issues = Vec::new();

    let total = clamp_input(initiative.total_story_points, 0.0, f64::MAX, &record, "total_story_points", &mut issues);
    let completed = clamp_input(
        initiative.completed_story_points,
        0.0,
        f64::MAX,
        &record,
        "completed_story_points",
        &mut issues,
    );
    if completed > total {
        issues.push(
            DataQualityIssue::new(record.as_str(), "completed_story_points", IssueKind::CompletedExceedsTotal)
                .with_values(completed, total),
        );
    }
    let remaining = (total - completed).max(0.0);

    let recent = recent_window(velocities, config.volatility_window);
    let avg_velocity = stats::mean(&recent).unwrap_or(0.0).max(0.0);

    let current = team.current_sprint;
    let target = initiative
        .target_sprint
        .unwrap_or_else(|| current.saturating_add(config.default_runway_sprints));
    let sprints_available = target.saturating_sub(current).max(1);
    let capacity_available = avg_velocity * sprints_available as f64;

    let capacity = capacity_risk(remaining, capacity_available);
    let volatility = volatility_risk(&recent, config.volatility_cv_ceiling);
    let utilization = utilization_risk(team.utilization, config);
    let progress = progress_risk(initiative.start_sprint, target, current, completed, total);

    let w = &config.weights;
    let mut factors: Vec<RiskFactor> = [
        (RiskFactorKind::Capacity, capacity, w.capacity),
        (RiskFactorKind::Volatility, volatility, w.volatility),
        (RiskFactorKind::Utilization, utilization, w.utilization),
        (RiskFactorKind::Progress, progress, w.progress),
    ]
    .into_iter()
    .map(|(kind, value, weight)| RiskFactor {
        kind,
        value,
        weight,
        contribution: value * weight,
    })
    .collect();

    let risk_score = factors
        .iter()
        .map(|f| f.contribution)
        .sum::<f64>()
        .clamp(0.0, 1.0);
    factors.sort_by(|a, b| {
        b.contribution
            .total_cmp(&a.contribution)
            .then_with(|| a.kind.cmp(&b.kind))
    });

    let risk_level = RiskLevel::from_score(risk_score, config);
    RiskResult {
        initiative_id: initiative.initiative_id.clone(),
        name: initiative.name.clone(),
        status: initiative.status,
        risk_score,
        risk_level,
        contributing_factors: factors,
        remaining_points: remaining,
        sprints_available,
        capacity_available,
        recommendation: recommendation_text(risk_level, capacity).to_string(),
        issues,
    }
}

fn recent_window(velocities: &[f64], window: usize) -> Vec<f64> {
    velocities[velocities.len().saturating_sub(window)..]
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .collect()
}

fn capacity_risk(remaining: f64, capacity_available: f64) -> f64 {
    if capacity_available > 0.0 {
        (remaining / capacity_available).min(1.0)
    } else if remaining > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn volatility_risk(recent: &[f64], cv_ceiling: f64) -> f64 {
    if recent.len() < 2 {
        return NEUTRAL_RISK;
    }
    match stats::coefficient_of_variation(recent) {
        Some(cv) => (cv / cv_ceiling).min(1.0),
        None => NEUTRAL_RISK,
    }
}

fn utilization_risk(utilization: Option<f64>, config: &RiskConfig) -> f64 {
    let Some(u) = utilization.filter(|u| u.is_finite()) else {
        return NEUTRAL_RISK;
    };
    let distance = if u < config.utilization_band_low {
        config.utilization_band_low - u
    } else if u > config.utilization_band_high {
        u - config.utilization_band_high
    } else {
        0.0
    };
    (distance / config.utilization_tolerance).min(1.0)
}

fn progress_risk(start: Option<u32>, target: u32, current: u32, completed: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return NEUTRAL_RISK;
    }
    let actual = (completed / total).clamp(0.0, 1.0);
    let expected = match start {
        None => 0.0,
        Some(start) if target <= start => {
            if current >= target {
                1.0
            } else {
                0.0
            }
        }
        Some(start) => {
            let elapsed = current as f64 - start as f64;
            (elapsed / (target - start) as f64).clamp(0.0, 1.0)
        }
    };
    (expected - actual).max(0.0)
}

fn recommendation_text(level: RiskLevel, capacity: f64) -> &'static str {
    match level {
        RiskLevel::Low => "On track for delivery; no action needed",
        RiskLevel::Medium => "Monitor closely; may need resource adjustment or scope review",
        RiskLevel::High if capacity > 0.7 => {
            "Consider descoping, extending the timeline, or adding resources"
        }
        RiskLevel::High => "Immediate intervention needed",
    }
}

/// Risk of every Active and Backlog initiative, highest risk first (ties by id).
///
/// # Errors
///
/// Returns [`ConfigError`] when the risk configuration is invalid.
pub fn assess_portfolio_risk(
    initiatives: &[Initiative],
    team: &TeamState,
    velocities: &[f64],
    config: &RiskConfig,
) -> Result<Vec<RiskResult>, ConfigError> {
    config.validate()?;
    let mut results: Vec<RiskResult> = initiatives
        .iter()
        .filter(|i| i.status.is_open())
        .map(|i| score_validated(i, team, velocities, config))
        .collect();
    results.sort_by(risk_order);

    tracing::debug!(
        assessed = results.len(),
        high = results.iter().filter(|r| r.risk_level == RiskLevel::High).count(),
        "assessed portfolio risk"
    );
    Ok(results)
}

fn risk_order(a: &RiskResult, b: &RiskResult) -> Ordering {
    b.risk_score
        .total_cmp(&a.risk_score)
        .then_with(|| a.initiative_id.cmp(&b.initiative_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{RoiEstimate, StrategicCategory};

    fn initiative(id: &str, total: f64, completed: f64) -> Initiative {
        Initiative {
            initiative_id: id.to_string(),
            name: id.to_string(),
            impact_score: 5.0,
            effort_score: 5.0,
            strategic_category: StrategicCategory::CostReduction,
            status: InitiativeStatus::Active,
            total_story_points: total,
            completed_story_points: completed,
            roi_estimate: RoiEstimate::Medium,
            start_sprint: None,
            target_sprint: None,
        }
    }

    fn team(utilization: f64) -> TeamState {
        TeamState {
            current_sprint: 10,
            utilization: Some(utilization),
        }
    }

    fn value(result: &RiskResult, kind: RiskFactorKind) -> f64 {
        result.factor(kind).unwrap().value
    }

    #[test]
    fn test_low_risk_steady_team() {
        let i = initiative("INI-1", 40.0, 20.0);
        let result = score_risk(&i, &team(0.9), &[30.0; 6], &RiskConfig::default()).unwrap();

        // 20 remaining over 10 sprints × 30 = 300
        assert_eq!(result.sprints_available, 10);
        assert_eq!(result.capacity_available, 300.0);
        assert!((value(&result, RiskFactorKind::Capacity) - 20.0 / 300.0).abs() < 1e-12);
        assert_eq!(value(&result, RiskFactorKind::Volatility), 0.0);
        assert_eq!(value(&result, RiskFactorKind::Utilization), 0.0);
        assert_eq!(value(&result, RiskFactorKind::Progress), 0.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_overloaded_initiative_is_high() {
        let mut i = initiative("INI-2", 400.0, 0.0);
        i.target_sprint = Some(11);
        i.start_sprint = Some(2);
        let result = score_risk(&i, &team(1.3), &[10.0, 40.0, 15.0, 35.0, 20.0], &RiskConfig::default()).unwrap();

        assert_eq!(value(&result, RiskFactorKind::Capacity), 1.0);
        assert_eq!(value(&result, RiskFactorKind::Volatility), 1.0);
        assert_eq!(value(&result, RiskFactorKind::Utilization), 1.0);
        assert!((value(&result, RiskFactorKind::Progress) - 8.0 / 9.0).abs() < 1e-12);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.contributing_factors[0].kind, RiskFactorKind::Capacity);
        assert!(result.recommendation.contains("descoping"));
    }

    #[test]
    fn test_neutral_factors() {
        let i = initiative("INI-3", 0.0, 0.0);
        let state = TeamState {
            current_sprint: 3,
            utilization: None,
        };
        let result = score_risk(&i, &state, &[25.0], &RiskConfig::default()).unwrap();

        assert_eq!(value(&result, RiskFactorKind::Capacity), 0.0);
        assert_eq!(value(&result, RiskFactorKind::Volatility), 0.5);
        assert_eq!(value(&result, RiskFactorKind::Utilization), 0.5);
        assert_eq!(value(&result, RiskFactorKind::Progress), 0.5);
    }

    #[test]
    fn test_zero_capacity_with_remaining_work() {
        let i = initiative("INI-4", 10.0, 0.0);
        let result = score_risk(&i, &team(0.9), &[], &RiskConfig::default()).unwrap();
        assert_eq!(result.capacity_available, 0.0);
        assert_eq!(value(&result, RiskFactorKind::Capacity), 1.0);
    }

    #[test]
    fn test_utilization_distance_is_symmetric() {
        let config = RiskConfig::default();
        let under = utilization_risk(Some(0.85 - 0.125), &config);
        let over = utilization_risk(Some(0.95 + 0.125), &config);
        assert!((under - 0.5).abs() < 1e-9);
        assert!((over - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_level_bands_inclusive_lower_bound() {
        let config = RiskConfig::default();
        assert_eq!(RiskLevel::from_score(0.2999, &config), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3, &config), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.6, &config), RiskLevel::High);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut config = RiskConfig::default();
        config.weights.capacity = 0.9;
        let i = initiative("INI-5", 10.0, 0.0);
        assert!(matches!(
            score_risk(&i, &team(0.9), &[30.0, 30.0], &config),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn test_portfolio_filters_and_orders() {
        let mut done = initiative("DONE", 10.0, 10.0);
        done.status = InitiativeStatus::Completed;
        let initiatives = vec![
            initiative("B", 40.0, 0.0),
            initiative("A", 40.0, 0.0),
            initiative("C", 400.0, 0.0),
            done,
        ];
        let results = assess_portfolio_risk(&initiatives, &team(0.9), &[30.0; 5], &RiskConfig::default()).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.initiative_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_team_state_from_latest_sprint() {
        let sprint = |n, completed, capacity| SprintRecord {
            sprint_number: n,
            committed_points: 40.0,
            completed_points: completed,
            team_capacity: capacity,
            team_size: 5,
            duration_days: 14,
            start_date: None,
            end_date: None,
        };
        let state = TeamState::from_sprints(&[sprint(2, 45.0, 50.0), sprint(1, 10.0, 50.0)]).unwrap();
        assert_eq!(state.current_sprint, 2);
        assert_eq!(state.utilization, Some(0.9));

        let zero = TeamState::from_sprints(&[sprint(1, 10.0, 0.0)]).unwrap();
        assert_eq!(zero.utilization, None);
        assert!(TeamState::from_sprints(&[]).is_none());
    }
}
