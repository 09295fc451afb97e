//! Initiative prioritization engine.
//!
//! ```text
//! priority = (impact / effort) × strategic_weight[category] × roi_multiplier[roi]
//! ```
//!
//! Quadrants are assigned from the raw impact/effort pair, never from the
//! composite score. See [`classify_quadrant`] for the boundary policy.

mod portfolio;
mod quadrant;

pub use portfolio::{
    allocate_capacity, portfolio_composition, portfolio_health, time_sinks, CapacityAllocation,
    InitiativeAllocation, PortfolioHealth, QuadrantComposition,
};
pub use quadrant::{classify_quadrant, Placement, Quadrant};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::records::{clamp_input, DataQualityIssue, Initiative, InitiativeStatus, IssueKind};
use crate::storage::{PriorityConfig, TierThresholds};

const MAX_SCORE_INPUT: f64 = 10.0;
/// Effort substituted when the record carries none.
const MIN_VALID_EFFORT: f64 = 1.0;

/// Coarse bucket of the priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl PriorityTier {
    pub fn from_score(score: f64, thresholds: &TierThresholds) -> Self {
        if score >= thresholds.high {
            PriorityTier::High
        } else if score >= thresholds.medium {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

/// Scoring outcome for one initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityResult {
    pub initiative_id: String,
    pub name: String,
    pub status: InitiativeStatus,
    /// Impact after clamping
    pub impact: f64,
    /// Effort after clamping or substitution
    pub effort: f64,
    pub priority_score: f64,
    pub tier: PriorityTier,
    pub quadrant: Quadrant,
    pub placement: Placement,
    pub total_points: f64,
    pub remaining_points: f64,
    pub issues: Vec<DataQualityIssue>,
}

/// Score and classify one initiative.
///
/// Out-of-range impact and effort are clamped into `[0, 10]`; an effort that
/// is zero, negative or non-finite is replaced by 1. Both are recorded on the
/// result and never fail the call.
///
/// # Errors
///
/// Returns [`ConfigError`] when the category or ROI estimate has no entry in
/// the configured tables, or the entry is negative.
pub fn score_initiative(
    initiative: &Initiative,
    config: &PriorityConfig,
) -> Result<PriorityResult, ConfigError> {
    let weight = config.strategic_weight(initiative.strategic_category)?;
    let multiplier = config.roi_multiplier(initiative.roi_estimate)?;
    if weight < 0.0 || multiplier < 0.0 || !weight.is_finite() || !multiplier.is_finite() {
        return Err(ConfigError::InvalidValue {
            key: "priority".to_string(),
            message: format!(
                "weight {weight} for '{}' and multiplier {multiplier} for '{}' must be non-negative",
                initiative.strategic_category, initiative.roi_estimate
            ),
        });
    }

    let record = format!("initiative {}", initiative.initiative_id);
    let mut issues = Vec::new();

    let impact = clamp_input(initiative.impact_score, 0.0, MAX_SCORE_INPUT, &record, "impact_score", &mut issues);
    let effort = sanitize_effort(initiative.effort_score, &record, &mut issues);

    if initiative.completed_story_points > initiative.total_story_points {
        issues.push(
            DataQualityIssue::new(record.as_str(), "completed_story_points", IssueKind::CompletedExceedsTotal)
                .with_values(initiative.completed_story_points, initiative.total_story_points),
        );
    }

    let priority_score = ((impact / effort) * weight * multiplier).max(0.0);
    let (quadrant, placement) = classify_quadrant(impact, effort, &config.quadrant);

    Ok(PriorityResult {
        initiative_id: initiative.initiative_id.clone(),
        name: initiative.name.clone(),
        status: initiative.status,
        impact,
        effort,
        priority_score,
        tier: PriorityTier::from_score(priority_score, &config.tiers),
        quadrant,
        placement,
        total_points: initiative.total_story_points.max(0.0),
        remaining_points: initiative.remaining_points(),
        issues,
    })
}

fn sanitize_effort(effort: f64, record: &str, issues: &mut Vec<DataQualityIssue>) -> f64 {
    if effort.is_finite() && effort > 0.0 {
        return clamp_input(effort, 0.0, MAX_SCORE_INPUT, record, "effort_score", issues);
    }
    let kind = if !effort.is_finite() {
        IssueKind::NonFinite
    } else if effort == 0.0 {
        IssueKind::ZeroEffort
    } else {
        IssueKind::Negative
    };
    tracing::warn!(
        record,
        original = effort,
        substituted = MIN_VALID_EFFORT,
        "substituted minimum effort"
    );
    issues.push(DataQualityIssue::new(record, "effort_score", kind).with_values(effort, MIN_VALID_EFFORT));
    MIN_VALID_EFFORT
}

/// Deterministic ranking order: score descending, then id ascending.
pub fn rank_order(a: &PriorityResult, b: &PriorityResult) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| a.initiative_id.cmp(&b.initiative_id))
}

/// Sort results into ranking order. The order is total, so repeated calls on
/// the same set always agree.
pub fn rank_initiatives(mut results: Vec<PriorityResult>) -> Vec<PriorityResult> {
    results.sort_by(rank_order);
    results
}

/// Score every initiative and return them ranked.
///
/// A bad row only annotates its own result; a configuration defect aborts
/// the whole portfolio.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered.
pub fn score_portfolio(
    initiatives: &[Initiative],
    config: &PriorityConfig,
) -> Result<Vec<PriorityResult>, ConfigError> {
    let results = initiatives
        .iter()
        .map(|i| score_initiative(i, config))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(initiatives = results.len(), "scored portfolio");
    Ok(rank_initiatives(results))
}

/// Dense rank (1-based) of each result in ranking order; equal scores share a rank.
pub fn dense_ranks(ranked: &[PriorityResult]) -> Vec<(String, usize)> {
    let mut rank = 0;
    let mut previous: Option<f64> = None;
    ranked
        .iter()
        .map(|r| {
            if previous != Some(r.priority_score) {
                rank += 1;
                previous = Some(r.priority_score);
            }
            (r.initiative_id.clone(), rank)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::records::{RoiEstimate, StrategicCategory};

    pub(crate) fn initiative(
        id: &str,
        impact: f64,
        effort: f64,
        category: StrategicCategory,
        roi: RoiEstimate,
    ) -> Initiative {
        Initiative {
            initiative_id: id.to_string(),
            name: format!("Initiative {id}"),
            impact_score: impact,
            effort_score: effort,
            strategic_category: category,
            status: InitiativeStatus::Backlog,
            total_story_points: 40.0,
            completed_story_points: 0.0,
            roi_estimate: roi,
            start_sprint: None,
            target_sprint: None,
        }
    }

    #[test]
    fn test_revenue_growth_quick_win_example() {
        let i = initiative("INI-001", 9.0, 2.0, StrategicCategory::RevenueGrowth, RoiEstimate::High);
        let result = score_initiative(&i, &PriorityConfig::default()).unwrap();

        assert!((result.priority_score - 8.775).abs() < 1e-9);
        assert_eq!(result.quadrant, Quadrant::QuickWin);
        assert_eq!(result.tier, PriorityTier::High);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_zero_effort_substitutes_minimum() {
        let i = initiative("INI-002", 6.0, 0.0, StrategicCategory::ProcessImprovement, RoiEstimate::Medium);
        let result = score_initiative(&i, &PriorityConfig::default()).unwrap();

        assert_eq!(result.effort, 1.0);
        assert_eq!(result.priority_score, 6.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ZeroEffort);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let i = initiative("INI-003", 14.0, 12.0, StrategicCategory::ProcessImprovement, RoiEstimate::Medium);
        let result = score_initiative(&i, &PriorityConfig::default()).unwrap();
        assert_eq!(result.impact, 10.0);
        assert_eq!(result.effort, 10.0);
        assert_eq!(result.priority_score, 1.0);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn test_missing_table_entry_is_config_error() {
        let mut config = PriorityConfig::default();
        config.strategic_weights.remove(&StrategicCategory::CostReduction);
        let i = initiative("INI-004", 5.0, 5.0, StrategicCategory::CostReduction, RoiEstimate::Low);

        assert_eq!(
            score_initiative(&i, &config),
            Err(ConfigError::MissingStrategicWeight("Cost Reduction".to_string()))
        );

        let mut config = PriorityConfig::default();
        config.roi_multipliers.remove(&RoiEstimate::Low);
        assert!(matches!(
            score_initiative(&i, &config),
            Err(ConfigError::MissingRoiMultiplier(_))
        ));
    }

    #[test]
    fn test_one_bad_row_does_not_abort_portfolio() {
        let initiatives = vec![
            initiative("A", 8.0, 0.0, StrategicCategory::RevenueGrowth, RoiEstimate::High),
            initiative("B", 5.0, 5.0, StrategicCategory::CostReduction, RoiEstimate::Low),
        ];
        let ranked = score_portfolio(&initiatives, &PriorityConfig::default()).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].initiative_id, "A");
        assert!(!ranked[0].issues.is_empty());
    }

    #[test]
    fn test_ties_break_by_id() {
        let initiatives = vec![
            initiative("C", 6.0, 3.0, StrategicCategory::ProcessImprovement, RoiEstimate::Medium),
            initiative("A", 6.0, 3.0, StrategicCategory::ProcessImprovement, RoiEstimate::Medium),
            initiative("B", 9.0, 3.0, StrategicCategory::ProcessImprovement, RoiEstimate::Medium),
        ];
        let ranked = score_portfolio(&initiatives, &PriorityConfig::default()).unwrap();
        let ids: Vec<_> = ranked.iter().map(|r| r.initiative_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);

        let ranks = dense_ranks(&ranked);
        assert_eq!(ranks[1].1, 2);
        assert_eq!(ranks[2].1, 2);
    }

    #[test]
    fn test_tier_boundaries() {
        let tiers = TierThresholds::default();
        assert_eq!(PriorityTier::from_score(1.49, &tiers), PriorityTier::Low);
        assert_eq!(PriorityTier::from_score(1.5, &tiers), PriorityTier::Medium);
        assert_eq!(PriorityTier::from_score(2.5, &tiers), PriorityTier::High);
    }
}
