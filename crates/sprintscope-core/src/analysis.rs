//! End-to-end analysis: records → metrics → prioritization and risk →
//! recommendations.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::ConfigError;
use crate::metrics::{
    bug_ratio, capacity_utilization, carryover_rate, compute_sprint_health, cycle_time_metrics,
    member_utilization, predictability_score, story_type_mix, velocity_history, velocity_trend,
    CapacityUtilization, CycleTimeMetrics, MemberUtilization, SprintHealth, StoryTypeShare,
    VelocityTrend,
};
use crate::prioritization::{
    allocate_capacity, portfolio_composition, portfolio_health, score_portfolio, time_sinks,
    CapacityAllocation, PortfolioHealth, PriorityResult, QuadrantComposition,
};
use crate::recommendations::{
    delivery_insights, portfolio_insights, synthesize, DeliveryInsight, Recommendation,
};
use crate::records::DataQualityIssue;
use crate::risk::{
    assess_portfolio_risk, forecast_velocity, recommended_commitment, run_completion_simulation,
    ForecastResult, RiskResult, SimulationOutcome, TeamState,
};
use crate::storage::AnalyticsConfig;

/// Future sprints covered by the capacity plan.
const ALLOCATION_SPRINTS: u32 = 3;

/// Portfolio-level views derived from the priority results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub composition: Vec<QuadrantComposition>,
    pub health: PortfolioHealth,
    pub allocation: CapacityAllocation,
    /// Ids of time-sink initiatives, most effort first
    pub time_sinks: Vec<String>,
}

/// Everything one [`analyze`] call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub current_sprint: Option<u32>,
    pub sprint_health: BTreeMap<u32, SprintHealth>,
    pub velocity_trend: VelocityTrend,
    pub predictability: f64,
    pub cycle_time: Option<CycleTimeMetrics>,
    pub capacity: Vec<CapacityUtilization>,
    pub story_mix: Vec<StoryTypeShare>,
    /// Share of stories that are bugs (0-1)
    pub bug_ratio: f64,
    /// Share of stories carried over (0-1)
    pub carryover_rate: f64,
    pub team: Vec<MemberUtilization>,
    pub priorities: Vec<PriorityResult>,
    pub portfolio: PortfolioSummary,
    pub risks: Vec<RiskResult>,
    pub forecast: ForecastResult,
    pub recommended_commitment: Option<u32>,
    /// Probability of delivering the recommended commitment
    pub commitment_outlook: Option<SimulationOutcome>,
    pub recommendations: Vec<Recommendation>,
    pub insights: Vec<DeliveryInsight>,
    /// Problems found by dataset validation
    pub data_quality: Vec<DataQualityIssue>,
}

/// Run every engine over `dataset` in data-flow order.
///
/// The only random step is the commitment simulation, which draws from `rng`.
///
/// # Errors
///
/// Returns [`ConfigError`] when `config` is invalid or a priority table is
/// missing an entry used by the dataset.
pub fn analyze<R>(dataset: &Dataset, config: &AnalyticsConfig, rng: &mut R) -> Result<AnalysisReport, ConfigError>
where
    R: Rng + ?Sized,
{
    config.validate()?;
    let data_quality = dataset.validate();

    let sprint_health = compute_sprint_health(&dataset.sprints, &dataset.stories, &config.health)?;
    let velocities = velocity_history(&sprint_health);
    let trend_points: Vec<(u32, f64)> = sprint_health
        .values()
        .filter(|h| h.story_count > 0)
        .map(|h| (h.sprint_number, h.velocity))
        .collect();

    let mut ordered_sprints: Vec<_> = dataset.sprints.iter().collect();
    ordered_sprints.sort_by_key(|s| s.sprint_number);
    let capacity: Vec<_> = ordered_sprints.into_iter().map(capacity_utilization).collect();

    let priorities = score_portfolio(&dataset.initiatives, &config.priority)?;
    let portfolio = PortfolioSummary {
        composition: portfolio_composition(&priorities),
        health: portfolio_health(&priorities),
        allocation: allocate_capacity(&priorities, &velocities, ALLOCATION_SPRINTS),
        time_sinks: time_sinks(&priorities)
            .into_iter()
            .map(|r| r.initiative_id.clone())
            .collect(),
    };

    let team_state = TeamState::from_sprints(&dataset.sprints).unwrap_or(TeamState {
        current_sprint: 0,
        utilization: None,
    });
    let risks = assess_portfolio_risk(&dataset.initiatives, &team_state, &velocities, &config.risk)?;

    let forecast = forecast_velocity(&velocities, config.forecast.horizon, &config.forecast);
    let commitment = recommended_commitment(&velocities, &config.recommendations);
    let commitment_outlook = commitment.map(|points| {
        run_completion_simulation(&velocities, f64::from(points), &config.simulation, &mut *rng)
    });

    let team = member_utilization(&dataset.stories, &dataset.team, sprint_health.len());
    let recommendations = synthesize(&priorities, &risks, &config.recommendations);
    let mut insights = delivery_insights(
        &sprint_health,
        &dataset.stories,
        &team,
        &forecast,
        &velocities,
        &config.recommendations,
    );
    insights.extend(portfolio_insights(
        &dataset.initiatives,
        &portfolio.composition,
        &portfolio.allocation,
        &config.recommendations,
    ));

    tracing::info!(
        sprints = sprint_health.len(),
        initiatives = priorities.len(),
        recommendations = recommendations.len(),
        issues = data_quality.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        current_sprint: dataset.current_sprint(),
        velocity_trend: velocity_trend(&trend_points),
        predictability: predictability_score(&velocities),
        cycle_time: cycle_time_metrics(&dataset.stories),
        capacity,
        story_mix: story_type_mix(&dataset.stories),
        bug_ratio: bug_ratio(&dataset.stories),
        carryover_rate: carryover_rate(&dataset.stories),
        team,
        sprint_health,
        priorities,
        portfolio,
        risks,
        forecast,
        recommended_commitment: commitment,
        commitment_outlook,
        recommendations,
        insights,
        data_quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::seeded_rng;

    #[test]
    fn test_empty_dataset_produces_empty_report() {
        let report = analyze(&Dataset::default(), &AnalyticsConfig::default(), &mut seeded_rng(1)).unwrap();
        assert!(report.sprint_health.is_empty());
        assert!(report.priorities.is_empty());
        assert!(report.recommendations.is_empty());
        assert!(report.insights.is_empty());
        assert_eq!(report.recommended_commitment, None);
        assert_eq!(report.commitment_outlook, None);
        assert_eq!(report.current_sprint, None);
    }

    #[test]
    fn test_invalid_config_aborts() {
        let mut config = AnalyticsConfig::default();
        config.health.weights.blockers = 0.5;
        assert!(analyze(&Dataset::default(), &config, &mut seeded_rng(1)).is_err());
    }

    #[test]
    fn test_portfolio_insights_reach_the_report() {
        use crate::prioritization::tests::initiative;
        use crate::recommendations::InsightCategory;
        use crate::records::{RoiEstimate, StrategicCategory};

        let dataset = Dataset {
            initiatives: vec![
                initiative("I-1", 8.0, 8.0, StrategicCategory::CostReduction, RoiEstimate::High),
                initiative("I-2", 7.0, 9.0, StrategicCategory::TechnicalExcellence, RoiEstimate::Medium),
            ],
            ..Dataset::default()
        };
        let report = analyze(&dataset, &AnalyticsConfig::default(), &mut seeded_rng(1)).unwrap();
        let categories: Vec<_> = report.insights.iter().map(|i| i.category).collect();
        assert_eq!(
            categories,
            vec![
                InsightCategory::PortfolioBalance,
                InsightCategory::CapacityOvercommitment,
                InsightCategory::StrategicAlignment,
            ]
        );
        assert_eq!(report.portfolio.allocation.required_points, 80.0);
    }
}
