//! Property tests for the scoring, risk, simulation and forecast engines.

use proptest::prelude::*;
use sprintscope_core::risk::{completion_curve, forecast_velocity};
use sprintscope_core::storage::{ForecastConfig, PriorityConfig, RiskConfig, SimulationConfig};
use sprintscope_core::{
    assess_portfolio_risk, rank_initiatives, score_initiative, score_portfolio, Initiative,
    InitiativeStatus, RoiEstimate, StrategicCategory, TeamState,
};

fn arb_category() -> impl Strategy<Value = StrategicCategory> {
    prop_oneof![
        Just(StrategicCategory::RevenueGrowth),
        Just(StrategicCategory::CustomerExperience),
        Just(StrategicCategory::CostReduction),
        Just(StrategicCategory::ProcessImprovement),
        Just(StrategicCategory::TechnicalExcellence),
    ]
}

fn arb_roi() -> impl Strategy<Value = RoiEstimate> {
    prop_oneof![Just(RoiEstimate::High), Just(RoiEstimate::Medium), Just(RoiEstimate::Low)]
}

fn arb_status() -> impl Strategy<Value = InitiativeStatus> {
    prop_oneof![
        Just(InitiativeStatus::Active),
        Just(InitiativeStatus::Backlog),
        Just(InitiativeStatus::Completed),
        Just(InitiativeStatus::Deprioritized),
    ]
}

prop_compose! {
    fn arb_initiative(id: usize)(
        impact in -5.0f64..15.0,
        effort in -2.0f64..15.0,
        category in arb_category(),
        roi in arb_roi(),
        status in arb_status(),
        total in 0.0f64..200.0,
        done in 0.0f64..250.0,
        start in proptest::option::of(1u32..10),
        target in proptest::option::of(1u32..20),
    ) -> Initiative {
        Initiative {
            initiative_id: format!("INI-{id:03}"),
            name: String::new(),
            impact_score: impact,
            effort_score: effort,
            strategic_category: category,
            status,
            total_story_points: total,
            completed_story_points: done,
            roi_estimate: roi,
            start_sprint: start,
            target_sprint: target,
        }
    }
}

fn arb_portfolio() -> impl Strategy<Value = Vec<Initiative>> {
    (1usize..12).prop_flat_map(|n| (0..n).map(arb_initiative).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn priority_score_is_non_negative_and_finite(initiative in arb_initiative(1)) {
        let result = score_initiative(&initiative, &PriorityConfig::default()).unwrap();
        prop_assert!(result.priority_score >= 0.0);
        prop_assert!(result.priority_score.is_finite());
        prop_assert!((0.0..=10.0).contains(&result.impact));
        prop_assert!(result.effort > 0.0 && result.effort <= 10.0);
    }

    #[test]
    fn ranking_is_independent_of_input_order(portfolio in arb_portfolio()) {
        let config = PriorityConfig::default();
        let forward = score_portfolio(&portfolio, &config).unwrap();

        let mut reversed = portfolio.clone();
        reversed.reverse();
        let backward = score_portfolio(&reversed, &config).unwrap();

        prop_assert_eq!(&forward, &backward);
        prop_assert!(forward.windows(2).all(|w| w[0].priority_score >= w[1].priority_score));
        prop_assert_eq!(rank_initiatives(forward.clone()), forward);
    }

    #[test]
    fn risk_scores_stay_in_unit_interval(
        portfolio in arb_portfolio(),
        velocities in proptest::collection::vec(0.0f64..80.0, 0..10),
        current_sprint in 0u32..15,
        utilization in proptest::option::of(0.0f64..2.0),
    ) {
        let team = TeamState { current_sprint, utilization };
        let risks = assess_portfolio_risk(&portfolio, &team, &velocities, &RiskConfig::default()).unwrap();

        prop_assert_eq!(risks.len(), portfolio.iter().filter(|i| i.status.is_open()).count());
        for risk in &risks {
            prop_assert!((0.0..=1.0).contains(&risk.risk_score), "score {}", risk.risk_score);
            let total: f64 = risk.contributing_factors.iter().map(|f| f.contribution).sum();
            prop_assert!((total - risk.risk_score).abs() < 1e-9);
        }
    }

    #[test]
    fn completion_probability_falls_as_target_rises(
        velocities in proptest::collection::vec(0.0f64..60.0, 2..12),
        mut targets in proptest::collection::vec(0.0f64..150.0, 2..8),
        seed in any::<u64>(),
    ) {
        targets.sort_by(f64::total_cmp);
        let config = SimulationConfig { trials: 200, ..SimulationConfig::default() };
        let curve = completion_curve(&velocities, &targets, &config, seed);

        let probabilities: Vec<f64> = curve.iter().map(|p| p.probability.unwrap()).collect();
        prop_assert!(probabilities.windows(2).all(|w| w[0] >= w[1]), "{:?}", probabilities);
        prop_assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn forecast_has_one_point_per_sprint(
        velocities in proptest::collection::vec(0.0f64..80.0, 1..15),
        horizon in 0usize..10,
    ) {
        let forecast = forecast_velocity(&velocities, horizon, &ForecastConfig::default());
        prop_assert_eq!(forecast.points.len(), horizon);
        for (i, point) in forecast.points.iter().enumerate() {
            prop_assert_eq!(point.sprint_offset, i + 1);
            prop_assert!(point.predicted_velocity >= 0.0);
            if let (Some(lo), Some(hi)) = (point.lower_bound, point.upper_bound) {
                prop_assert!(lo <= point.predicted_velocity && point.predicted_velocity <= hi);
            }
        }
    }
}
