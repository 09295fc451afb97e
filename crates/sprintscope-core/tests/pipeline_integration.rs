//! End-to-end tests over the bundled demo dataset.
//!
//! These run the full pipeline the way the CLI does: parse, validate,
//! analyze, and check that the engines agree with each other.

use sprintscope_core::recommendations::RecommendationAction;
use sprintscope_core::risk::CompletionForecast;
use sprintscope_core::{
    analyze, seeded_rng, AnalyticsConfig, Dataset, InitiativeStatus, Quadrant, SimulationOutcome,
};

const DEMO: &str = include_str!("../../../demos/sample_dataset.json");

fn demo() -> Dataset {
    Dataset::from_json_str(DEMO).unwrap()
}

#[test]
fn test_demo_dataset_is_clean() {
    let dataset = demo();
    assert_eq!(dataset.sprints.len(), 4);
    assert_eq!(dataset.current_sprint(), Some(4));
    assert!(dataset.validate().is_empty(), "{:?}", dataset.validate());
}

#[test]
fn test_full_report() {
    let dataset = demo();
    let config = AnalyticsConfig::default();
    let report = analyze(&dataset, &config, &mut seeded_rng(42)).unwrap();

    assert_eq!(report.current_sprint, Some(4));
    assert_eq!(report.sprint_health.len(), 4);
    for health in report.sprint_health.values() {
        let score = health.composite_score.unwrap();
        assert!((0.0..=100.0).contains(&score), "score {score}");
    }

    let order: Vec<_> = report.priorities.iter().map(|p| p.initiative_id.as_str()).collect();
    assert_eq!(order, ["INI-001", "INI-003", "INI-002", "INI-005", "INI-004"]);
    assert!((report.priorities[0].priority_score - 5.85).abs() < 1e-9);
    assert_eq!(report.priorities[0].quadrant, Quadrant::QuickWin);
    assert_eq!(report.priorities[4].quadrant, Quadrant::TimeSink);
    assert_eq!(report.portfolio.time_sinks, ["INI-004"]);
    assert!((report.bug_ratio - 2.0 / 11.0).abs() < 1e-9);

    // Completed initiatives carry no delivery risk.
    assert_eq!(report.risks.len(), 4);
    assert!(report.risks.iter().all(|r| r.initiative_id != "INI-005"));
    assert!(report.risks.windows(2).all(|w| w[0].risk_score >= w[1].risk_score));
    assert!(report.risks.iter().all(|r| (0.0..=1.0).contains(&r.risk_score)));

    assert_eq!(report.forecast.points.len(), config.forecast.horizon);
    assert!(report.recommended_commitment.is_some());
    assert!(matches!(report.commitment_outlook, Some(SimulationOutcome::Estimated(_))));
}

#[test]
fn test_recommendations_follow_portfolio() {
    let report = analyze(&demo(), &AnalyticsConfig::default(), &mut seeded_rng(7)).unwrap();

    let ranks: Vec<usize> = report.recommendations.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, (1..=report.recommendations.len()).collect::<Vec<_>>());

    let find = |action: RecommendationAction, id: &str| {
        report
            .recommendations
            .iter()
            .any(|r| r.action == action && r.initiative_id == id)
    };
    assert!(find(RecommendationAction::Prioritize, "INI-001"));
    assert!(find(RecommendationAction::Deprioritize, "INI-004"));

    // Interventions always come first.
    let first_other = report
        .recommendations
        .iter()
        .position(|r| r.action != RecommendationAction::Intervene)
        .unwrap_or(report.recommendations.len());
    assert!(report.recommendations[first_other..]
        .iter()
        .all(|r| r.action != RecommendationAction::Intervene));
}

#[test]
fn test_same_seed_same_report() {
    let dataset = demo();
    let config = AnalyticsConfig::default();
    let a = analyze(&dataset, &config, &mut seeded_rng(1234)).unwrap();
    let b = analyze(&dataset, &config, &mut seeded_rng(1234)).unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}

#[test]
fn test_report_survives_json_roundtrip() {
    let report = analyze(&demo(), &AnalyticsConfig::default(), &mut seeded_rng(3)).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let back: sprintscope_core::AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.priorities, report.priorities);
    assert_eq!(back.sprint_health, report.sprint_health);
}

#[test]
fn test_bad_rows_do_not_abort_pipeline() {
    let mut dataset = demo();
    dataset.initiatives[2].effort_score = 0.0;
    dataset.initiatives[3].impact_score = 42.0;
    dataset.initiatives[3].status = InitiativeStatus::Active;

    let report = analyze(&dataset, &AnalyticsConfig::default(), &mut seeded_rng(5)).unwrap();
    assert!(!report.data_quality.is_empty());

    let sanitized = report
        .priorities
        .iter()
        .find(|p| p.initiative_id == "INI-003")
        .unwrap();
    assert_eq!(sanitized.effort, 1.0);
    assert!(!sanitized.issues.is_empty());

    let clamped = report
        .priorities
        .iter()
        .find(|p| p.initiative_id == "INI-004")
        .unwrap();
    assert_eq!(clamped.impact, 10.0);
}

#[test]
fn test_custom_config_changes_ranking() {
    let mut config = AnalyticsConfig::default();
    config.set("priority.roi_multipliers.Low", "5.0").unwrap();

    let report = analyze(&demo(), &config, &mut seeded_rng(9)).unwrap();
    let completed = report
        .priorities
        .iter()
        .find(|p| p.initiative_id == "INI-005")
        .unwrap();
    assert!((completed.priority_score - 6.25).abs() < 1e-9);
    assert_eq!(report.priorities[0].initiative_id, "INI-005");
}

#[test]
fn test_commitment_outlook_is_plausible() {
    let report = analyze(&demo(), &AnalyticsConfig::default(), &mut seeded_rng(11)).unwrap();
    let Some(SimulationOutcome::Estimated(CompletionForecast { probability, trials, .. })) =
        report.commitment_outlook
    else {
        panic!("expected an estimated outlook");
    };
    assert_eq!(trials, AnalyticsConfig::default().simulation.trials);
    // The commitment is a discounted average, so it should usually be met.
    assert!(probability > 0.5, "probability {probability}");
}
