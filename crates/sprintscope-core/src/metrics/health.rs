//! Composite sprint health.
//!
//! Health is a 0-100 score blending four components:
//!
//! | Component    | Default weight | Source                                   |
//! |--------------|----------------|------------------------------------------|
//! | Consistency  | 0.30           | 1 - CV of velocity over a trailing window |
//! | Accuracy     | 0.25           | 1 - mean relative re-estimation error    |
//! | Completion   | 0.25           | completed / committed, capped at 1       |
//! | Blockers     | 0.20           | 1 - share of stories that hit a blocker  |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::records::{clamp_input, DataQualityIssue, IssueKind, SprintRecord, StoryRecord};
use crate::stats;
use crate::storage::HealthConfig;

/// Neutral score used when a component cannot be measured.
const NEUTRAL: f64 = 100.0;

/// Health breakdown for one sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintHealth {
    pub sprint_number: u32,
    pub story_count: usize,
    /// Final points of completed stories
    pub velocity: f64,
    /// `None` when nothing was committed
    pub completion_rate: Option<f64>,
    pub consistency_component: f64,
    pub accuracy_component: f64,
    pub completion_component: f64,
    pub blocker_component: f64,
    /// Share of stories with at least one blocker (0-1)
    pub blocker_impact: f64,
    /// `None` when the sprint has no stories
    pub composite_score: Option<f64>,
    pub issues: Vec<DataQualityIssue>,
}

/// Compute health for every sprint, keyed by sprint number.
///
/// Stories are matched to sprints by `sprint_number`. Out-of-range numbers are
/// clamped and reported on the affected sprint; they never abort the run.
///
/// # Errors
///
/// Returns [`ConfigError`] when the health configuration is invalid.
pub fn compute_sprint_health(
    sprints: &[SprintRecord],
    stories: &[StoryRecord],
    config: &HealthConfig,
) -> Result<BTreeMap<u32, SprintHealth>, ConfigError> {
    config.validate()?;

    let mut ordered: Vec<&SprintRecord> = sprints.iter().collect();
    ordered.sort_by_key(|s| s.sprint_number);

    let mut by_sprint: BTreeMap<u32, Vec<&StoryRecord>> = BTreeMap::new();
    for story in stories {
        by_sprint.entry(story.sprint_number).or_default().push(story);
    }

    let mut results: BTreeMap<u32, SprintHealth> = BTreeMap::new();
    let mut velocities: Vec<f64> = Vec::with_capacity(ordered.len());

    for sprint in ordered {
        if results.contains_key(&sprint.sprint_number) {
            tracing::warn!(sprint = sprint.sprint_number, "duplicate sprint record ignored");
            if let Some(existing) = results.get_mut(&sprint.sprint_number) {
                existing.issues.push(DataQualityIssue::new(
                    format!("sprint {}", sprint.sprint_number),
                    "sprint_number",
                    IssueKind::DuplicateId,
                ));
            }
            continue;
        }

        let sprint_stories = by_sprint
            .get(&sprint.sprint_number)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut issues = Vec::new();

        let velocity = sprint_velocity(sprint_stories, &mut issues);
        // Empty sprints have no velocity and stay out of the window.
        if !sprint_stories.is_empty() {
            velocities.push(velocity);
        }

        let window_start = velocities.len().saturating_sub(config.consistency_window);
        let consistency = consistency_component(&velocities[window_start..]);
        let accuracy = accuracy_component(sprint.sprint_number, sprint_stories, &mut issues);
        let completion_rate = completion_rate(sprint, &mut issues);
        let completion = completion_rate.map(|r| r.min(1.0) * 100.0).unwrap_or(0.0);

        let blocked = sprint_stories.iter().filter(|s| s.is_blocked()).count();
        let blocker_impact = if sprint_stories.is_empty() {
            0.0
        } else {
            blocked as f64 / sprint_stories.len() as f64
        };
        let blocker = (1.0 - blocker_impact) * 100.0;

        let composite_score = if sprint_stories.is_empty() {
            None
        } else {
            let w = &config.weights;
            let score = w.consistency * consistency
                + w.accuracy * accuracy
                + w.completion * completion
                + w.blockers * blocker;
            Some(score.clamp(0.0, 100.0))
        };

        results.insert(
            sprint.sprint_number,
            SprintHealth {
                sprint_number: sprint.sprint_number,
                story_count: sprint_stories.len(),
                velocity,
                completion_rate,
                consistency_component: consistency,
                accuracy_component: accuracy,
                completion_component: completion,
                blocker_component: blocker,
                blocker_impact,
                composite_score,
                issues,
            },
        );
    }

    tracing::debug!(sprints = results.len(), stories = stories.len(), "computed sprint health");
    Ok(results)
}

/// Velocities of sprints that had stories, in sprint order.
pub fn velocity_history(health: &BTreeMap<u32, SprintHealth>) -> Vec<f64> {
    health
        .values()
        .filter(|h| h.story_count > 0)
        .map(|h| h.velocity)
        .collect()
}

fn sprint_velocity(stories: &[&StoryRecord], issues: &mut Vec<DataQualityIssue>) -> f64 {
    stories
        .iter()
        .filter(|s| s.is_completed())
        .map(|s| {
            clamp_input(
                s.final_story_points,
                0.0,
                f64::MAX,
                &format!("story {}", s.story_id),
                "final_story_points",
                issues,
            )
        })
        .sum()
}

/// 100 × (1 − min(CV, 1)); a single sample is neutral.
fn consistency_component(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return NEUTRAL;
    }
    match stats::coefficient_of_variation(window) {
        Some(cv) => (1.0 - cv.min(1.0)) * 100.0,
        None => 0.0,
    }
}

fn accuracy_component(
    sprint_number: u32,
    stories: &[&StoryRecord],
    issues: &mut Vec<DataQualityIssue>,
) -> f64 {
    let errors: Vec<f64> = stories
        .iter()
        .filter(|s| s.is_completed() && s.story_points > 0.0 && s.story_points.is_finite())
        .map(|s| {
            let fin = s.final_story_points.max(0.0);
            (fin - s.story_points).abs() / s.story_points
        })
        .collect();

    match stats::mean(&errors) {
        Some(mean_error) => (100.0 * (1.0 - mean_error)).clamp(0.0, 100.0),
        None => {
            if !stories.is_empty() {
                issues.push(DataQualityIssue::new(
                    format!("sprint {sprint_number}"),
                    "story_points",
                    IssueKind::NoEstimatedStories,
                ));
            }
            NEUTRAL
        }
    }
}

fn completion_rate(sprint: &SprintRecord, issues: &mut Vec<DataQualityIssue>) -> Option<f64> {
    let record = format!("sprint {}", sprint.sprint_number);
    let committed = clamp_input(sprint.committed_points, 0.0, f64::MAX, &record, "committed_points", issues);
    let completed = clamp_input(sprint.completed_points, 0.0, f64::MAX, &record, "completed_points", issues);

    if committed == 0.0 {
        issues.push(DataQualityIssue::new(record, "committed_points", IssueKind::ZeroCommitment));
        return None;
    }
    Some(completed / committed)
}
