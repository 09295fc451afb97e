use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{StoryRecord, TeamMember};

/// Delivered work of one member relative to their capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberUtilization {
    pub member_id: String,
    pub name: String,
    pub points_delivered: f64,
    pub stories_completed: usize,
    /// Share of all delivered points (0-100)
    pub contribution_pct: f64,
    pub avg_points_per_sprint: f64,
    /// avg_points_per_sprint / capacity; `None` for unknown members or zero capacity
    pub utilization: Option<f64>,
}

/// Per-member delivery, sorted by points delivered (desc) then member id.
///
/// Assignees missing from `team` are still reported, with no utilization.
pub fn member_utilization(
    stories: &[StoryRecord],
    team: &[TeamMember],
    sprint_count: usize,
) -> Vec<MemberUtilization> {
    let mut delivered: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for story in stories.iter().filter(|s| s.is_completed()) {
        let entry = delivered.entry(story.assignee_id.as_str()).or_default();
        entry.0 += story.final_story_points.max(0.0);
        entry.1 += 1;
    }
    let total: f64 = delivered.values().map(|(points, _)| points).sum();
    let sprints = sprint_count.max(1) as f64;

    let mut rows: Vec<MemberUtilization> = delivered
        .into_iter()
        .map(|(member_id, (points, count))| {
            let member = team.iter().find(|m| m.member_id == member_id);
            let avg = points / sprints;
            let utilization = member
                .filter(|m| m.avg_capacity_per_sprint > 0.0)
                .map(|m| avg / m.avg_capacity_per_sprint);
            MemberUtilization {
                member_id: member_id.to_string(),
                name: member.map(|m| m.name.clone()).unwrap_or_default(),
                points_delivered: points,
                stories_completed: count,
                contribution_pct: if total > 0.0 { points * 100.0 / total } else { 0.0 },
                avg_points_per_sprint: avg,
                utilization,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points_delivered
            .total_cmp(&a.points_delivered)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });
    rows
}
