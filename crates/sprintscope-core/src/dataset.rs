//! The four delivery tables bundled together.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::records::{
    DataQualityIssue, Initiative, IssueKind, SprintRecord, StoryRecord, TeamMember,
};

/// Sprints, stories, initiatives and team members.
///
/// Every table is optional in the JSON form so partial exports still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub sprints: Vec<SprintRecord>,
    #[serde(default)]
    pub stories: Vec<StoryRecord>,
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
}

/// Table names, used when a computation needs a table to be non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Sprints,
    Stories,
    Initiatives,
    Team,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Sprints => "sprints",
            Table::Stories => "stories",
            Table::Initiatives => "initiatives",
            Table::Team => "team",
        };
        f.write_str(name)
    }
}

impl Dataset {
    pub fn from_json_str(content: &str) -> Result<Self, DatasetError> {
        let dataset: Dataset = serde_json::from_str(content)?;
        tracing::debug!(
            sprints = dataset.sprints.len(),
            stories = dataset.stories.len(),
            initiatives = dataset.initiatives.len(),
            team = dataset.team.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Fail with [`DatasetError::EmptyTable`] when `table` has no rows.
    pub fn require(&self, table: Table) -> Result<(), DatasetError> {
        let empty = match table {
            Table::Sprints => self.sprints.is_empty(),
            Table::Stories => self.stories.is_empty(),
            Table::Initiatives => self.initiatives.is_empty(),
            Table::Team => self.team.is_empty(),
        };
        if empty {
            return Err(DatasetError::EmptyTable(table.to_string()));
        }
        Ok(())
    }

    /// Highest sprint number present.
    pub fn current_sprint(&self) -> Option<u32> {
        self.sprints.iter().map(|s| s.sprint_number).max()
    }

    /// Report duplicate ids, dangling references and out-of-bound values.
    ///
    /// Nothing is corrected here; the engines recover from the same problems
    /// on their own.
    pub fn validate(&self) -> Vec<DataQualityIssue> {
        let mut issues = Vec::new();

        let sprint_numbers = collect_ids(
            self.sprints.iter().map(|s| s.sprint_number.to_string()),
            "sprint",
            "sprint_number",
            &mut issues,
        );
        collect_ids(
            self.stories.iter().map(|s| s.story_id.clone()),
            "story",
            "story_id",
            &mut issues,
        );
        let initiative_ids = collect_ids(
            self.initiatives.iter().map(|i| i.initiative_id.clone()),
            "initiative",
            "initiative_id",
            &mut issues,
        );
        let member_ids = collect_ids(
            self.team.iter().map(|m| m.member_id.clone()),
            "member",
            "member_id",
            &mut issues,
        );

        for sprint in &self.sprints {
            let record = format!("sprint {}", sprint.sprint_number);
            for (field, value) in [
                ("committed_points", sprint.committed_points),
                ("completed_points", sprint.completed_points),
                ("team_capacity", sprint.team_capacity),
            ] {
                check_non_negative(&record, field, value, &mut issues);
            }
            for (field, value) in [("team_size", sprint.team_size), ("duration_days", sprint.duration_days)] {
                check_non_negative(&record, field, value as f64, &mut issues);
            }
        }

        for story in &self.stories {
            let record = format!("story {}", story.story_id);
            if !sprint_numbers.contains(&story.sprint_number.to_string()) {
                issues.push(DataQualityIssue::new(record.as_str(), "sprint_number", IssueKind::UnknownReference));
            }
            if let Some(initiative) = &story.initiative_id {
                if !initiative_ids.contains(initiative) {
                    issues.push(DataQualityIssue::new(record.as_str(), "initiative_id", IssueKind::UnknownReference));
                }
            }
            if !member_ids.is_empty() && !member_ids.contains(&story.assignee_id) {
                issues.push(DataQualityIssue::new(record.as_str(), "assignee_id", IssueKind::UnknownReference));
            }
            check_non_negative(&record, "story_points", story.story_points, &mut issues);
            check_non_negative(&record, "final_story_points", story.final_story_points, &mut issues);
            check_non_negative(&record, "cycle_time_days", story.cycle_time_days, &mut issues);
            check_non_negative(&record, "num_blockers", story.num_blockers as f64, &mut issues);
        }

        for initiative in &self.initiatives {
            let record = format!("initiative {}", initiative.initiative_id);
            check_range(&record, "impact_score", initiative.impact_score, 0.0, 10.0, &mut issues);
            if initiative.effort_score == 0.0 {
                issues.push(
                    DataQualityIssue::new(record.as_str(), "effort_score", IssueKind::ZeroEffort)
                        .with_values(0.0, 1.0),
                );
            } else {
                check_range(&record, "effort_score", initiative.effort_score, 0.0, 10.0, &mut issues);
            }
            check_non_negative(&record, "total_story_points", initiative.total_story_points, &mut issues);
            if initiative.completed_story_points > initiative.total_story_points {
                issues.push(DataQualityIssue::new(
                    record.as_str(),
                    "completed_story_points",
                    IssueKind::CompletedExceedsTotal,
                ));
            }
        }

        for member in &self.team {
            let capacity = member.avg_capacity_per_sprint;
            if capacity.is_nan() || capacity <= 0.0 {
                issues.push(DataQualityIssue::new(
                    format!("member {}", member.member_id),
                    "avg_capacity_per_sprint",
                    IssueKind::OutOfRange,
                ));
            }
        }

        if !issues.is_empty() {
            tracing::warn!(issues = issues.len(), "dataset has data-quality issues");
        }
        issues
    }
}

fn collect_ids(
    ids: impl Iterator<Item = String>,
    kind: &str,
    field: &str,
    issues: &mut Vec<DataQualityIssue>,
) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut reported = BTreeSet::new();
    for id in ids {
        if !seen.insert(id.clone()) && reported.insert(id.clone()) {
            issues.push(DataQualityIssue::new(format!("{kind} {id}"), field, IssueKind::DuplicateId));
        }
    }
    seen
}

fn check_non_negative(record: &str, field: &str, value: f64, issues: &mut Vec<DataQualityIssue>) {
    if !value.is_finite() {
        issues.push(DataQualityIssue::new(record, field, IssueKind::NonFinite));
    } else if value < 0.0 {
        issues.push(DataQualityIssue::new(record, field, IssueKind::Negative));
    }
}

fn check_range(record: &str, field: &str, value: f64, min: f64, max: f64, issues: &mut Vec<DataQualityIssue>) {
    if !value.is_finite() {
        issues.push(DataQualityIssue::new(record, field, IssueKind::NonFinite));
    } else if value < min || value > max {
        let kind = if value < 0.0 { IssueKind::Negative } else { IssueKind::OutOfRange };
        issues.push(DataQualityIssue::new(record, field, kind));
    }
}
