//! Input records and data-quality annotations.
//!
//! Records mirror the four delivery tables (sprints, stories, initiatives,
//! team). Enum labels accept both the snake-case wire names and the human
//! labels found in exported spreadsheets ("Technical Debt", "In Progress").

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sprint's commitment and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintRecord {
    pub sprint_number: u32,
    pub committed_points: f64,
    pub completed_points: f64,
    pub team_capacity: f64,
    /// Signed so a bad row is flagged by validation instead of failing the parse
    pub team_size: i64,
    pub duration_days: i64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Kind of work a story represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoryType {
    Feature,
    Bug,
    #[serde(alias = "Technical Debt", alias = "Tech Debt")]
    TechDebt,
    Spike,
}

/// Delivery state of a story at sprint close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryStatus {
    Completed,
    #[serde(alias = "In Progress")]
    InProgress,
    #[serde(alias = "Not Started")]
    NotStarted,
    Blocked,
    #[serde(alias = "Carried Over")]
    CarriedOver,
}

/// A single backlog item worked in a sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub story_id: String,
    pub sprint_number: u32,
    /// Points estimated at planning time
    pub story_points: f64,
    /// Points after re-estimation at close
    pub final_story_points: f64,
    pub story_type: StoryType,
    pub status: StoryStatus,
    #[serde(default)]
    pub cycle_time_days: f64,
    /// Negative counts are treated as zero
    #[serde(default)]
    pub num_blockers: i64,
    pub assignee_id: String,
    #[serde(default)]
    pub initiative_id: Option<String>,
}

impl StoryRecord {
    pub fn is_completed(&self) -> bool {
        self.status == StoryStatus::Completed
    }

    pub fn is_blocked(&self) -> bool {
        self.num_blockers > 0
    }
}

/// Strategic theme an initiative contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategicCategory {
    #[serde(alias = "Revenue Growth")]
    RevenueGrowth,
    #[serde(alias = "Customer Experience")]
    CustomerExperience,
    #[serde(alias = "Cost Reduction")]
    CostReduction,
    #[serde(alias = "Process Improvement")]
    ProcessImprovement,
    #[serde(alias = "Technical Excellence")]
    TechnicalExcellence,
}

impl StrategicCategory {
    pub const ALL: [StrategicCategory; 5] = [
        StrategicCategory::RevenueGrowth,
        StrategicCategory::CustomerExperience,
        StrategicCategory::CostReduction,
        StrategicCategory::ProcessImprovement,
        StrategicCategory::TechnicalExcellence,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StrategicCategory::RevenueGrowth => "Revenue Growth",
            StrategicCategory::CustomerExperience => "Customer Experience",
            StrategicCategory::CostReduction => "Cost Reduction",
            StrategicCategory::ProcessImprovement => "Process Improvement",
            StrategicCategory::TechnicalExcellence => "Technical Excellence",
        }
    }
}

impl fmt::Display for StrategicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Portfolio lifecycle state of an initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitiativeStatus {
    Completed,
    Active,
    Backlog,
    Deprioritized,
}

impl InitiativeStatus {
    /// Active and backlog initiatives still compete for capacity.
    pub fn is_open(&self) -> bool {
        matches!(self, InitiativeStatus::Active | InitiativeStatus::Backlog)
    }
}

/// Coarse return-on-investment estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoiEstimate {
    High,
    Medium,
    Low,
}

impl RoiEstimate {
    pub const ALL: [RoiEstimate; 3] = [RoiEstimate::High, RoiEstimate::Medium, RoiEstimate::Low];
}

impl fmt::Display for RoiEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RoiEstimate::High => "High",
            RoiEstimate::Medium => "Medium",
            RoiEstimate::Low => "Low",
        };
        f.write_str(label)
    }
}

/// A portfolio initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub initiative_id: String,
    #[serde(default)]
    pub name: String,
    /// Business impact, 0-10
    pub impact_score: f64,
    /// Delivery effort, (0-10]
    pub effort_score: f64,
    pub strategic_category: StrategicCategory,
    pub status: InitiativeStatus,
    pub total_story_points: f64,
    #[serde(default)]
    pub completed_story_points: f64,
    pub roi_estimate: RoiEstimate,
    /// Sprint in which work started
    #[serde(default)]
    pub start_sprint: Option<u32>,
    /// Sprint by which delivery is expected
    #[serde(default)]
    pub target_sprint: Option<u32>,
}

impl Initiative {
    pub fn remaining_points(&self) -> f64 {
        (self.total_story_points - self.completed_story_points).max(0.0)
    }
}

/// A team member and their nominal capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub member_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub avg_capacity_per_sprint: f64,
}

/// What was wrong with an input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Negative where only non-negative values are meaningful
    Negative,
    /// Outside the documented range
    OutOfRange,
    /// NaN or infinite
    NonFinite,
    /// Effort of zero would divide by zero
    ZeroEffort,
    /// Nothing committed, completion rate undefined
    ZeroCommitment,
    /// No completed story carried a non-zero estimate
    NoEstimatedStories,
    /// Completed points exceed total points
    CompletedExceedsTotal,
    /// Foreign key points at a record that does not exist
    UnknownReference,
    /// Identifier appears more than once
    DuplicateId,
    /// Too few historical samples for a statistic
    InsufficientHistory,
}

/// A recovered data-quality problem, attached to the result it affected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    /// Human-readable record reference, e.g. "initiative INI-004"
    pub record: String,
    pub field: String,
    pub kind: IssueKind,
    /// Original value, when numeric
    pub original: Option<f64>,
    /// Value used in its place
    pub substituted: Option<f64>,
}

impl DataQualityIssue {
    pub fn new(record: impl Into<String>, field: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            record: record.into(),
            field: field.into(),
            kind,
            original: None,
            substituted: None,
        }
    }

    pub fn with_values(mut self, original: f64, substituted: f64) -> Self {
        self.original = Some(original);
        self.substituted = Some(substituted);
        self
    }
}

/// Clamp `value` into `[min, max]`, recording and logging any correction.
///
/// Non-finite values become `min`.
pub(crate) fn clamp_input(
    value: f64,
    min: f64,
    max: f64,
    record: &str,
    field: &str,
    issues: &mut Vec<DataQualityIssue>,
) -> f64 {
    let (kind, substituted) = if !value.is_finite() {
        (IssueKind::NonFinite, min)
    } else if value < min {
        let kind = if value < 0.0 && min >= 0.0 {
            IssueKind::Negative
        } else {
            IssueKind::OutOfRange
        };
        (kind, min)
    } else if value > max {
        (IssueKind::OutOfRange, max)
    } else {
        return value;
    };

    tracing::warn!(
        record,
        field,
        original = value,
        substituted,
        "clamped out-of-range input"
    );
    issues.push(DataQualityIssue::new(record, field, kind).with_values(value, substituted));
    substituted
}
