//! Sprint metrics engine.
//!
//! Turns raw sprint and story records into per-sprint health and the flow
//! metrics (trend, cycle time, utilization) the other engines build on.

mod delivery;
mod health;
mod team;

pub use delivery::{
    bug_ratio, capacity_utilization, carryover_rate, cycle_time_metrics, predictability_score,
    story_type_mix, velocity_trend, CapacityUtilization, CycleTimeMetrics, StoryTypeShare,
    TrendDirection, UtilizationStatus, VelocityTrend,
};
pub use health::{compute_sprint_health, velocity_history, SprintHealth};
pub use team::{member_utilization, MemberUtilization};
