//! Recommendation synthesis.
//!
//! Turns already-computed priority and risk results into an ordered list of
//! actions. Nothing here recomputes a score.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::{MemberUtilization, SprintHealth};
use crate::prioritization::{CapacityAllocation, PriorityResult, Quadrant, QuadrantComposition};
use crate::records::{Initiative, InitiativeStatus, StoryRecord, StrategicCategory};
use crate::risk::{recommended_commitment, ForecastMethod, ForecastResult, RiskLevel, RiskResult};
use crate::stats;
use crate::storage::RecommendationConfig;

/// Slope below which the velocity forecast is reported as declining.
const DECLINING_SLOPE: f64 = -0.5;

/// What to do with an initiative. Variants are listed in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecommendationAction {
    Intervene,
    Prioritize,
    Deprioritize,
}

impl fmt::Display for RecommendationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecommendationAction::Intervene => "Intervene",
            RecommendationAction::Prioritize => "Prioritize",
            RecommendationAction::Deprioritize => "Deprioritize",
        };
        f.write_str(label)
    }
}

/// One ranked action item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position in the output
    pub rank: usize,
    pub action: RecommendationAction,
    pub initiative_id: String,
    pub name: String,
    pub rationale: String,
    pub priority_score: Option<f64>,
    pub risk_score: Option<f64>,
}

/// Build the ordered action list.
///
/// 1. Intervene on every High-risk initiative, riskiest first.
/// 2. Prioritize up to `quick_win_limit` open Quick Wins, best score first.
/// 3. Deprioritize every Time Sink still in the backlog, lowest score first.
///
/// Ties break on initiative id.
pub fn synthesize(
    priorities: &[PriorityResult],
    risks: &[RiskResult],
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    let score_of = |id: &str| {
        priorities
            .iter()
            .find(|p| p.initiative_id == id)
            .map(|p| p.priority_score)
    };
    let risk_of = |id: &str| {
        risks
            .iter()
            .find(|r| r.initiative_id == id)
            .map(|r| r.risk_score)
    };

    let mut high_risk: Vec<&RiskResult> = risks
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .collect();
    high_risk.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.initiative_id.cmp(&b.initiative_id))
    });

    let mut quick_wins: Vec<&PriorityResult> = priorities
        .iter()
        .filter(|p| p.quadrant == Quadrant::QuickWin && p.status.is_open())
        .collect();
    quick_wins.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.initiative_id.cmp(&b.initiative_id))
    });
    quick_wins.truncate(config.quick_win_limit);

    let mut sinks: Vec<&PriorityResult> = priorities
        .iter()
        .filter(|p| p.quadrant == Quadrant::TimeSink && p.status == InitiativeStatus::Backlog)
        .collect();
    sinks.sort_by(|a, b| {
        a.priority_score
            .total_cmp(&b.priority_score)
            .then_with(|| a.initiative_id.cmp(&b.initiative_id))
    });

    let mut out = Vec::with_capacity(high_risk.len() + quick_wins.len() + sinks.len());

    for risk in high_risk {
        out.push(Recommendation {
            rank: 0,
            action: RecommendationAction::Intervene,
            initiative_id: risk.initiative_id.clone(),
            name: risk.name.clone(),
            rationale: format!(
                "Risk score {:.2} with {:.0} points remaining over {} sprint(s). {}",
                risk.risk_score, risk.remaining_points, risk.sprints_available, risk.recommendation
            ),
            priority_score: score_of(&risk.initiative_id),
            risk_score: Some(risk.risk_score),
        });
    }
    for win in quick_wins {
        out.push(Recommendation {
            rank: 0,
            action: RecommendationAction::Prioritize,
            initiative_id: win.initiative_id.clone(),
            name: win.name.clone(),
            rationale: format!(
                "Quick win (impact {:.1}, effort {:.1}) with priority {:.2}; schedule for the next sprint",
                win.impact, win.effort, win.priority_score
            ),
            priority_score: Some(win.priority_score),
            risk_score: risk_of(&win.initiative_id),
        });
    }
    for sink in sinks {
        out.push(Recommendation {
            rank: 0,
            action: RecommendationAction::Deprioritize,
            initiative_id: sink.initiative_id.clone(),
            name: sink.name.clone(),
            rationale: format!(
                "Time sink (impact {:.1}, effort {:.1}); free the capacity for higher-value work",
                sink.impact, sink.effort
            ),
            priority_score: Some(sink.priority_score),
            risk_score: risk_of(&sink.initiative_id),
        });
    }

    for (i, rec) in out.iter_mut().enumerate() {
        rec.rank = i + 1;
    }
    tracing::debug!(recommendations = out.len(), "synthesized recommendations");
    out
}

/// Urgency of a delivery insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    SprintHealth,
    Estimation,
    VelocityTrend,
    CapacityPlanning,
    CycleTime,
    TeamCapacity,
    PortfolioBalance,
    CapacityOvercommitment,
    StrategicAlignment,
}

/// A team-level observation with a suggested response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInsight {
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub insight: String,
    pub action: String,
}

/// Team-level insights for the latest sprint in `health`.
///
/// Estimation and cycle time look at the trailing `insight_window` sprints
/// ending at the latest one.
pub fn delivery_insights(
    health: &BTreeMap<u32, SprintHealth>,
    stories: &[StoryRecord],
    team: &[MemberUtilization],
    forecast: &ForecastResult,
    velocities: &[f64],
    config: &RecommendationConfig,
) -> Vec<DeliveryInsight> {
    let mut insights = Vec::new();
    let Some(latest) = health.values().next_back() else {
        return insights;
    };
    let window_start = latest
        .sprint_number
        .saturating_sub(config.insight_window.saturating_sub(1));

    if let Some(score) = latest.composite_score.filter(|s| *s < config.health_threshold) {
        insights.push(DeliveryInsight {
            category: InsightCategory::SprintHealth,
            priority: InsightPriority::High,
            insight: format!(
                "Sprint {} health is {score:.0}/100, below the {:.0} threshold",
                latest.sprint_number, config.health_threshold
            ),
            action: "Review sprint commitments and address blockers early; consider reducing scope".to_string(),
        });
    }

    let (weighted, counted) = health
        .range(window_start..)
        .map(|(_, h)| h)
        .filter(|h| h.story_count > 0)
        .fold((0.0, 0usize), |(sum, n), h| {
            (sum + h.accuracy_component * h.story_count as f64, n + h.story_count)
        });
    if counted > 0 {
        let accuracy = weighted / counted as f64;
        if accuracy < config.accuracy_threshold {
            insights.push(DeliveryInsight {
                category: InsightCategory::Estimation,
                priority: InsightPriority::Medium,
                insight: format!(
                    "Estimation accuracy over the last {} sprint(s) is {accuracy:.0}%, below the {:.0}% threshold",
                    config.insight_window, config.accuracy_threshold
                ),
                action: "Run an estimation calibration session for historically underestimated work".to_string(),
            });
        }
    }

    let recent_cycle_times: Vec<f64> = stories
        .iter()
        .filter(|s| s.is_completed() && s.sprint_number >= window_start && s.sprint_number <= latest.sprint_number)
        .map(|s| s.cycle_time_days.max(0.0))
        .collect();
    if let Some(cycle) = stats::mean(&recent_cycle_times).filter(|c| *c > config.cycle_time_threshold_days) {
        insights.push(DeliveryInsight {
            category: InsightCategory::CycleTime,
            priority: InsightPriority::Medium,
            insight: format!(
                "Average cycle time is {cycle:.1} days, above the {:.0}-day target",
                config.cycle_time_threshold_days
            ),
            action: "Break large stories into smaller increments and review WIP limits".to_string(),
        });
    }

    let overloaded: Vec<&MemberUtilization> = team
        .iter()
        .filter(|m| m.utilization.is_some_and(|u| u > config.overutilization_threshold))
        .collect();
    if !overloaded.is_empty() {
        let names: Vec<&str> = overloaded
            .iter()
            .take(2)
            .map(|m| if m.name.is_empty() { m.member_id.as_str() } else { m.name.as_str() })
            .collect();
        insights.push(DeliveryInsight {
            category: InsightCategory::TeamCapacity,
            priority: InsightPriority::High,
            insight: format!(
                "{} team member(s) over-utilized (>{:.0}%): {}",
                overloaded.len(),
                config.overutilization_threshold * 100.0,
                names.join(", ")
            ),
            action: "Rebalance work across the team or add capacity where it bottlenecks; sustained overload risks burnout"
                .to_string(),
        });
    }

    if forecast.method == ForecastMethod::Trend && forecast.slope < DECLINING_SLOPE {
        if let Some(next) = forecast.next() {
            insights.push(DeliveryInsight {
                category: InsightCategory::VelocityTrend,
                priority: InsightPriority::Medium,
                insight: format!(
                    "Velocity is declining by {:.1} points per sprint; next sprint forecast is {:.0}",
                    -forecast.slope, next.predicted_velocity
                ),
                action: "Look for new blockers, attrition or unplanned work before committing".to_string(),
            });
        }
    }

    if let Some(commitment) = recommended_commitment(velocities, config) {
        insights.push(DeliveryInsight {
            category: InsightCategory::CapacityPlanning,
            priority: InsightPriority::High,
            insight: format!(
                "Recent velocity over the last {} sprint(s) supports committing {commitment} points",
                config.commitment_window.min(velocities.len())
            ),
            action: format!("Commit about {commitment} points next sprint to keep a sustainable completion rate"),
        });
    }

    insights
}

/// Portfolio-level insights: quadrant balance, demand against the capacity
/// plan and revenue focus.
pub fn portfolio_insights(
    initiatives: &[Initiative],
    composition: &[QuadrantComposition],
    allocation: &CapacityAllocation,
    config: &RecommendationConfig,
) -> Vec<DeliveryInsight> {
    let mut insights = Vec::new();

    if let Some(major) = composition
        .iter()
        .find(|c| c.quadrant == Quadrant::MajorProject)
        .filter(|c| c.initiative_pct > config.major_project_share_pct)
    {
        insights.push(DeliveryInsight {
            category: InsightCategory::PortfolioBalance,
            priority: InsightPriority::Medium,
            insight: format!(
                "Major projects make up {:.0}% of the portfolio, above {:.0}%",
                major.initiative_pct, config.major_project_share_pct
            ),
            action: "Balance the portfolio with quick wins to keep value flowing while major projects are in progress"
                .to_string(),
        });
    }

    let overcommitted = if allocation.available_capacity > 0.0 {
        allocation.required_points * 100.0 / allocation.available_capacity > config.overcommitment_pct
    } else {
        allocation.required_points > 0.0
    };
    if overcommitted {
        insights.push(DeliveryInsight {
            category: InsightCategory::CapacityOvercommitment,
            priority: InsightPriority::High,
            insight: format!(
                "Open initiatives need {:.0} points but only {:.0} are available in the capacity plan",
                allocation.required_points, allocation.available_capacity
            ),
            action: "Descope or deprioritize initiatives to match team capacity".to_string(),
        });
    }

    if !initiatives.is_empty() {
        let revenue = initiatives
            .iter()
            .filter(|i| i.strategic_category == StrategicCategory::RevenueGrowth)
            .count();
        let share = revenue as f64 * 100.0 / initiatives.len() as f64;
        if share < config.revenue_focus_pct {
            insights.push(DeliveryInsight {
                category: InsightCategory::StrategicAlignment,
                priority: InsightPriority::Medium,
                insight: format!("Only {share:.0}% of initiatives target revenue growth"),
                action: "Increase focus on revenue-generating initiatives to support business goals".to_string(),
            });
        }
    }

    insights
}
