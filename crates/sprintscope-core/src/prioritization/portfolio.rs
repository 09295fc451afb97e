//! Portfolio-level views over scored initiatives.

use serde::{Deserialize, Serialize};

use super::{rank_order, PriorityResult, Quadrant};
use crate::records::InitiativeStatus;
use crate::stats;

/// Initiatives and points falling in one quadrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantComposition {
    pub quadrant: Quadrant,
    pub initiative_count: usize,
    pub total_points: f64,
    pub avg_impact: f64,
    pub avg_effort: f64,
    /// Share of initiatives (0-100)
    pub initiative_pct: f64,
    /// Share of story points (0-100)
    pub points_pct: f64,
}

/// Composition of the portfolio by quadrant. Empty quadrants are omitted.
pub fn portfolio_composition(results: &[PriorityResult]) -> Vec<QuadrantComposition> {
    let total_count = results.len() as f64;
    let total_points: f64 = results.iter().map(|r| r.total_points).sum();

    Quadrant::ALL
        .iter()
        .filter_map(|&quadrant| {
            let members: Vec<&PriorityResult> =
                results.iter().filter(|r| r.quadrant == quadrant).collect();
            if members.is_empty() {
                return None;
            }
            let impacts: Vec<f64> = members.iter().map(|r| r.impact).collect();
            let efforts: Vec<f64> = members.iter().map(|r| r.effort).collect();
            let points: f64 = members.iter().map(|r| r.total_points).sum();

            Some(QuadrantComposition {
                quadrant,
                initiative_count: members.len(),
                total_points: points,
                avg_impact: stats::mean(&impacts).unwrap_or(0.0),
                avg_effort: stats::mean(&efforts).unwrap_or(0.0),
                initiative_pct: members.len() as f64 * 100.0 / total_count,
                points_pct: if total_points > 0.0 {
                    points * 100.0 / total_points
                } else {
                    0.0
                },
            })
        })
        .collect()
}

/// Overall portfolio health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHealth {
    /// 0-100
    pub health_score: f64,
    pub quick_win_ratio: f64,
    pub time_sink_ratio: f64,
    pub completion_rate: f64,
    pub deprioritized_ratio: f64,
    pub active_count: usize,
    pub completed_count: usize,
    pub deprioritized_count: usize,
}

/// Blend of quick wins (30%), absence of time sinks (20%), completed
/// initiatives (30%) and absence of deprioritized ones (20%). An empty
/// portfolio scores 0.
pub fn portfolio_health(results: &[PriorityResult]) -> PortfolioHealth {
    let count_status = |status| results.iter().filter(|r| r.status == status).count();
    let active_count = count_status(InitiativeStatus::Active);
    let completed_count = count_status(InitiativeStatus::Completed);
    let deprioritized_count = count_status(InitiativeStatus::Deprioritized);

    if results.is_empty() {
        return PortfolioHealth {
            health_score: 0.0,
            quick_win_ratio: 0.0,
            time_sink_ratio: 0.0,
            completion_rate: 0.0,
            deprioritized_ratio: 0.0,
            active_count,
            completed_count,
            deprioritized_count,
        };
    }

    let total = results.len() as f64;
    let ratio = |quadrant| results.iter().filter(|r| r.quadrant == quadrant).count() as f64 / total;
    let quick_win_ratio = ratio(Quadrant::QuickWin);
    let time_sink_ratio = ratio(Quadrant::TimeSink);
    let completion_rate = completed_count as f64 / total;
    let deprioritized_ratio = deprioritized_count as f64 / total;

    let health_score = (quick_win_ratio * 0.30
        + (1.0 - time_sink_ratio) * 0.20
        + completion_rate * 0.30
        + (1.0 - deprioritized_ratio) * 0.20)
        * 100.0;

    PortfolioHealth {
        health_score,
        quick_win_ratio,
        time_sink_ratio,
        completion_rate,
        deprioritized_ratio,
        active_count,
        completed_count,
        deprioritized_count,
    }
}

/// Points assigned to one initiative by [`allocate_capacity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeAllocation {
    pub initiative_id: String,
    pub name: String,
    pub priority_score: f64,
    pub points_allocated: f64,
    /// False for the single partially funded initiative
    pub fits_in_capacity: bool,
}

/// Greedy capacity plan for the coming sprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAllocation {
    pub available_capacity: f64,
    /// Remaining points across every open initiative
    pub required_points: f64,
    pub capacity_used: f64,
    /// capacity_used / available_capacity in percent; 0 with no capacity
    pub utilization_pct: f64,
    pub allocations: Vec<InitiativeAllocation>,
    pub fully_allocated: usize,
}

/// Sprints of velocity averaged for the capacity estimate.
const CAPACITY_WINDOW: usize = 3;

/// Fill `future_sprints` worth of capacity with open initiatives in rank order.
///
/// Capacity is the mean of the last three velocities times `future_sprints`.
/// Initiatives are funded whole until one no longer fits; that one receives
/// whatever is left and allocation stops.
pub fn allocate_capacity(
    results: &[PriorityResult],
    velocities: &[f64],
    future_sprints: u32,
) -> CapacityAllocation {
    let recent = &velocities[velocities.len().saturating_sub(CAPACITY_WINDOW)..];
    let available_capacity = stats::mean(recent).unwrap_or(0.0).max(0.0) * future_sprints as f64;

    let mut pending: Vec<&PriorityResult> = results.iter().filter(|r| r.status.is_open()).collect();
    pending.sort_by(|a, b| rank_order(a, b));
    let required_points: f64 = pending.iter().map(|r| r.remaining_points).sum();

    let mut allocations = Vec::new();
    let mut used = 0.0;
    for result in pending {
        let remaining = result.remaining_points;
        if used + remaining <= available_capacity {
            used += remaining;
            allocations.push(allocation(result, remaining, true));
            continue;
        }
        let leftover = available_capacity - used;
        if leftover > 0.0 {
            allocations.push(allocation(result, leftover, false));
            used = available_capacity;
            break;
        }
    }

    CapacityAllocation {
        available_capacity,
        required_points,
        capacity_used: used,
        utilization_pct: if available_capacity > 0.0 {
            used * 100.0 / available_capacity
        } else {
            0.0
        },
        fully_allocated: allocations.iter().filter(|a| a.fits_in_capacity).count(),
        allocations,
    }
}

fn allocation(result: &PriorityResult, points: f64, fits: bool) -> InitiativeAllocation {
    InitiativeAllocation {
        initiative_id: result.initiative_id.clone(),
        name: result.name.clone(),
        priority_score: result.priority_score,
        points_allocated: points,
        fits_in_capacity: fits,
    }
}

/// Time-sink initiatives, most effort first (ties by id).
pub fn time_sinks(results: &[PriorityResult]) -> Vec<&PriorityResult> {
    let mut sinks: Vec<&PriorityResult> = results
        .iter()
        .filter(|r| r.quadrant == Quadrant::TimeSink)
        .collect();
    sinks.sort_by(|a, b| {
        b.effort
            .total_cmp(&a.effort)
            .then_with(|| a.initiative_id.cmp(&b.initiative_id))
    });
    sinks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prioritization::{score_initiative, tests::initiative};
    use crate::records::{RoiEstimate, StrategicCategory};
    use crate::storage::PriorityConfig;

    fn scored(id: &str, impact: f64, effort: f64, status: InitiativeStatus, points: f64) -> PriorityResult {
        let mut i = initiative(id, impact, effort, StrategicCategory::ProcessImprovement, RoiEstimate::Medium);
        i.status = status;
        i.total_story_points = points;
        score_initiative(&i, &PriorityConfig::default()).unwrap()
    }

    fn sample() -> Vec<PriorityResult> {
        vec![
            scored("QW1", 9.0, 2.0, InitiativeStatus::Backlog, 20.0),
            scored("QW2", 8.0, 3.0, InitiativeStatus::Active, 30.0),
            scored("MP1", 8.0, 9.0, InitiativeStatus::Completed, 100.0),
            scored("TS1", 2.0, 8.0, InitiativeStatus::Backlog, 50.0),
            scored("TS2", 1.0, 9.0, InitiativeStatus::Deprioritized, 0.0),
        ]
    }

    #[test]
    fn test_composition_percentages() {
        let composition = portfolio_composition(&sample());
        assert_eq!(composition.len(), 3);

        let quick = &composition[0];
        assert_eq!(quick.quadrant, Quadrant::QuickWin);
        assert_eq!(quick.initiative_count, 2);
        assert_eq!(quick.initiative_pct, 40.0);
        assert_eq!(quick.points_pct, 25.0);
        assert_eq!(quick.avg_impact, 8.5);

        assert!(portfolio_composition(&[]).is_empty());
    }

    #[test]
    fn test_portfolio_health_weights() {
        let health = portfolio_health(&sample());
        // 0.4×30 + 0.6×20 + 0.2×30 + 0.8×20
        assert!((health.health_score - 46.0).abs() < 1e-9);
        assert_eq!(health.active_count, 1);
        assert_eq!(health.completed_count, 1);
        assert_eq!(health.deprioritized_count, 1);
        assert_eq!(portfolio_health(&[]).health_score, 0.0);
    }

    #[test]
    fn test_allocation_is_greedy_with_one_partial() {
        let results = sample();
        // capacity: mean(20, 20, 20) × 2 = 40
        let plan = allocate_capacity(&results, &[99.0, 20.0, 20.0, 20.0], 2);
        assert_eq!(plan.available_capacity, 40.0);

        let ids: Vec<_> = plan.allocations.iter().map(|a| a.initiative_id.as_str()).collect();
        assert_eq!(ids, vec!["QW1", "QW2"]);
        assert!(plan.allocations[0].fits_in_capacity);
        assert_eq!(plan.allocations[1].points_allocated, 20.0);
        assert!(!plan.allocations[1].fits_in_capacity);
        assert_eq!(plan.capacity_used, 40.0);
        assert_eq!(plan.utilization_pct, 100.0);
        assert_eq!(plan.fully_allocated, 1);
    }

    #[test]
    fn test_allocation_lists_finished_work_after_exact_fill() {
        let mut results = sample();
        results.push(scored("DONE", 7.0, 7.0, InitiativeStatus::Active, 0.0));
        // capacity: 25 × 2 = 50, QW1 + QW2 fill it exactly
        let plan = allocate_capacity(&results, &[25.0, 25.0], 2);

        let ids: Vec<_> = plan.allocations.iter().map(|a| a.initiative_id.as_str()).collect();
        assert_eq!(ids, vec!["QW1", "QW2", "DONE"]);
        assert!(plan.allocations.iter().all(|a| a.fits_in_capacity));
        assert_eq!(plan.capacity_used, 50.0);
        assert_eq!(plan.required_points, 100.0);
    }

    #[test]
    fn test_allocation_without_history() {
        let plan = allocate_capacity(&sample(), &[], 3);
        assert_eq!(plan.available_capacity, 0.0);
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.utilization_pct, 0.0);
    }

    #[test]
    fn test_time_sinks_by_effort() {
        let results = sample();
        let sinks = time_sinks(&results);
        let ids: Vec<_> = sinks.iter().map(|r| r.initiative_id.as_str()).collect();
        assert_eq!(ids, vec!["TS2", "TS1"]);
    }
}
