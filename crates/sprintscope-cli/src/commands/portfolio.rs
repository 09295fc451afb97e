use clap::Args;
use serde::Serialize;
use sprintscope_core::metrics::{compute_sprint_health, velocity_history};
use sprintscope_core::prioritization::{
    allocate_capacity, portfolio_composition, portfolio_health, CapacityAllocation,
    PortfolioHealth, QuadrantComposition,
};
use sprintscope_core::{
    assess_portfolio_risk, score_portfolio, synthesize, PriorityResult, Recommendation, RiskResult,
    Table, TeamState,
};

use super::context::{print_json, CommandResult, Context, GlobalArgs};

#[derive(Args)]
pub struct PrioritizeArgs {
    /// Show only the top N initiatives
    #[arg(long)]
    pub top: Option<usize>,

    /// Include composition, portfolio health and a capacity plan
    #[arg(long)]
    pub portfolio: bool,

    /// Sprints of capacity for the plan
    #[arg(long, default_value_t = 3)]
    pub sprints: u32,
}

#[derive(Serialize)]
struct PortfolioView {
    ranking: Vec<PriorityResult>,
    composition: Vec<QuadrantComposition>,
    health: PortfolioHealth,
    allocation: CapacityAllocation,
}

pub fn prioritize(args: PrioritizeArgs, global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;
    ctx.dataset.require(Table::Initiatives)?;

    let mut ranking: Vec<PriorityResult> = ctx.cached("prioritize", &(), false, |ctx| {
        Ok(score_portfolio(&ctx.dataset.initiatives, &ctx.config.priority)?)
    })?;

    if !args.portfolio {
        if let Some(top) = args.top {
            ranking.truncate(top);
        }
        return print_json(&ranking);
    }

    let health = compute_sprint_health(&ctx.dataset.sprints, &ctx.dataset.stories, &ctx.config.health)?;
    let velocities = velocity_history(&health);
    let view = PortfolioView {
        composition: portfolio_composition(&ranking),
        health: portfolio_health(&ranking),
        allocation: allocate_capacity(&ranking, &velocities, args.sprints),
        ranking: match args.top {
            Some(top) => ranking.into_iter().take(top).collect(),
            None => ranking,
        },
    };
    print_json(&view)
}

#[derive(Args)]
pub struct RiskArgs {
    /// Only this initiative
    #[arg(long)]
    pub initiative: Option<String>,
}

pub fn risk(args: RiskArgs, global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;
    ctx.dataset.require(Table::Sprints)?;
    ctx.dataset.require(Table::Initiatives)?;

    let risks: Vec<RiskResult> = ctx.cached("risk", &(), false, |ctx| Ok(portfolio_risk(ctx)?))?;

    match args.initiative {
        Some(id) => {
            let result = risks
                .iter()
                .find(|r| r.initiative_id == id)
                .ok_or_else(|| format!("initiative {id} not found among active and backlog initiatives"))?;
            print_json(result)
        }
        None => print_json(&risks),
    }
}

pub fn recommend(global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;

    let recommendations: Vec<Recommendation> = ctx.cached("recommend", &(), false, |ctx| {
        let priorities = score_portfolio(&ctx.dataset.initiatives, &ctx.config.priority)?;
        let risks = portfolio_risk(ctx)?;
        Ok(synthesize(&priorities, &risks, &ctx.config.recommendations))
    })?;
    print_json(&recommendations)
}

fn portfolio_risk(ctx: &Context) -> Result<Vec<RiskResult>, sprintscope_core::ConfigError> {
    let health = compute_sprint_health(&ctx.dataset.sprints, &ctx.dataset.stories, &ctx.config.health)?;
    let velocities = velocity_history(&health);
    let team = TeamState::from_sprints(&ctx.dataset.sprints).unwrap_or(TeamState {
        current_sprint: 0,
        utilization: None,
    });
    assess_portfolio_risk(&ctx.dataset.initiatives, &team, &velocities, &ctx.config.risk)
}
