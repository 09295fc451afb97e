use clap::Args;
use sprintscope_core::metrics::{compute_sprint_health, velocity_history, SprintHealth};
use sprintscope_core::{forecast_velocity, ForecastResult, Table};

use super::context::{print_json, CommandResult, Context, GlobalArgs};

#[derive(Args)]
pub struct HealthArgs {
    /// Only this sprint
    #[arg(long)]
    pub sprint: Option<u32>,
}

pub fn health(args: HealthArgs, global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;
    ctx.dataset.require(Table::Sprints)?;

    let health: Vec<SprintHealth> = ctx.cached("health", &(), false, |ctx| {
        let map = compute_sprint_health(&ctx.dataset.sprints, &ctx.dataset.stories, &ctx.config.health)?;
        Ok(map.into_values().collect())
    })?;

    match args.sprint {
        Some(number) => {
            let sprint = health
                .iter()
                .find(|h| h.sprint_number == number)
                .ok_or_else(|| format!("sprint {number} not found"))?;
            print_json(sprint)
        }
        None => print_json(&health),
    }
}

#[derive(Args)]
pub struct ForecastArgs {
    /// Sprints to forecast (defaults to forecast.horizon)
    #[arg(long)]
    pub horizon: Option<usize>,
}

pub fn forecast(args: ForecastArgs, global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;
    ctx.dataset.require(Table::Sprints)?;
    let horizon = args.horizon.unwrap_or(ctx.config.forecast.horizon);

    let result: ForecastResult = ctx.cached("forecast", &horizon, false, |ctx| {
        let health = compute_sprint_health(&ctx.dataset.sprints, &ctx.dataset.stories, &ctx.config.health)?;
        let velocities = velocity_history(&health);
        Ok(forecast_velocity(&velocities, horizon, &ctx.config.forecast))
    })?;
    print_json(&result)
}
