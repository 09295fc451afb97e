use clap::{Args, ValueEnum};
use serde::Serialize;
use sprintscope_core::metrics::{compute_sprint_health, velocity_history};
use sprintscope_core::risk::{completion_curve, entropy_seed, recommended_commitment, CurvePoint};
use sprintscope_core::storage::SamplingMethod;
use sprintscope_core::{run_completion_simulation, SimulationOutcome, Table};

use super::context::{print_json, CommandResult, Context, GlobalArgs};

#[derive(Clone, Copy, ValueEnum)]
pub enum Sampling {
    Empirical,
    Normal,
}

impl From<Sampling> for SamplingMethod {
    fn from(value: Sampling) -> Self {
        match value {
            Sampling::Empirical => SamplingMethod::Empirical,
            Sampling::Normal => SamplingMethod::Normal,
        }
    }
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Points to deliver (defaults to the recommended commitment)
    #[arg(long)]
    pub target: Option<f64>,

    /// Number of trials (defaults to simulation.trials)
    #[arg(long)]
    pub trials: Option<usize>,

    /// Sprints summed per trial (defaults to simulation.horizon_sprints)
    #[arg(long)]
    pub sprints: Option<usize>,

    #[arg(long, value_enum)]
    pub sampling: Option<Sampling>,

    /// Probability for each of these comma-separated targets instead
    #[arg(long, value_delimiter = ',', conflicts_with = "target")]
    pub curve: Vec<f64>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum SimulationView {
    Single(SimulationOutcome),
    Curve { seed: u64, points: Vec<CurvePoint> },
}

pub fn run(args: SimulateArgs, global: &GlobalArgs) -> CommandResult {
    let mut ctx = Context::load(global)?;
    ctx.dataset.require(Table::Sprints)?;

    if let Some(trials) = args.trials {
        ctx.config.simulation.trials = trials;
    }
    if let Some(sprints) = args.sprints {
        ctx.config.simulation.horizon_sprints = sprints;
    }
    if let Some(sampling) = args.sampling {
        ctx.config.simulation.sampling = sampling.into();
    }
    ctx.config.validate()?;

    let health = compute_sprint_health(&ctx.dataset.sprints, &ctx.dataset.stories, &ctx.config.health)?;
    let velocities = velocity_history(&health);

    if !args.curve.is_empty() {
        let seed = ctx.seed().unwrap_or_else(entropy_seed);
        let view = SimulationView::Curve {
            seed,
            points: completion_curve(&velocities, &args.curve, &ctx.config.simulation, seed),
        };
        return print_json(&view);
    }

    let target = match args.target {
        Some(target) => target,
        None => recommended_commitment(&velocities, &ctx.config.recommendations)
            .map(f64::from)
            .ok_or("no velocity history to derive a target from; pass --target")?,
    };

    let outcome: SimulationOutcome = ctx.cached("simulate", &target.to_bits(), true, |ctx| {
        let mut rng = ctx.rng();
        Ok(run_completion_simulation(&velocities, target, &ctx.config.simulation, &mut rng))
    })?;
    print_json(&SimulationView::Single(outcome))
}
