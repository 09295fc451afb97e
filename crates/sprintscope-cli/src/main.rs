use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::context::GlobalArgs;

#[derive(Parser)]
#[command(name = "sprintscope", version, about = "Sprint and portfolio analytics")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-sprint health scores
    Health(commands::metrics::HealthArgs),
    /// Rank initiatives by priority score
    Prioritize(commands::portfolio::PrioritizeArgs),
    /// Delivery risk of open initiatives
    Risk(commands::portfolio::RiskArgs),
    /// Velocity forecast for the coming sprints
    Forecast(commands::metrics::ForecastArgs),
    /// Monte Carlo probability of delivering a target
    Simulate(commands::simulate::SimulateArgs),
    /// Ranked action items
    Recommend,
    /// Full analysis report
    Report,
    /// Check the dataset for data-quality problems
    Validate,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays clean JSON.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sprintscope=info,sprintscope_core=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action, &cli.global),
        Commands::Health(args) => commands::metrics::health(args, &cli.global),
        Commands::Forecast(args) => commands::metrics::forecast(args, &cli.global),
        Commands::Prioritize(args) => commands::portfolio::prioritize(args, &cli.global),
        Commands::Risk(args) => commands::portfolio::risk(args, &cli.global),
        Commands::Recommend => commands::portfolio::recommend(&cli.global),
        Commands::Simulate(args) => commands::simulate::run(args, &cli.global),
        Commands::Report => commands::report::report(&cli.global),
        Commands::Validate => commands::report::validate(&cli.global),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
