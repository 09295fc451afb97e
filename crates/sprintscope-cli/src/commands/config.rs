use clap::Subcommand;
use sprintscope_core::AnalyticsConfig;

use super::context::{print_json, CommandResult, GlobalArgs};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "risk.weights.capacity", "simulation.trials")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// Show the effective configuration
    #[command(alias = "list")]
    Show,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction, global: &GlobalArgs) -> CommandResult {
    let path = global.config.as_deref();
    match action {
        ConfigAction::Get { key } => {
            let config = AnalyticsConfig::load(path)?;
            let value = config.get(&key).ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = AnalyticsConfig::load(path)?;
            config.set(&key, &value)?;
            config.save(path)?;
            println!("ok");
        }
        ConfigAction::Show => {
            let config = AnalyticsConfig::load(path)?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            AnalyticsConfig::default().save(path)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => AnalyticsConfig::default_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
