mod cache;
mod config;

pub use cache::{fingerprint, ResultCache};
pub use config::{
    AnalyticsConfig, ForecastConfig, HealthConfig, HealthWeights, PriorityConfig,
    QuadrantThresholds, RecommendationConfig, RiskConfig, RiskWeights, SamplingMethod,
    SimulationConfig, TierThresholds,
};

use std::path::PathBuf;

fn env_suffix() -> &'static str {
    match std::env::var("SPRINTSCOPE_ENV").as_deref() {
        Ok("dev") => "sprintscope-dev",
        _ => "sprintscope",
    }
}

/// Returns `~/.config/sprintscope[-dev]/` based on SPRINTSCOPE_ENV.
///
/// Set SPRINTSCOPE_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(env_suffix());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the platform cache directory for memoized results.
///
/// # Errors
/// Returns an error if creating the cache directory fails.
pub fn cache_dir() -> std::io::Result<PathBuf> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(env_suffix());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
