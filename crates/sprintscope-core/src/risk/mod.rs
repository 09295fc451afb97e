//! Risk and forecast engine.
//!
//! - [`score_risk`]: weighted capacity/volatility/utilization/progress risk
//! - [`run_completion_simulation`]: Monte Carlo probability of reaching a target,
//!   with the random source passed in by the caller
//! - [`forecast_velocity`]: linear trend with a residual band

mod forecast;
mod score;
mod simulation;

pub use forecast::{
    forecast_velocity, recommended_commitment, ForecastMethod, ForecastPoint, ForecastResult,
};
pub use score::{
    assess_portfolio_risk, score_risk, RiskFactor, RiskFactorKind, RiskLevel, RiskResult,
    TeamState,
};
pub use simulation::{
    completion_curve, entropy_rng, entropy_seed, rng_for, run_completion_simulation, seeded_rng,
    CompletionForecast, CurvePoint, HistogramBin, SimulationOutcome, UndefinedReason,
};

/// Generator type returned by [`seeded_rng`] and [`entropy_rng`].
pub use rand_pcg::Mcg128Xsl64;
