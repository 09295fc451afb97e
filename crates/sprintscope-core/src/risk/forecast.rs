//! Velocity forecast and commitment guidance.

use serde::{Deserialize, Serialize};

use crate::stats;
use crate::storage::{ForecastConfig, RecommendationConfig};

/// How a forecast was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Least-squares trend with a residual band
    Trend,
    /// Single observation repeated, no band
    Flat,
    NoHistory,
}

/// Predicted velocity for one future sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// 1 for the next sprint
    pub sprint_offset: usize,
    pub predicted_velocity: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub method: ForecastMethod,
    pub points: Vec<ForecastPoint>,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub residual_std: f64,
}

impl ForecastResult {
    fn empty(method: ForecastMethod) -> Self {
        Self {
            method,
            points: Vec::new(),
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            residual_std: 0.0,
        }
    }

    /// Prediction for the next sprint, if any.
    pub fn next(&self) -> Option<&ForecastPoint> {
        self.points.first()
    }
}

/// Forecast velocity for the next `horizon` sprints.
///
/// The line is fitted over the most recent `trend_window` velocities with x
/// running 0..n, then extrapolated. Predictions and lower bounds are floored
/// at zero.
pub fn forecast_velocity(velocities: &[f64], horizon: usize, config: &ForecastConfig) -> ForecastResult {
    let history: Vec<f64> = velocities.iter().copied().filter(|v| v.is_finite()).collect();

    if history.is_empty() {
        return ForecastResult::empty(ForecastMethod::NoHistory);
    }
    if horizon == 0 {
        let method = if history.len() == 1 {
            ForecastMethod::Flat
        } else {
            ForecastMethod::Trend
        };
        return ForecastResult::empty(method);
    }

    let window = &history[history.len().saturating_sub(config.trend_window.max(2))..];
    let xs: Vec<f64> = (0..window.len()).map(|i| i as f64).collect();

    let Some(fit) = stats::linear_fit(&xs, window) else {
        let value = window[window.len() - 1].max(0.0);
        let points = (1..=horizon)
            .map(|offset| ForecastPoint {
                sprint_offset: offset,
                predicted_velocity: value,
                lower_bound: None,
                upper_bound: None,
            })
            .collect();
        return ForecastResult {
            method: ForecastMethod::Flat,
            points,
            slope: 0.0,
            intercept: value,
            r_squared: 0.0,
            residual_std: 0.0,
        };
    };

    let band = config.band_z * fit.residual_std;
    let last_x = (window.len() - 1) as f64;
    let points = (1..=horizon)
        .map(|offset| {
            let raw = fit.predict(last_x + offset as f64);
            let predicted = raw.max(0.0);
            ForecastPoint {
                sprint_offset: offset,
                predicted_velocity: predicted,
                lower_bound: Some((raw - band).max(0.0)),
                upper_bound: Some((raw + band).max(predicted)),
            }
        })
        .collect();

    tracing::debug!(samples = fit.samples, horizon, slope = fit.slope, "forecast velocity");

    ForecastResult {
        method: ForecastMethod::Trend,
        points,
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        residual_std: fit.residual_std,
    }
}

/// Suggested commitment for the next sprint: `commitment_factor` × the mean
/// of the last `commitment_window` velocities, rounded down. `None` without
/// history.
pub fn recommended_commitment(velocities: &[f64], config: &RecommendationConfig) -> Option<u32> {
    let recent = &velocities[velocities.len().saturating_sub(config.commitment_window)..];
    let finite: Vec<f64> = recent.iter().copied().filter(|v| v.is_finite()).collect();
    let avg = stats::mean(&finite)?;
    Some((avg.max(0.0) * config.commitment_factor).floor() as u32)
}
