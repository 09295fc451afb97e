//! Monte Carlo sprint completion simulation.
//!
//! Every trial draws exactly `horizon_sprints` velocities, independent of the
//! target, so under a fixed seed two targets see the same simulated totals
//! and the completion probability can only fall as the target rises.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::stats;
use crate::storage::{SamplingMethod, SimulationConfig};

/// Minimum history the simulation will sample from.
const MIN_SAMPLES: usize = 2;

/// Reproducible generator for a given seed.
pub fn seeded_rng(seed: u64) -> Mcg128Xsl64 {
    Mcg128Xsl64::seed_from_u64(seed)
}

/// Generator seeded from OS entropy.
pub fn entropy_rng() -> Mcg128Xsl64 {
    Mcg128Xsl64::from_entropy()
}

/// Fresh seed from OS entropy, for runs that must be reported and replayed.
pub fn entropy_seed() -> u64 {
    entropy_rng().next_u64()
}

/// Generator for an optional seed.
pub fn rng_for(seed: Option<u64>) -> Mcg128Xsl64 {
    match seed {
        Some(seed) => seeded_rng(seed),
        None => entropy_rng(),
    }
}

/// Why a simulation could not produce an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UndefinedReason {
    InsufficientHistory { samples: usize },
    NoTrials,
    InvalidTarget,
}

/// One bar of the simulated-total histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Estimated probability of reaching a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionForecast {
    pub target_points: f64,
    pub probability: f64,
    pub successes: usize,
    pub trials: usize,
    pub horizon_sprints: usize,
    /// Mean simulated total
    pub expected_total: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub histogram: Vec<HistogramBin>,
}

/// Result of [`run_completion_simulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationOutcome {
    Estimated(CompletionForecast),
    Undefined(UndefinedReason),
}

impl SimulationOutcome {
    pub fn probability(&self) -> Option<f64> {
        match self {
            SimulationOutcome::Estimated(forecast) => Some(forecast.probability),
            SimulationOutcome::Undefined(_) => None,
        }
    }
}

/// Estimate the probability that the next `horizon_sprints` deliver at
/// least `target_points`.
///
/// Non-finite velocities are ignored and negative ones count as zero.
pub fn run_completion_simulation<R>(
    velocities: &[f64],
    target_points: f64,
    config: &SimulationConfig,
    rng: &mut R,
) -> SimulationOutcome
where
    R: Rng + ?Sized,
{
    if target_points.is_nan() {
        return SimulationOutcome::Undefined(UndefinedReason::InvalidTarget);
    }
    let history = usable_history(velocities);
    if history.len() < MIN_SAMPLES {
        return SimulationOutcome::Undefined(UndefinedReason::InsufficientHistory {
            samples: history.len(),
        });
    }
    if config.trials == 0 {
        return SimulationOutcome::Undefined(UndefinedReason::NoTrials);
    }

    let totals = simulate_totals(&history, config, rng);
    let successes = totals.iter().filter(|&&t| t >= target_points).count();

    tracing::debug!(
        trials = config.trials,
        horizon = config.horizon_sprints,
        successes,
        "completion simulation finished"
    );

    SimulationOutcome::Estimated(CompletionForecast {
        target_points,
        probability: successes as f64 / config.trials as f64,
        successes,
        trials: config.trials,
        horizon_sprints: config.horizon_sprints,
        expected_total: stats::mean(&totals).unwrap_or(0.0),
        p10: stats::percentile(&totals, 10.0).unwrap_or(0.0),
        p50: stats::percentile(&totals, 50.0).unwrap_or(0.0),
        p90: stats::percentile(&totals, 90.0).unwrap_or(0.0),
        histogram: histogram(&totals, config.histogram_bins),
    })
}

/// Probability per target, every target simulated from the same seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub target_points: f64,
    pub probability: Option<f64>,
}

pub fn completion_curve(
    velocities: &[f64],
    targets: &[f64],
    config: &SimulationConfig,
    seed: u64,
) -> Vec<CurvePoint> {
    targets
        .iter()
        .map(|&target| {
            let mut rng = seeded_rng(seed);
            CurvePoint {
                target_points: target,
                probability: run_completion_simulation(velocities, target, config, &mut rng)
                    .probability(),
            }
        })
        .collect()
}

fn usable_history(velocities: &[f64]) -> Vec<f64> {
    let history: Vec<f64> = velocities
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .collect();
    if history.len() != velocities.len() {
        tracing::warn!(
            dropped = velocities.len() - history.len(),
            "ignored non-finite velocities"
        );
    }
    history
}

fn simulate_totals<R>(history: &[f64], config: &SimulationConfig, rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    let mean = stats::mean(history).unwrap_or(0.0);
    let std = stats::population_std(history).unwrap_or(0.0);
    let unit = Normal::standard();

    (0..config.trials)
        .map(|_| {
            (0..config.horizon_sprints)
                .map(|_| match config.sampling {
                    SamplingMethod::Empirical => history[rng.gen_range(0..history.len())],
                    SamplingMethod::Normal => (mean + std * unit.sample(&mut *rng)).max(0.0),
                })
                .sum::<f64>()
        })
        .collect()
}

fn histogram(totals: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some(min) = totals.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = totals.iter().copied().fold(min, f64::max);
    if max <= min || bins <= 1 {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: totals.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for total in totals {
        let idx = (((total - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: [f64; 6] = [30.0, 35.0, 32.0, 38.0, 34.0, 40.0];

    fn estimate(outcome: SimulationOutcome) -> CompletionForecast {
        match outcome {
            SimulationOutcome::Estimated(forecast) => forecast,
            other => panic!("expected an estimate, got {other:?}"),
        }
    }

    #[test]
    fn test_single_sprint_probability_matches_share_of_history() {
        let config = SimulationConfig::default();
        let forecast = estimate(run_completion_simulation(&HISTORY, 40.0, &config, &mut seeded_rng(42)));

        assert_eq!(forecast.trials, 1000);
        assert!((forecast.probability - 1.0 / 6.0).abs() < 0.05);
        assert!(forecast.p10 <= forecast.p50 && forecast.p50 <= forecast.p90);
        assert_eq!(forecast.histogram.iter().map(|b| b.count).sum::<usize>(), 1000);
    }

    #[test]
    fn test_seed_reproducibility() {
        let config = SimulationConfig::default();
        let a = run_completion_simulation(&HISTORY, 36.0, &config, &mut seeded_rng(7));
        let b = run_completion_simulation(&HISTORY, 36.0, &config, &mut seeded_rng(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_probability_non_increasing_in_target() {
        let config = SimulationConfig {
            horizon_sprints: 3,
            ..SimulationConfig::default()
        };
        let targets: Vec<f64> = (80..=130).step_by(5).map(f64::from).collect();
        let curve = completion_curve(&HISTORY, &targets, &config, 99);

        for pair in curve.windows(2) {
            assert!(pair[0].probability.unwrap() >= pair[1].probability.unwrap());
        }
    }

    #[test]
    fn test_normal_sampling_is_floored() {
        let config = SimulationConfig {
            sampling: SamplingMethod::Normal,
            ..SimulationConfig::default()
        };
        let forecast = estimate(run_completion_simulation(&[0.0, 1.0, 0.0, 40.0], 0.0, &config, &mut seeded_rng(3)));
        assert_eq!(forecast.probability, 1.0);
        assert!(forecast.histogram[0].lower >= 0.0);
    }

    #[test]
    fn test_normal_sampling_follows_history_moments() {
        let config = SimulationConfig {
            sampling: SamplingMethod::Normal,
            trials: 4000,
            ..SimulationConfig::default()
        };
        // mean 30, population std ≈ 8.165
        let history = [20.0, 30.0, 40.0];
        let at_mean = estimate(run_completion_simulation(&history, 30.0, &config, &mut seeded_rng(11)));
        assert!((at_mean.probability - 0.5).abs() < 0.05, "{}", at_mean.probability);

        let one_sigma = estimate(run_completion_simulation(&history, 38.165, &config, &mut seeded_rng(11)));
        assert!((one_sigma.probability - 0.159).abs() < 0.04, "{}", one_sigma.probability);

        let flat = estimate(run_completion_simulation(&[25.0, 25.0], 25.0, &config, &mut seeded_rng(11)));
        assert_eq!(flat.probability, 1.0);
    }

    #[test]
    fn test_undefined_outcomes() {
        let config = SimulationConfig::default();
        assert_eq!(
            run_completion_simulation(&[30.0], 20.0, &config, &mut seeded_rng(1)),
            SimulationOutcome::Undefined(UndefinedReason::InsufficientHistory { samples: 1 })
        );
        assert_eq!(
            run_completion_simulation(&[30.0, f64::NAN], 20.0, &config, &mut seeded_rng(1)),
            SimulationOutcome::Undefined(UndefinedReason::InsufficientHistory { samples: 1 })
        );

        let no_trials = SimulationConfig {
            trials: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            run_completion_simulation(&HISTORY, 20.0, &no_trials, &mut seeded_rng(1)),
            SimulationOutcome::Undefined(UndefinedReason::NoTrials)
        );
    }

    #[test]
    fn test_constant_history_single_bin() {
        let config = SimulationConfig::default();
        let forecast = estimate(run_completion_simulation(&[20.0, 20.0], 20.0, &config, &mut seeded_rng(5)));
        assert_eq!(forecast.probability, 1.0);
        assert_eq!(forecast.histogram.len(), 1);
        assert_eq!(forecast.expected_total, 20.0);
    }

    #[test]
    fn test_accepts_dyn_rng() {
        let config = SimulationConfig::default();
        let mut rng = seeded_rng(11);
        let dynamic: &mut dyn RngCore = &mut rng;
        let outcome = run_completion_simulation(&HISTORY, 30.0, &config, dynamic);
        assert_eq!(outcome.probability(), Some(1.0));
    }
}
