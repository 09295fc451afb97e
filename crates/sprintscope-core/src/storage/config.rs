//! TOML-based analytics configuration.
//!
//! Holds every weight, threshold and table the engines consume:
//! - Sprint health component weights and consistency window
//! - Strategic weights, ROI multipliers, quadrant and tier thresholds
//! - Risk factor weights and level thresholds
//! - Simulation, forecast and recommendation settings
//!
//! Configuration is stored at `~/.config/sprintscope/config.toml`. Every
//! field has a serde default so partial files are valid.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::records::{RoiEstimate, StrategicCategory};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weights of the four sprint health components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    #[serde(default = "default_consistency_weight")]
    pub consistency: f64,
    #[serde(default = "default_accuracy_weight")]
    pub accuracy: f64,
    #[serde(default = "default_completion_weight")]
    pub completion: f64,
    #[serde(default = "default_blocker_weight")]
    pub blockers: f64,
}

/// Sprint health settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default)]
    pub weights: HealthWeights,
    /// Trailing sprints used for velocity consistency
    #[serde(default = "default_consistency_window")]
    pub consistency_window: usize,
}

/// Impact/effort cut-offs for quadrant classification.
///
/// Values between the low and high bands resolve at the band midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadrantThresholds {
    #[serde(default = "default_seven")]
    pub high_impact: f64,
    #[serde(default = "default_four")]
    pub low_impact: f64,
    #[serde(default = "default_four")]
    pub low_effort: f64,
    #[serde(default = "default_seven")]
    pub high_effort: f64,
}

impl QuadrantThresholds {
    pub fn impact_split(&self) -> f64 {
        (self.low_impact + self.high_impact) / 2.0
    }

    pub fn effort_split(&self) -> f64 {
        (self.low_effort + self.high_effort) / 2.0
    }
}

/// Priority score cut-offs for tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_medium_tier")]
    pub medium: f64,
    #[serde(default = "default_high_tier")]
    pub high: f64,
}

/// Prioritization tables and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityConfig {
    #[serde(default = "default_strategic_weights")]
    pub strategic_weights: BTreeMap<StrategicCategory, f64>,
    #[serde(default = "default_roi_multipliers")]
    pub roi_multipliers: BTreeMap<RoiEstimate, f64>,
    #[serde(default)]
    pub quadrant: QuadrantThresholds,
    #[serde(default)]
    pub tiers: TierThresholds,
}

impl PriorityConfig {
    /// Weight for a category, failing fast when the table lacks it.
    pub fn strategic_weight(&self, category: StrategicCategory) -> Result<f64, ConfigError> {
        self.strategic_weights
            .get(&category)
            .copied()
            .ok_or_else(|| ConfigError::MissingStrategicWeight(category.label().to_string()))
    }

    /// Multiplier for an ROI estimate, failing fast when the table lacks it.
    pub fn roi_multiplier(&self, roi: RoiEstimate) -> Result<f64, ConfigError> {
        self.roi_multipliers
            .get(&roi)
            .copied()
            .ok_or_else(|| ConfigError::MissingRoiMultiplier(roi.to_string()))
    }
}

/// Weights of the four risk factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    #[serde(default = "default_capacity_risk_weight")]
    pub capacity: f64,
    #[serde(default = "default_volatility_risk_weight")]
    pub volatility: f64,
    #[serde(default = "default_utilization_risk_weight")]
    pub utilization: f64,
    #[serde(default = "default_progress_risk_weight")]
    pub progress: f64,
}

/// Risk scoring settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub weights: RiskWeights,
    /// Lowest score classified as Medium
    #[serde(default = "default_medium_risk")]
    pub medium_threshold: f64,
    /// Lowest score classified as High
    #[serde(default = "default_high_risk")]
    pub high_threshold: f64,
    /// Recent sprints used for volatility and average velocity
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
    /// Coefficient of variation treated as maximal volatility
    #[serde(default = "default_cv_ceiling")]
    pub volatility_cv_ceiling: f64,
    #[serde(default = "default_band_low")]
    pub utilization_band_low: f64,
    #[serde(default = "default_band_high")]
    pub utilization_band_high: f64,
    /// Distance outside the band treated as maximal utilization risk
    #[serde(default = "default_utilization_tolerance")]
    pub utilization_tolerance: f64,
    /// Sprints assumed until target when an initiative has none
    #[serde(default = "default_runway")]
    pub default_runway_sprints: u32,
}

/// How the completion simulation draws velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMethod {
    /// Resample observed velocities with replacement
    #[default]
    Empirical,
    /// Draw from a normal fitted to the history, floored at zero
    Normal,
}

/// Monte Carlo completion simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Sprints whose velocity is summed per trial
    #[serde(default = "default_horizon_sprints")]
    pub horizon_sprints: usize,
    #[serde(default)]
    pub sampling: SamplingMethod,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    /// Random seed for reproducibility (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Velocity forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_horizon")]
    pub horizon: usize,
    /// Most recent sprints used for the trend fit
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Residual standard deviations on each side of the prediction
    #[serde(default = "default_band_z")]
    pub band_z: f64,
}

/// Recommendation policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Maximum quick wins recommended for prioritization
    #[serde(default = "default_quick_win_limit")]
    pub quick_win_limit: usize,
    #[serde(default = "default_health_threshold")]
    pub health_threshold: f64,
    #[serde(default = "default_accuracy_threshold")]
    pub accuracy_threshold: f64,
    /// Share of recent average velocity recommended for commitment
    #[serde(default = "default_commitment_factor")]
    pub commitment_factor: f64,
    #[serde(default = "default_commitment_window")]
    pub commitment_window: usize,
    /// Trailing sprints considered by the estimation and cycle-time insights
    #[serde(default = "default_insight_window")]
    pub insight_window: u32,
    #[serde(default = "default_seven")]
    pub cycle_time_threshold_days: f64,
    /// Member utilization (ratio) above which a member is over-utilized
    #[serde(default = "default_overutilization")]
    pub overutilization_threshold: f64,
    /// Share of major projects (%) above which the portfolio is unbalanced
    #[serde(default = "default_major_project_share")]
    pub major_project_share_pct: f64,
    /// Open demand over available capacity (%) above which work is overcommitted
    #[serde(default = "default_overcommitment")]
    pub overcommitment_pct: f64,
    /// Share of Revenue Growth initiatives (%) below which focus is flagged
    #[serde(default = "default_revenue_focus")]
    pub revenue_focus_pct: f64,
}

/// Analytics configuration.
///
/// Serialized to/from TOML at `~/.config/sprintscope/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
}

// Default functions
fn default_consistency_weight() -> f64 {
    0.30
}
fn default_accuracy_weight() -> f64 {
    0.25
}
fn default_completion_weight() -> f64 {
    0.25
}
fn default_blocker_weight() -> f64 {
    0.20
}
fn default_consistency_window() -> usize {
    6
}
fn default_seven() -> f64 {
    7.0
}
fn default_four() -> f64 {
    4.0
}
fn default_medium_tier() -> f64 {
    1.5
}
fn default_high_tier() -> f64 {
    2.5
}
fn default_strategic_weights() -> BTreeMap<StrategicCategory, f64> {
    BTreeMap::from([
        (StrategicCategory::RevenueGrowth, 1.5),
        (StrategicCategory::CustomerExperience, 1.3),
        (StrategicCategory::CostReduction, 1.2),
        (StrategicCategory::ProcessImprovement, 1.0),
        (StrategicCategory::TechnicalExcellence, 1.1),
    ])
}
fn default_roi_multipliers() -> BTreeMap<RoiEstimate, f64> {
    BTreeMap::from([
        (RoiEstimate::High, 1.3),
        (RoiEstimate::Medium, 1.0),
        (RoiEstimate::Low, 0.7),
    ])
}
fn default_capacity_risk_weight() -> f64 {
    0.35
}
fn default_volatility_risk_weight() -> f64 {
    0.25
}
fn default_utilization_risk_weight() -> f64 {
    0.25
}
fn default_progress_risk_weight() -> f64 {
    0.15
}
fn default_medium_risk() -> f64 {
    0.3
}
fn default_high_risk() -> f64 {
    0.6
}
fn default_volatility_window() -> usize {
    5
}
fn default_cv_ceiling() -> f64 {
    0.15
}
fn default_band_low() -> f64 {
    0.85
}
fn default_band_high() -> f64 {
    0.95
}
fn default_utilization_tolerance() -> f64 {
    0.25
}
fn default_runway() -> u32 {
    10
}
fn default_trials() -> usize {
    1000
}
fn default_horizon_sprints() -> usize {
    1
}
fn default_histogram_bins() -> usize {
    30
}
fn default_forecast_horizon() -> usize {
    3
}
fn default_trend_window() -> usize {
    5
}
fn default_band_z() -> f64 {
    1.5
}
fn default_quick_win_limit() -> usize {
    5
}
fn default_health_threshold() -> f64 {
    70.0
}
fn default_accuracy_threshold() -> f64 {
    75.0
}
fn default_commitment_factor() -> f64 {
    0.95
}
fn default_commitment_window() -> usize {
    3
}
fn default_insight_window() -> u32 {
    3
}
fn default_overutilization() -> f64 {
    1.05
}
fn default_major_project_share() -> f64 {
    40.0
}
fn default_overcommitment() -> f64 {
    110.0
}
fn default_revenue_focus() -> f64 {
    20.0
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            consistency: default_consistency_weight(),
            accuracy: default_accuracy_weight(),
            completion: default_completion_weight(),
            blockers: default_blocker_weight(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            weights: HealthWeights::default(),
            consistency_window: default_consistency_window(),
        }
    }
}

impl Default for QuadrantThresholds {
    fn default() -> Self {
        Self {
            high_impact: 7.0,
            low_impact: 4.0,
            low_effort: 4.0,
            high_effort: 7.0,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium_tier(),
            high: default_high_tier(),
        }
    }
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            strategic_weights: default_strategic_weights(),
            roi_multipliers: default_roi_multipliers(),
            quadrant: QuadrantThresholds::default(),
            tiers: TierThresholds::default(),
        }
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            capacity: default_capacity_risk_weight(),
            volatility: default_volatility_risk_weight(),
            utilization: default_utilization_risk_weight(),
            progress: default_progress_risk_weight(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            medium_threshold: default_medium_risk(),
            high_threshold: default_high_risk(),
            volatility_window: default_volatility_window(),
            volatility_cv_ceiling: default_cv_ceiling(),
            utilization_band_low: default_band_low(),
            utilization_band_high: default_band_high(),
            utilization_tolerance: default_utilization_tolerance(),
            default_runway_sprints: default_runway(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            horizon_sprints: default_horizon_sprints(),
            sampling: SamplingMethod::default(),
            histogram_bins: default_histogram_bins(),
            seed: None,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: default_forecast_horizon(),
            trend_window: default_trend_window(),
            band_z: default_band_z(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            quick_win_limit: default_quick_win_limit(),
            health_threshold: default_health_threshold(),
            accuracy_threshold: default_accuracy_threshold(),
            commitment_factor: default_commitment_factor(),
            commitment_window: default_commitment_window(),
            insight_window: default_insight_window(),
            cycle_time_threshold_days: default_seven(),
            overutilization_threshold: default_overutilization(),
            major_project_share_pct: default_major_project_share(),
            overcommitment_pct: default_overcommitment(),
            revenue_focus_pct: default_revenue_focus(),
        }
    }
}

fn check_weight_sum(group: &str, weights: &[f64]) -> Result<(), ConfigError> {
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightsDoNotSumToOne {
            group: group.to_string(),
            sum,
        });
    }
    for weight in weights {
        if !(0.0..=1.0).contains(weight) {
            return Err(ConfigError::InvalidValue {
                key: group.to_string(),
                message: format!("weight must be in [0.0, 1.0], got {weight}"),
            });
        }
    }
    Ok(())
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl HealthWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight_sum(
            "health.weights",
            &[self.consistency, self.accuracy, self.completion, self.blockers],
        )
    }
}

impl RiskWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight_sum(
            "risk.weights",
            &[self.capacity, self.volatility, self.utilization, self.progress],
        )
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.consistency_window == 0 {
            return Err(invalid("health.consistency_window", "must be at least 1"));
        }
        Ok(())
    }
}

impl PriorityConfig {
    /// Checks every category and ROI value has a non-negative entry and
    /// the quadrant bands do not overlap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in StrategicCategory::ALL {
            let weight = self.strategic_weight(category)?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(
                    "priority.strategic_weights",
                    format!("weight for '{category}' must be non-negative, got {weight}"),
                ));
            }
        }
        for roi in RoiEstimate::ALL {
            let multiplier = self.roi_multiplier(roi)?;
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err(invalid(
                    "priority.roi_multipliers",
                    format!("multiplier for '{roi}' must be non-negative, got {multiplier}"),
                ));
            }
        }
        let q = &self.quadrant;
        if q.low_impact > q.high_impact {
            return Err(invalid("priority.quadrant", "low_impact must not exceed high_impact"));
        }
        if q.low_effort > q.high_effort {
            return Err(invalid("priority.quadrant", "low_effort must not exceed high_effort"));
        }
        if self.tiers.medium > self.tiers.high {
            return Err(invalid("priority.tiers", "medium must not exceed high"));
        }
        Ok(())
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if !(0.0 < self.medium_threshold
            && self.medium_threshold < self.high_threshold
            && self.high_threshold <= 1.0)
        {
            return Err(invalid(
                "risk.thresholds",
                format!(
                    "expected 0 < medium < high <= 1, got medium={} high={}",
                    self.medium_threshold, self.high_threshold
                ),
            ));
        }
        if !self.utilization_band_low.is_finite()
            || !self.utilization_band_high.is_finite()
            || self.utilization_band_low > self.utilization_band_high
        {
            return Err(invalid("risk.utilization_band", "low must not exceed high"));
        }
        if !self.volatility_cv_ceiling.is_finite() || self.volatility_cv_ceiling <= 0.0 {
            return Err(invalid("risk.volatility_cv_ceiling", "must be positive"));
        }
        if !self.utilization_tolerance.is_finite() || self.utilization_tolerance <= 0.0 {
            return Err(invalid("risk.utilization_tolerance", "must be positive"));
        }
        if self.volatility_window == 0 {
            return Err(invalid("risk.volatility_window", "must be at least 1"));
        }
        Ok(())
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_sprints == 0 {
            return Err(invalid("simulation.horizon_sprints", "must be at least 1"));
        }
        if self.histogram_bins == 0 {
            return Err(invalid("simulation.histogram_bins", "must be at least 1"));
        }
        Ok(())
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trend_window < 2 {
            return Err(invalid("forecast.trend_window", "must be at least 2"));
        }
        if !self.band_z.is_finite() || self.band_z < 0.0 {
            return Err(invalid("forecast.band_z", "must be non-negative"));
        }
        Ok(())
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commitment_window == 0 {
            return Err(invalid("recommendations.commitment_window", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.commitment_factor) {
            return Err(invalid("recommendations.commitment_factor", "must be in [0.0, 1.0]"));
        }
        if self.insight_window == 0 {
            return Err(invalid("recommendations.insight_window", "must be at least 1"));
        }
        for (key, value) in [
            ("recommendations.cycle_time_threshold_days", self.cycle_time_threshold_days),
            ("recommendations.overutilization_threshold", self.overutilization_threshold),
            ("recommendations.major_project_share_pct", self.major_project_share_pct),
            ("recommendations.overcommitment_pct", self.overcommitment_pct),
            ("recommendations.revenue_focus_pct", self.revenue_focus_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, "must be a non-negative number"));
            }
        }
        Ok(())
    }
}

impl AnalyticsConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let bad_value = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| bad_value(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| bad_value(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(bad_value(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| bad_value(e.to_string()))?
                    }
                    serde_json::Value::Null => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            serde_json::Value::String(value.into())
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Validates every section; the first defect is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.health.validate()?;
        self.priority.validate()?;
        self.risk.validate()?;
        self.simulation.validate()?;
        self.forecast.validate()?;
        self.recommendations.validate()?;
        Ok(())
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: AnalyticsConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the parsed configuration fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Self::from_toml_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to `path`, or the default location when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self, path: Option<&Path>) -> Result<(), CoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, revalidating the result.
    ///
    /// Does not persist; call [`AnalyticsConfig::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the updated configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: AnalyticsConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
