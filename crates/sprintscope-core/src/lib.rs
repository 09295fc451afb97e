//! # Sprintscope Core Library
//!
//! Agile delivery analytics over sprint, story, initiative and team records.
//! The `sprintscope` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! Data flows one way, leaf-first:
//!
//! - **Records**: typed input rows and [`DataQualityIssue`] annotations
//! - **Metrics**: per-sprint health, velocity trend, cycle time, utilization
//! - **Prioritization**: priority score, impact/effort quadrant, ranking
//! - **Risk**: multi-factor risk, Monte Carlo completion probability, velocity forecast
//! - **Recommendations**: ranked action items over computed results
//! - **Storage**: TOML configuration and the fingerprinted result cache
//!
//! Every engine is a pure function of its inputs and an explicit
//! configuration value. The simulation takes its random source as an
//! argument, so seeded runs are reproducible.
//!
//! ## Key Components
//!
//! - [`analyze`]: the full pipeline over a [`Dataset`]
//! - [`AnalyticsConfig`]: all tunable weights, thresholds and tables
//! - [`ResultCache`]: memoization keyed on inputs + configuration

pub mod analysis;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod prioritization;
pub mod recommendations;
pub mod records;
pub mod risk;
pub mod stats;
pub mod storage;

pub use analysis::{analyze, AnalysisReport, PortfolioSummary};
pub use dataset::{Dataset, Table};
pub use error::{ConfigError, CoreError, DatasetError};
pub use metrics::{compute_sprint_health, velocity_history, SprintHealth};
pub use prioritization::{
    classify_quadrant, rank_initiatives, score_initiative, score_portfolio, Placement,
    PriorityResult, PriorityTier, Quadrant,
};
pub use recommendations::{
    delivery_insights, portfolio_insights, synthesize, DeliveryInsight, Recommendation,
    RecommendationAction,
};
pub use records::{
    DataQualityIssue, Initiative, InitiativeStatus, IssueKind, RoiEstimate, SprintRecord,
    StoryRecord, StoryStatus, StoryType, StrategicCategory, TeamMember,
};
pub use risk::{
    assess_portfolio_risk, forecast_velocity, run_completion_simulation, score_risk, seeded_rng,
    ForecastResult, RiskLevel, RiskResult, SimulationOutcome, TeamState,
};
pub use storage::{fingerprint, AnalyticsConfig, ResultCache};
