//! Core error types for sprintscope-core.
//!
//! Only configuration defects and dataset loading failures surface as errors.
//! Bad rows are recovered locally and reported as
//! [`DataQualityIssue`](crate::records::DataQualityIssue)s on the results.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sprintscope-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset loading errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
///
/// These indicate a programming or configuration defect and are never
/// recovered inside the engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Strategic category has no weight in the table
    #[error("No strategic weight configured for category '{0}'")]
    MissingStrategicWeight(String),

    /// ROI estimate has no multiplier in the table
    #[error("No ROI multiplier configured for estimate '{0}'")]
    MissingRoiMultiplier(String),

    /// A weight group does not sum to one
    #[error("Weights for '{group}' must sum to 1.0, got {sum}")]
    WeightsDoNotSumToOne { group: String, sum: f64 },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Dataset loading errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Failed to read the dataset file
    #[error("Failed to read dataset at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid JSON for the record schema
    #[error("Failed to parse dataset: {0}")]
    ParseFailed(#[from] serde_json::Error),

    /// A table required by the requested computation is empty
    #[error("Empty table: {0}")]
    EmptyTable(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.into())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
