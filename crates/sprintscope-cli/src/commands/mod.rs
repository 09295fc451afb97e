pub mod config;
pub mod context;
pub mod metrics;
pub mod portfolio;
pub mod report;
pub mod simulate;
