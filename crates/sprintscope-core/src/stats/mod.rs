//! Descriptive statistics shared by the engines.
//!
//! All functions are total: empty input yields `None` rather than NaN.

mod regression;
mod summary;

pub use regression::{linear_fit, LinearFit};
pub use summary::{coefficient_of_variation, mean, median, percentile, population_std};
