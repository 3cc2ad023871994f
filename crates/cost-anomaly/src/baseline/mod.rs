//! Baseline construction for cost anomaly detection
//!
//! This module provides:
//! - Four competing baseline models fitted over a validated cost series
//! - Retrospective scoring of each model (accuracy from MAPE, confidence from correlation)
//! - Selection of the best-fitting model
//! - A per-region store that keeps the latest baseline between runs

mod estimator;
mod models;
mod store;

pub use crate::statistics::BaselineStatistics;
pub use estimator::BaselineEstimator;
pub use models::{
    BaselineAnalysis, BaselineModel, BaselineOutcome, BaselinePeriod, HourlyAverage, ModelKind,
    ModelParameters, Percentiles,
};
pub use store::BaselineStore;
