//! Root cause attribution
//!
//! Splits the cost increase behind an anomaly across services and individual
//! resources, and describes the cost pattern in a window around it.

mod analyzer;
mod types;

pub use analyzer::RootCauseAnalyzer;
pub use types::{
    ContributingFactor, FactorType, Priority, Recommendation, RecommendationCategory,
    ResourceContribution, RootCauseAnalysis, ServiceContribution, TimeWindowAnalysis,
};
