//! Detection orchestration
//!
//! Runs validation, baseline estimation, scoring, root cause analysis and
//! alerting for one region, and keeps the latest baseline per region.

mod engine;
mod metrics;
mod types;

pub use engine::AnomalyDetectionEngine;
pub use metrics::DetectionMetrics;
pub use types::{DetectedAnomaly, DetectionRequest, DetectionResult, DetectionSummary};
