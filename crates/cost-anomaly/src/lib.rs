//! Cost anomaly detection for cloud spend
//!
//! This crate flags statistically unusual spending in a cost series:
//! - Data quality validation of the historical series
//! - Four competing baseline models with fit-based selection
//! - Spike and trend scoring with severity bands
//! - Root cause attribution to services and resources
//! - Alert synthesis for MEDIUM severity and above
//! - A per-region baseline store reused across runs

#![warn(missing_docs)]

pub mod alerts;
pub mod anomaly;
pub mod baseline;
pub mod config;
pub mod detector;
pub mod error;
pub mod quality;
pub mod root_cause;
pub mod statistics;
pub mod timestamp;
pub mod types;

pub use error::{ComputationError, CostAnomalyError, CostAnomalyResult};

// Configuration and input
pub use config::{DetectionThresholds, SeverityBands};
pub use types::{CostDataPoint, CostSeries, RawCostRecord, ResourceCostRecord};

// Validation and baselines
pub use baseline::{
    BaselineAnalysis, BaselineEstimator, BaselineModel, BaselineOutcome, BaselineStatistics,
    BaselineStore, ModelKind,
};
pub use quality::{DataQualityReport, DataQualityValidator};

// Scoring, attribution and alerting
pub use alerts::{Alert, AlertGenerator};
pub use anomaly::{Anomaly, AnomalyScorer, AnomalyType, Severity};
pub use root_cause::{ContributingFactor, RootCauseAnalysis, RootCauseAnalyzer};

// Orchestration
pub use detector::{
    AnomalyDetectionEngine, DetectedAnomaly, DetectionMetrics, DetectionRequest, DetectionResult,
    DetectionSummary,
};
