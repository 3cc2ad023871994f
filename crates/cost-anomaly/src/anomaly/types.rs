//! Anomaly records, types and severity bands

use crate::baseline::ModelKind;
use crate::config::SeverityBands;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anomaly type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Single-point jump above the baseline
    CostSpike,
    /// Sustained slope relative to the baseline spread
    CostTrend,
    /// Unusual usage shape
    UsagePattern,
    /// Anomaly confined to one service
    ServiceAnomaly,
    /// Anomaly confined to one region
    RegionalAnomaly,
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyType::CostSpike => write!(f, "cost_spike"),
            AnomalyType::CostTrend => write!(f, "cost_trend"),
            AnomalyType::UsagePattern => write!(f, "usage_pattern"),
            AnomalyType::ServiceAnomaly => write!(f, "service_anomaly"),
            AnomalyType::RegionalAnomaly => write!(f, "regional_anomaly"),
        }
    }
}

/// Severity band, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// At least the LOW band, or flagged by a percentage/absolute trigger
    Low = 0,
    /// At least the MEDIUM band
    Medium = 1,
    /// At least the HIGH band
    High = 2,
    /// At least the CRITICAL band
    Critical = 3,
}

impl Severity {
    /// Highest band whose cutoff `signal` meets.
    ///
    /// `bands.low` is never consulted: a flagged point below `bands.medium`
    /// is LOW.
    pub fn classify(signal: f64, bands: &SeverityBands) -> Self {
        let signal = signal.abs();
        if signal >= bands.critical {
            Severity::Critical
        } else if signal >= bands.high {
            Severity::High
        } else if signal >= bands.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Whether anomalies of this severity are alerted on
    pub fn is_alertable(&self) -> bool {
        *self >= Severity::Medium
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A flagged cost observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// `anomaly-{region}-{epoch}-{index}`, unique within one detection call
    pub id: String,
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// Position of the observation in the scored series
    pub series_index: usize,
    /// Anomaly type
    pub anomaly_type: AnomalyType,
    /// Severity band of `|deviation_std|`, or of the larger of that and
    /// `trend_score` for a trend
    pub severity: Severity,
    /// Observed cost
    pub actual_cost: f64,
    /// Baseline expectation
    pub expected_cost: f64,
    /// `(actual - expected) / expected * 100`, 0 when expected is 0
    pub deviation_pct: f64,
    /// `(actual - mean) / std_dev`, 0 when std_dev is 0
    pub deviation_std: f64,
    /// Normalized local slope, set when the trend test fired
    pub trend_score: Option<f64>,
    /// Baseline model the expectation came from
    pub baseline_model: ModelKind,
    /// Region of the scored series
    pub region: String,
    /// Detection run time
    pub detected_at: DateTime<Utc>,
}

impl Anomaly {
    /// Cost above expectation (negative when below)
    pub fn cost_impact(&self) -> f64 {
        self.actual_cost - self.expected_cost
    }
}
