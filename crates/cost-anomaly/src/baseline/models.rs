//! Baseline models and analysis results

use crate::quality::DataQualityReport;
use crate::statistics::BaselineStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Baseline model kind.
///
/// Declaration order is the tie-break order for model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Trailing moving average
    MovingAverage,
    /// Hour-of-day seasonal means
    Seasonal,
    /// Least squares line over the series index
    LinearTrend,
    /// Median with percentile bands
    Percentile,
}

impl ModelKind {
    /// All kinds in selection tie-break order
    pub const ALL: [ModelKind; 4] = [
        ModelKind::MovingAverage,
        ModelKind::Seasonal,
        ModelKind::LinearTrend,
        ModelKind::Percentile,
    ];
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::MovingAverage => write!(f, "moving_average"),
            ModelKind::Seasonal => write!(f, "seasonal"),
            ModelKind::LinearTrend => write!(f, "linear_trend"),
            ModelKind::Percentile => write!(f, "percentile"),
        }
    }
}

/// Percentile bands of the historical series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 10th percentile
    pub p10: f64,
    /// 25th percentile
    pub p25: f64,
    /// 50th percentile
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
}

/// Mean cost for one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyAverage {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Mean cost observed in this hour
    pub average: f64,
    /// Observations in this hour
    pub samples: usize,
}

/// Kind-specific model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelParameters {
    /// Trailing moving average
    MovingAverage {
        /// Window length actually used
        window: usize,
    },
    /// Hour-of-day seasonal means
    Seasonal {
        /// Mean cost per hour of day, only hours with history
        hourly_averages: Vec<HourlyAverage>,
        /// True when the series was too short and the global mean was used
        fallback: bool,
    },
    /// Least squares line over the series index
    LinearTrend {
        /// Cost change per point
        slope: f64,
        /// Fitted cost at index 0
        intercept: f64,
    },
    /// Median with percentile bands
    Percentile {
        /// Percentile bands
        percentiles: Percentiles,
    },
}

/// A fitted baseline model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineModel {
    /// Kind-specific parameters
    #[serde(flatten)]
    pub parameters: ModelParameters,
    /// Expected cost for each input point, same length as the series
    pub predictions: Vec<f64>,
    /// Retrospective accuracy (0-100), `100 - MAPE`
    pub accuracy: f64,
    /// Retrospective confidence (0-100), `100 * |pearson(actual, predicted)|`
    pub confidence: f64,
}

impl BaselineModel {
    /// Model kind
    pub fn kind(&self) -> ModelKind {
        match self.parameters {
            ModelParameters::MovingAverage { .. } => ModelKind::MovingAverage,
            ModelParameters::Seasonal { .. } => ModelKind::Seasonal,
            ModelParameters::LinearTrend { .. } => ModelKind::LinearTrend,
            ModelParameters::Percentile { .. } => ModelKind::Percentile,
        }
    }

    /// Weighted selection score
    pub fn weighted_score(&self, accuracy_weight: f64, confidence_weight: f64) -> f64 {
        accuracy_weight * self.accuracy + confidence_weight * self.confidence
    }

    /// Expected cost at `index`.
    ///
    /// Past the fitted range the linear trend extrapolates its line; every
    /// other model repeats its last prediction.
    pub fn expected_at(&self, index: usize) -> f64 {
        if let Some(value) = self.predictions.get(index) {
            return *value;
        }

        match self.parameters {
            ModelParameters::LinearTrend { slope, intercept } => intercept + slope * index as f64,
            _ => self.predictions.last().copied().unwrap_or(0.0),
        }
    }
}

/// Time range the baseline was built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselinePeriod {
    /// First point
    pub start: DateTime<Utc>,
    /// Last point
    pub end: DateTime<Utc>,
    /// Points used
    pub point_count: usize,
}

/// Result of one baseline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineAnalysis {
    /// Quality report of the input series
    pub quality_report: DataQualityReport,
    /// Descriptive statistics of the input series
    pub statistics: BaselineStatistics,
    /// Every fitted model, keyed by kind
    pub all_models: BTreeMap<ModelKind, BaselineModel>,
    /// The best-fitting model
    pub selected_model: BaselineModel,
    /// Time range covered
    pub period: BaselinePeriod,
}

impl BaselineAnalysis {
    /// Kind of the selected model
    pub fn selected_kind(&self) -> ModelKind {
        self.selected_model.kind()
    }
}

/// Baseline run outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BaselineOutcome {
    /// A baseline was built
    Established(Box<BaselineAnalysis>),
    /// The series could not support a baseline
    NotEstablished {
        /// Why no baseline was built
        reason: String,
        /// Quality report of the rejected series
        quality_report: DataQualityReport,
    },
}

impl BaselineOutcome {
    /// Whether a baseline was built
    pub fn is_established(&self) -> bool {
        matches!(self, BaselineOutcome::Established(_))
    }

    /// The analysis, when established
    pub fn analysis(&self) -> Option<&BaselineAnalysis> {
        match self {
            BaselineOutcome::Established(analysis) => Some(analysis),
            BaselineOutcome::NotEstablished { .. } => None,
        }
    }

    /// Failure reason, when not established
    pub fn reason(&self) -> Option<&str> {
        match self {
            BaselineOutcome::Established(_) => None,
            BaselineOutcome::NotEstablished { reason, .. } => Some(reason),
        }
    }
}
