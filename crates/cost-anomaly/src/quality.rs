//! Data quality validation for historical cost series
//!
//! Checks run in a fixed order and stop at the first failure: non-empty,
//! enough points, enough historical span, enough points with a usable cost.

use crate::config::DetectionThresholds;
use crate::types::CostSeries;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of validating a cost series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Whether the series can support a baseline
    pub sufficient: bool,
    /// First failing check, when insufficient
    pub reason: Option<String>,
    /// Parsed observations
    pub point_count: usize,
    /// Observations with a usable cost
    pub valid_point_count: usize,
    /// `valid_point_count / point_count`
    pub completeness_ratio: f64,
    /// Whole days between the first and last observation
    pub span_days: i64,
    /// First observation
    pub earliest: Option<DateTime<Utc>>,
    /// Last observation
    pub latest: Option<DateTime<Utc>>,
}

impl DataQualityReport {
    fn fail(mut self, reason: String) -> Self {
        self.sufficient = false;
        self.reason = Some(reason);
        self
    }
}

/// Validator gating baseline construction
#[derive(Debug, Clone)]
pub struct DataQualityValidator {
    min_data_points: usize,
    min_historical_days: i64,
    data_quality_threshold: f64,
}

impl DataQualityValidator {
    /// Create a validator from the detection thresholds
    pub fn new(thresholds: &DetectionThresholds) -> Self {
        Self {
            min_data_points: thresholds.min_data_points,
            min_historical_days: thresholds.min_historical_days,
            data_quality_threshold: thresholds.data_quality_threshold,
        }
    }

    /// Validate a series. Pure function of the series and thresholds.
    pub fn validate(&self, series: &CostSeries) -> DataQualityReport {
        let observations = series.observations();
        let point_count = observations.len();
        let valid_point_count = observations.iter().filter(|o| o.cost.is_some()).count();
        let earliest = observations.first().map(|o| o.timestamp);
        let latest = observations.last().map(|o| o.timestamp);
        let span = match (earliest, latest) {
            (Some(first), Some(last)) => last - first,
            _ => ChronoDuration::zero(),
        };

        let report = DataQualityReport {
            sufficient: true,
            reason: None,
            point_count,
            valid_point_count,
            completeness_ratio: if point_count > 0 {
                valid_point_count as f64 / point_count as f64
            } else {
                0.0
            },
            span_days: span.num_days(),
            earliest,
            latest,
        };

        if point_count == 0 {
            return report.fail("No cost data provided".to_string());
        }

        if point_count < self.min_data_points {
            return report.fail(format!(
                "Insufficient data points: {} (minimum {})",
                point_count, self.min_data_points
            ));
        }

        if span < ChronoDuration::days(self.min_historical_days) {
            return report.fail(format!(
                "Insufficient historical span: {} days (minimum {})",
                span.num_days(),
                self.min_historical_days
            ));
        }

        if report.completeness_ratio < self.data_quality_threshold {
            let ratio = report.completeness_ratio;
            return report.fail(format!(
                "Data completeness {:.1}% below threshold {:.1}%",
                ratio * 100.0,
                self.data_quality_threshold * 100.0
            ));
        }

        report
    }
}
