//! Detection thresholds
//!
//! A single strongly typed configuration object, built once and handed to
//! the engine. Nothing mutates it afterwards.

use crate::error::{CostAnomalyError, CostAnomalyResult};
use serde::{Deserialize, Serialize};

/// Numeric cutoffs used by every detection stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Minimum number of observations for a baseline
    pub min_data_points: usize,
    /// Minimum span between first and last observation, in days
    pub min_historical_days: i64,
    /// Minimum fraction of observations with a usable cost (0.0 - 1.0)
    pub data_quality_threshold: f64,
    /// Upper bound for the moving average window
    pub moving_average_window: usize,
    /// Observations needed before hourly seasonality is trusted (one week hourly)
    pub seasonal_min_points: usize,
    /// Spike cutoff in standard deviations
    pub cost_spike_threshold: f64,
    /// Spike cutoff as percentage above expected
    pub percentage_increase_threshold: f64,
    /// Spike cutoff as absolute dollars above expected
    pub absolute_cost_threshold: f64,
    /// Consecutive spikes required before their slope is tested as a trend.
    ///
    /// The run's trailing points of this length form the trend window.
    pub consecutive_anomaly_threshold: usize,
    /// Trend cutoff as slope per point over baseline standard deviation
    pub cost_trend_threshold: f64,
    /// Severity bands in standard deviations
    pub severity: SeverityBands,
    /// Minimum share of the cost increase for a service to be a contributing factor
    pub service_contribution_threshold: f64,
    /// Minimum share of the cost increase for a resource to be a contributing factor
    pub resource_contribution_threshold: f64,
    /// Half-width of the root cause time window, in hours
    pub root_cause_window_hours: i64,
    /// Weight of accuracy in model selection
    pub accuracy_weight: f64,
    /// Weight of confidence in model selection
    pub confidence_weight: f64,
}

/// Lower bounds of each severity band, in standard deviations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    /// Nominal LOW cutoff.
    ///
    /// Only checked for ascending order against the other bands. Flagged
    /// points below `medium` are LOW whatever this value is, since the
    /// percentage and absolute triggers can flag points under it.
    pub low: f64,
    /// MEDIUM cutoff
    pub medium: f64,
    /// HIGH cutoff
    pub high: f64,
    /// CRITICAL cutoff
    pub critical: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            low: 1.5,
            medium: 2.0,
            high: 3.0,
            critical: 4.0,
        }
    }
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            min_data_points: 24,
            min_historical_days: 14,
            data_quality_threshold: 0.8,
            moving_average_window: 24,
            seasonal_min_points: 168, // 24 * 7 hours
            cost_spike_threshold: 2.0,
            percentage_increase_threshold: 50.0,
            absolute_cost_threshold: 100.0,
            consecutive_anomaly_threshold: 3,
            cost_trend_threshold: 1.5,
            severity: SeverityBands::default(),
            service_contribution_threshold: 20.0,
            resource_contribution_threshold: 10.0,
            root_cause_window_hours: 24,
            accuracy_weight: 0.6,
            confidence_weight: 0.4,
        }
    }
}

impl DetectionThresholds {
    /// Parse a (possibly partial) JSON override document and validate it.
    ///
    /// Keys that are absent keep their default value.
    pub fn from_json(json: &str) -> CostAnomalyResult<Self> {
        let thresholds: Self = serde_json::from_str(json)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Validate the thresholds
    pub fn validate(&self) -> CostAnomalyResult<()> {
        let non_negative = [
            ("data_quality_threshold", self.data_quality_threshold),
            ("cost_spike_threshold", self.cost_spike_threshold),
            (
                "percentage_increase_threshold",
                self.percentage_increase_threshold,
            ),
            ("absolute_cost_threshold", self.absolute_cost_threshold),
            ("cost_trend_threshold", self.cost_trend_threshold),
            ("severity.low", self.severity.low),
            ("severity.medium", self.severity.medium),
            ("severity.high", self.severity.high),
            ("severity.critical", self.severity.critical),
            (
                "service_contribution_threshold",
                self.service_contribution_threshold,
            ),
            (
                "resource_contribution_threshold",
                self.resource_contribution_threshold,
            ),
            ("accuracy_weight", self.accuracy_weight),
            ("confidence_weight", self.confidence_weight),
        ];

        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.data_quality_threshold > 1.0 {
            return Err(invalid(format!(
                "data_quality_threshold must be between 0 and 1, got {}",
                self.data_quality_threshold
            )));
        }

        if self.min_historical_days < 0 {
            return Err(invalid(format!(
                "min_historical_days must be non-negative, got {}",
                self.min_historical_days
            )));
        }

        if self.root_cause_window_hours <= 0 {
            return Err(invalid(format!(
                "root_cause_window_hours must be positive, got {}",
                self.root_cause_window_hours
            )));
        }

        if self.min_data_points == 0 || self.moving_average_window == 0 {
            return Err(invalid(
                "min_data_points and moving_average_window must be positive".to_string(),
            ));
        }

        if self.consecutive_anomaly_threshold < 2 {
            return Err(invalid(format!(
                "consecutive_anomaly_threshold must be at least 2 to fit a trend, got {}",
                self.consecutive_anomaly_threshold
            )));
        }

        let bands = &self.severity;
        if !(bands.low <= bands.medium
            && bands.medium <= bands.high
            && bands.high <= bands.critical)
        {
            return Err(invalid(format!(
                "severity bands must be ascending, got low={} medium={} high={} critical={}",
                bands.low, bands.medium, bands.high, bands.critical
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> CostAnomalyError {
    CostAnomalyError::ConfigurationError { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let thresholds = DetectionThresholds::default();
        assert!(thresholds.validate().is_ok());
        assert_eq!(thresholds.min_data_points, 24);
        assert_eq!(thresholds.min_historical_days, 14);
        assert_eq!(thresholds.cost_spike_threshold, 2.0);
        assert_eq!(thresholds.severity.critical, 4.0);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let thresholds = DetectionThresholds {
            cost_spike_threshold: -1.0,
            ..Default::default()
        };
        let error = thresholds.validate().unwrap_err();
        assert!(error.to_string().contains("cost_spike_threshold"));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let thresholds = DetectionThresholds {
            absolute_cost_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_quality_ratio_above_one_rejected() {
        let thresholds = DetectionThresholds {
            data_quality_threshold: 1.2,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_descending_bands_rejected() {
        let thresholds = DetectionThresholds {
            severity: SeverityBands {
                low: 1.5,
                medium: 3.5,
                high: 3.0,
                critical: 4.0,
            },
            ..Default::default()
        };
        let error = thresholds.validate().unwrap_err();
        assert!(error.to_string().contains("ascending"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let thresholds = DetectionThresholds {
            moving_average_window: 0,
            ..Default::default()
        };
        let error = thresholds.validate().unwrap_err();
        assert!(error.to_string().contains("moving_average_window"));
    }

    #[test]
    fn test_single_point_trend_run_rejected() {
        let thresholds = DetectionThresholds {
            consecutive_anomaly_threshold: 1,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_from_json_partial_override() {
        let thresholds = DetectionThresholds::from_json(
            r#"{"min_historical_days": 1, "severity": {"critical": 5.0}}"#,
        )
        .unwrap();
        assert_eq!(thresholds.min_historical_days, 1);
        assert_eq!(thresholds.severity.critical, 5.0);
        assert_eq!(thresholds.severity.high, 3.0);
        assert_eq!(thresholds.min_data_points, 24);
    }

    #[test]
    fn test_from_json_rejects_invalid_values() {
        let result = DetectionThresholds::from_json(r#"{"percentage_increase_threshold": -5}"#);
        assert!(matches!(
            result,
            Err(CostAnomalyError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        let result = DetectionThresholds::from_json("{\"min_data_points\": ");
        assert!(matches!(result, Err(CostAnomalyError::JsonError { .. })));
    }
}
