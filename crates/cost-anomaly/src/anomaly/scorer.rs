//! Single forward pass over a cost series against its selected baseline
//!
//! Each point gets a spike test against the baseline expectation and
//! statistics. Once `consecutive_anomaly_threshold` spikes in a row have
//! accumulated, the slope of that run is also tested and a steep run is
//! reported as a trend. A flagged point is never revisited.

use super::types::{Anomaly, AnomalyType, Severity};
use crate::baseline::BaselineAnalysis;
use crate::config::{DetectionThresholds, SeverityBands};
use crate::statistics;
use crate::types::CostDataPoint;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Anomaly scorer
#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    cost_spike_threshold: f64,
    percentage_increase_threshold: f64,
    absolute_cost_threshold: f64,
    consecutive_anomaly_threshold: usize,
    cost_trend_threshold: f64,
    bands: SeverityBands,
}

impl AnomalyScorer {
    /// Create a scorer from the detection thresholds
    pub fn new(thresholds: &DetectionThresholds) -> Self {
        Self {
            cost_spike_threshold: thresholds.cost_spike_threshold,
            percentage_increase_threshold: thresholds.percentage_increase_threshold,
            absolute_cost_threshold: thresholds.absolute_cost_threshold,
            consecutive_anomaly_threshold: thresholds.consecutive_anomaly_threshold,
            cost_trend_threshold: thresholds.cost_trend_threshold,
            bands: thresholds.severity,
        }
    }

    /// Score `points` against `baseline`.
    ///
    /// Pure: the same points, baseline, region and `detected_at` always give
    /// the same anomalies.
    pub fn score(
        &self,
        points: &[CostDataPoint],
        baseline: &BaselineAnalysis,
        region: &str,
        detected_at: DateTime<Utc>,
    ) -> Vec<Anomaly> {
        let model = &baseline.selected_model;
        let mean = baseline.statistics.mean;
        let std_dev = baseline.statistics.std_dev;
        let values: Vec<f64> = points.iter().map(|p| p.cost).collect();

        let mut anomalies = Vec::new();
        let mut run = 0;

        for (i, point) in points.iter().enumerate() {
            let actual = point.cost;
            let expected = model.expected_at(i);

            let deviation_pct = if expected != 0.0 {
                (actual - expected) / expected * 100.0
            } else {
                0.0
            };
            let deviation_std = if std_dev != 0.0 {
                (actual - mean) / std_dev
            } else {
                0.0
            };

            let is_spike = deviation_std.abs() >= self.cost_spike_threshold
                || deviation_pct >= self.percentage_increase_threshold
                || actual - expected >= self.absolute_cost_threshold;
            if !is_spike {
                run = 0;
                continue;
            }
            run += 1;

            let trend_score = if run >= self.consecutive_anomaly_threshold {
                let start = i + 1 - self.consecutive_anomaly_threshold;
                self.trend_score(&values[start..=i], std_dev)
            } else {
                None
            };

            // A trend is banded on its slope as well, so it can outrank a
            // plain spike with a larger deviation
            let (anomaly_type, signal) = match trend_score {
                Some(score) => (AnomalyType::CostTrend, deviation_std.abs().max(score)),
                None => (AnomalyType::CostSpike, deviation_std.abs()),
            };

            let anomaly = Anomaly {
                id: format!(
                    "anomaly-{}-{}-{}",
                    region,
                    detected_at.timestamp(),
                    anomalies.len()
                ),
                timestamp: point.timestamp,
                series_index: i,
                anomaly_type,
                severity: Severity::classify(signal, &self.bands),
                actual_cost: actual,
                expected_cost: expected,
                deviation_pct,
                deviation_std,
                trend_score,
                baseline_model: model.kind(),
                region: region.to_string(),
                detected_at,
            };

            warn!(
                "{} anomaly in {} at {}: actual={:.2} expected={:.2} ({:+.1}%, {:+.2} std)",
                anomaly.severity,
                region,
                anomaly.timestamp,
                actual,
                expected,
                deviation_pct,
                deviation_std
            );

            anomalies.push(anomaly);
        }

        anomalies
    }

    /// Normalized slope of a run of consecutive spikes, when it crosses the
    /// trend threshold
    fn trend_score(&self, window: &[f64], std_dev: f64) -> Option<f64> {
        if std_dev == 0.0 {
            return None;
        }

        let fit = statistics::fit_linear_trend(window).ok()?;
        let normalized = fit.slope.abs() / std_dev;

        (normalized >= self.cost_trend_threshold).then_some(normalized)
    }
}
