//! Baseline estimation: fit, score and select

use super::models::*;
use crate::config::DetectionThresholds;
use crate::quality::DataQualityReport;
use crate::statistics::{self, BaselineStatistics};
use crate::types::CostDataPoint;
use chrono::Timelike;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fits the four baseline models and selects the best one
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    moving_average_window: usize,
    seasonal_min_points: usize,
    accuracy_weight: f64,
    confidence_weight: f64,
}

impl BaselineEstimator {
    /// Create an estimator from the detection thresholds
    pub fn new(thresholds: &DetectionThresholds) -> Self {
        Self {
            moving_average_window: thresholds.moving_average_window,
            seasonal_min_points: thresholds.seasonal_min_points,
            accuracy_weight: thresholds.accuracy_weight,
            confidence_weight: thresholds.confidence_weight,
        }
    }

    /// Build a baseline over quality-validated points.
    ///
    /// Returns [`BaselineOutcome::NotEstablished`] if there is nothing to fit,
    /// which the validator should already have prevented.
    pub fn estimate(
        &self,
        points: &[CostDataPoint],
        quality_report: DataQualityReport,
    ) -> BaselineOutcome {
        let values: Vec<f64> = points.iter().map(|p| p.cost).collect();

        let statistics = match BaselineStatistics::from_values(&values) {
            Ok(statistics) => statistics,
            Err(e) => {
                return BaselineOutcome::NotEstablished {
                    reason: format!("Baseline not established: {}", e),
                    quality_report,
                }
            }
        };

        let models = [
            self.moving_average_model(&values),
            self.seasonal_model(points, statistics.mean),
            Self::linear_trend_model(&values),
            Self::percentile_model(&values),
        ];

        let mut all_models = BTreeMap::new();
        let mut selected: Option<(f64, &BaselineModel)> = None;

        for model in &models {
            let score = model.weighted_score(self.accuracy_weight, self.confidence_weight);
            debug!(
                "Baseline model {} scored {:.2} (accuracy {:.2}, confidence {:.2})",
                model.kind(),
                score,
                model.accuracy,
                model.confidence
            );

            // Strictly greater keeps the earlier kind on ties
            if selected.map_or(true, |(best, _)| score > best) {
                selected = Some((score, model));
            }
        }

        let selected_model = match selected {
            Some((_, model)) => model.clone(),
            None => {
                return BaselineOutcome::NotEstablished {
                    reason: "Baseline not established: no model could be fitted".to_string(),
                    quality_report,
                }
            }
        };

        for model in models {
            all_models.insert(model.kind(), model);
        }

        info!(
            "Selected {} baseline over {} points (accuracy {:.2}, confidence {:.2})",
            selected_model.kind(),
            values.len(),
            selected_model.accuracy,
            selected_model.confidence
        );

        // Non-empty: BaselineStatistics::from_values succeeded
        let period = BaselinePeriod {
            start: points[0].timestamp,
            end: points[points.len() - 1].timestamp,
            point_count: points.len(),
        };

        BaselineOutcome::Established(Box::new(BaselineAnalysis {
            quality_report,
            statistics,
            all_models,
            selected_model,
            period,
        }))
    }

    /// Trailing moving average, window capped at the series length
    pub fn moving_average_model(&self, values: &[f64]) -> BaselineModel {
        let window = self.moving_average_window.min(values.len()).max(1);
        let predictions = statistics::trailing_means(values, window);

        scored(
            ModelParameters::MovingAverage { window },
            values,
            predictions,
        )
    }

    /// Hour-of-day means; the global mean when the series is shorter than a week
    pub fn seasonal_model(&self, points: &[CostDataPoint], global_mean: f64) -> BaselineModel {
        let values: Vec<f64> = points.iter().map(|p| p.cost).collect();

        if points.len() < self.seasonal_min_points {
            return scored(
                ModelParameters::Seasonal {
                    hourly_averages: Vec::new(),
                    fallback: true,
                },
                &values,
                vec![global_mean; values.len()],
            );
        }

        let mut sums = [0.0_f64; 24];
        let mut counts = [0_usize; 24];
        for point in points {
            let hour = point.timestamp.hour() as usize;
            sums[hour] += point.cost;
            counts[hour] += 1;
        }

        let hourly_averages: Vec<HourlyAverage> = (0..24)
            .filter(|&hour| counts[hour] > 0)
            .map(|hour| HourlyAverage {
                hour: hour as u32,
                average: sums[hour] / counts[hour] as f64,
                samples: counts[hour],
            })
            .collect();

        let predictions = points
            .iter()
            .map(|point| {
                let hour = point.timestamp.hour() as usize;
                if counts[hour] > 0 {
                    sums[hour] / counts[hour] as f64
                } else {
                    global_mean
                }
            })
            .collect();

        scored(
            ModelParameters::Seasonal {
                hourly_averages,
                fallback: false,
            },
            &values,
            predictions,
        )
    }

    /// Least squares line over the series index
    pub fn linear_trend_model(values: &[f64]) -> BaselineModel {
        let fit = statistics::fit_linear_trend(values).unwrap_or(statistics::LinearFit {
            slope: 0.0,
            intercept: 0.0,
        });
        let predictions = (0..values.len()).map(|i| fit.value_at(i)).collect();

        scored(
            ModelParameters::LinearTrend {
                slope: fit.slope,
                intercept: fit.intercept,
            },
            values,
            predictions,
        )
    }

    /// Median for every point, with percentile bands
    pub fn percentile_model(values: &[f64]) -> BaselineModel {
        let sorted = statistics::sorted(values);
        let median = statistics::median(values).unwrap_or(0.0);
        let percentiles = Percentiles {
            p10: statistics::percentile(&sorted, 10.0),
            p25: statistics::percentile(&sorted, 25.0),
            p50: median,
            p75: statistics::percentile(&sorted, 75.0),
            p90: statistics::percentile(&sorted, 90.0),
        };

        scored(
            ModelParameters::Percentile { percentiles },
            values,
            vec![median; values.len()],
        )
    }
}

/// Attach retrospective accuracy and confidence to a set of predictions
fn scored(parameters: ModelParameters, actual: &[f64], predictions: Vec<f64>) -> BaselineModel {
    let accuracy = statistics::mape(actual, &predictions)
        .map(|mape| (100.0 - mape).clamp(0.0, 100.0))
        .unwrap_or(0.0);
    let confidence = statistics::pearson_correlation(actual, &predictions)
        .map(|r| (r.abs() * 100.0).clamp(0.0, 100.0))
        .unwrap_or(0.0);

    BaselineModel {
        parameters,
        predictions,
        accuracy,
        confidence,
    }
}
