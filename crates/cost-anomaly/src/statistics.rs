//! Statistical helpers shared by the baseline, scoring and root cause stages
//!
//! Every helper that can fail returns a [`ComputationError`] instead of a
//! silent fallback. Call sites that want fail-soft behavior collapse the error
//! explicitly, e.g. `pearson_correlation(a, b).unwrap_or(0.0)`.

use crate::error::ComputationError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64, ComputationError> {
    if values.is_empty() {
        return Err(ComputationError::EmptyInput);
    }
    Ok(statistical::mean(values))
}

/// Median, averaging the two middle values for even lengths
pub fn median(values: &[f64]) -> Result<f64, ComputationError> {
    if values.is_empty() {
        return Err(ComputationError::EmptyInput);
    }
    Ok(statistical::median(values))
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> Result<f64, ComputationError> {
    if values.len() < 2 {
        return Err(ComputationError::InsufficientPoints {
            required: 2,
            actual: values.len(),
        });
    }
    let avg = statistical::mean(values);
    Ok(statistical::variance(values, Some(avg)))
}

/// Sample standard deviation (n - 1 denominator)
pub fn std_dev(values: &[f64]) -> Result<f64, ComputationError> {
    if values.len() < 2 {
        return Err(ComputationError::InsufficientPoints {
            required: 2,
            actual: values.len(),
        });
    }
    let avg = statistical::mean(values);
    Ok(statistical::standard_deviation(values, Some(avg)))
}

/// Ascending copy of `values`
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|value| OrderedFloat(*value));
    sorted
}

/// Nearest-rank percentile of a sorted slice
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (p / 100.0 * (sorted_data.len() - 1) as f64).round() as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}

/// Least squares line of value against index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Change per index step
    pub slope: f64,
    /// Fitted value at index 0
    pub intercept: f64,
}

impl LinearFit {
    /// Fitted value at `index`
    pub fn value_at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }
}

/// Ordinary least squares of value vs. index.
///
/// A single point (zero variance in the index) yields slope 0 through that point.
pub fn fit_linear_trend(values: &[f64]) -> Result<LinearFit, ComputationError> {
    if values.is_empty() {
        return Err(ComputationError::EmptyInput);
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = statistical::mean(values);

    let mut num = 0.0;
    let mut den = 0.0;

    for (i, value) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (value - y_mean);
        den += dx * dx;
    }

    let slope = if den != 0.0 { num / den } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    Ok(LinearFit { slope, intercept })
}

/// Mean absolute percentage error, in percent.
///
/// Points whose actual value is zero are skipped.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64, ComputationError> {
    if actual.len() != predicted.len() {
        return Err(ComputationError::LengthMismatch {
            left: actual.len(),
            right: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ComputationError::EmptyInput);
    }

    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();

    if errors.is_empty() {
        return Err(ComputationError::NoValidComparisons);
    }

    Ok(errors.iter().sum::<f64>() / errors.len() as f64 * 100.0)
}

/// Pearson correlation coefficient
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, ComputationError> {
    if a.len() != b.len() {
        return Err(ComputationError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(ComputationError::InsufficientPoints {
            required: 2,
            actual: a.len(),
        });
    }

    let a_mean = statistical::mean(a);
    let b_mean = statistical::mean(b);

    let mut cov = 0.0;
    let mut a_ss = 0.0;
    let mut b_ss = 0.0;

    for (x, y) in a.iter().zip(b) {
        let dx = x - a_mean;
        let dy = y - b_mean;
        cov += dx * dy;
        a_ss += dx * dx;
        b_ss += dy * dy;
    }

    // Float noise on a constant series must not count as spread
    let scale = a_mean.abs().max(b_mean.abs()).max(1.0);
    let epsilon = 1e-18 * scale * scale * a.len() as f64;
    if a_ss <= epsilon || b_ss <= epsilon {
        return Err(ComputationError::ZeroVariance);
    }

    Ok(cov / (a_ss.sqrt() * b_ss.sqrt()))
}

/// Mean of the trailing `window` values ending at each index (inclusive).
///
/// Early indices average over however many values exist so far.
pub fn trailing_means(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut means = Vec::with_capacity(values.len());
    let mut running = 0.0;

    for (i, value) in values.iter().enumerate() {
        running += value;
        if i >= window {
            running -= values[i - window];
        }
        let count = (i + 1).min(window);
        means.push(running / count as f64);
    }

    means
}

/// Descriptive statistics over a cost series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStatistics {
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Sample standard deviation, 0 below two points
    pub std_dev: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
    /// 25th percentile
    pub q25: f64,
    /// 75th percentile
    pub q75: f64,
    /// Sample variance, 0 below two points
    pub variance: f64,
    /// Number of values summarized
    pub point_count: usize,
}

impl BaselineStatistics {
    /// Summarize a series; fails only on empty input
    pub fn from_values(values: &[f64]) -> Result<Self, ComputationError> {
        let mean = mean(values)?;
        let median = median(values)?;
        let sorted = sorted(values);

        Ok(Self {
            mean,
            median,
            std_dev: std_dev(values).unwrap_or(0.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q25: percentile(&sorted, 25.0),
            q75: percentile(&sorted, 75.0),
            variance: variance(values).unwrap_or(0.0),
            point_count: values.len(),
        })
    }
}
