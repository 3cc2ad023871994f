//! Cost anomaly detection error types

use thiserror::Error;

/// Cost anomaly detection error types
#[derive(Debug, Error)]
pub enum CostAnomalyError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    /// Not enough history to build or reuse a baseline
    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    /// Malformed resource record handed to root cause analysis
    #[error("Invalid resource record {resource_id}: {reason}")]
    InvalidResource { resource_id: String, reason: String },

    /// Cost calculation error
    #[error("Cost calculation error: {details}")]
    CalculationError { details: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },
}

/// Cost anomaly detection result type
pub type CostAnomalyResult<T> = Result<T, CostAnomalyError>;

/// Failure of a fail-soft statistics helper.
///
/// Helpers return this instead of silently producing a number; callers decide
/// which default the failure collapses to (usually `0.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComputationError {
    /// No values to work with
    #[error("empty input")]
    EmptyInput,

    /// Fewer values than the computation needs
    #[error("need at least {required} points, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    /// A series with no spread where a spread is required
    #[error("zero variance")]
    ZeroVariance,

    /// Every per-point comparison was skipped
    #[error("no valid comparisons")]
    NoValidComparisons,

    /// Actual and predicted series differ in length
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}
