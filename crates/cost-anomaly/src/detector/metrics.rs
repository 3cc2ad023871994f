//! Metrics for the detection engine

use serde::{Deserialize, Serialize};

/// Detection engine metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionMetrics {
    /// Detection calls made
    pub detection_runs: u64,
    /// Calls that stopped at the quality gate or baseline step
    pub insufficient_data_runs: u64,
    /// Anomalies flagged
    pub anomalies_detected: u64,
    /// Alerts generated
    pub alerts_generated: u64,
    /// Root cause analyses replaced by an unavailable result
    pub root_cause_failures: u64,
    /// Input records dropped for unparsable timestamps
    pub skipped_records: u64,
}

impl DetectionMetrics {
    /// Share of runs that established a baseline
    pub fn baseline_rate(&self) -> f64 {
        if self.detection_runs == 0 {
            0.0
        } else {
            (self.detection_runs - self.insufficient_data_runs) as f64 / self.detection_runs as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_rate() {
        let mut metrics = DetectionMetrics::default();
        assert_eq!(metrics.baseline_rate(), 0.0);

        metrics.detection_runs = 4;
        metrics.insufficient_data_runs = 1;
        assert_eq!(metrics.baseline_rate(), 0.75);
    }
}
