//! Detection request and result types

use crate::alerts::Alert;
use crate::anomaly::{Anomaly, AnomalyType, Severity};
use crate::baseline::BaselineOutcome;
use crate::root_cause::RootCauseAnalysis;
use crate::types::{RawCostRecord, ResourceCostRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Detection request for one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRequest {
    /// Region, partitions the baseline store
    pub region: String,
    /// Historical cost records, any order
    pub cost_data: Vec<RawCostRecord>,
    /// Resource snapshot for root cause analysis
    #[serde(default)]
    pub resources: Option<Vec<ResourceCostRecord>>,
}

impl DetectionRequest {
    /// Request without a resource snapshot
    pub fn new(region: impl Into<String>, cost_data: Vec<RawCostRecord>) -> Self {
        Self {
            region: region.into(),
            cost_data,
            resources: None,
        }
    }

    /// Attach a resource snapshot
    pub fn with_resources(mut self, resources: Vec<ResourceCostRecord>) -> Self {
        self.resources = Some(resources);
        self
    }
}

/// An anomaly with its root cause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedAnomaly {
    /// The anomaly
    #[serde(flatten)]
    pub anomaly: Anomaly,
    /// Its root cause, possibly carrying an error note
    pub root_cause_analysis: RootCauseAnalysis,
}

/// Aggregate view of one run's anomalies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Anomalies flagged
    pub total_anomalies: usize,
    /// Count per severity
    pub by_severity: BTreeMap<Severity, usize>,
    /// Count per type
    pub by_type: BTreeMap<AnomalyType, usize>,
    /// `sum(actual - expected)` over the anomalies
    pub total_cost_impact: f64,
    /// Highest severity, then largest |deviation_std|, then earliest
    pub most_severe: Option<Anomaly>,
}

impl DetectionSummary {
    /// Summarize `anomalies`
    pub fn from_anomalies(anomalies: &[Anomaly]) -> Self {
        let mut by_severity = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        for anomaly in anomalies {
            *by_severity.entry(anomaly.severity).or_insert(0) += 1;
            *by_type.entry(anomaly.anomaly_type).or_insert(0) += 1;
        }

        let most_severe = anomalies
            .iter()
            .reduce(|best, candidate| {
                let outranks = candidate.severity > best.severity
                    || (candidate.severity == best.severity
                        && candidate.deviation_std.abs() > best.deviation_std.abs());
                if outranks {
                    candidate
                } else {
                    best
                }
            })
            .cloned();

        Self {
            total_anomalies: anomalies.len(),
            by_severity,
            by_type,
            total_cost_impact: anomalies.iter().map(Anomaly::cost_impact).sum(),
            most_severe,
        }
    }
}

/// Result of one detection call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Region
    pub region: String,
    /// Detection run time
    pub timestamp: DateTime<Utc>,
    /// Anomalies with their root causes, in series order
    pub anomalies_detected: Vec<DetectedAnomaly>,
    /// Baseline built for this run, or why none was
    pub baseline_analysis: BaselineOutcome,
    /// Alerts for MEDIUM and above
    pub alerts_generated: Vec<Alert>,
    /// Aggregate counts
    pub detection_summary: DetectionSummary,
    /// Input records dropped for unparsable timestamps
    pub skipped_records: usize,
    /// Set when no baseline could be established
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    /// Whether a baseline was established
    pub fn baseline_established(&self) -> bool {
        self.baseline_analysis.is_established()
    }

    /// Detected anomalies of one type
    pub fn anomalies_of_type(&self, anomaly_type: AnomalyType) -> Vec<&DetectedAnomaly> {
        self.anomalies_detected
            .iter()
            .filter(|d| d.anomaly.anomaly_type == anomaly_type)
            .collect()
    }

    /// Detected anomalies at or above `severity`
    pub fn anomalies_at_least(&self, severity: Severity) -> Vec<&DetectedAnomaly> {
        self.anomalies_detected
            .iter()
            .filter(|d| d.anomaly.severity >= severity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::ModelKind;
    use chrono::TimeZone;

    fn anomaly(index: usize, severity: Severity, deviation_std: f64) -> Anomaly {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Anomaly {
            id: format!("anomaly-r-0-{index}"),
            timestamp: ts,
            series_index: index,
            anomaly_type: AnomalyType::CostSpike,
            severity,
            actual_cost: 150.0,
            expected_cost: 100.0,
            deviation_pct: 50.0,
            deviation_std,
            trend_score: None,
            baseline_model: ModelKind::MovingAverage,
            region: "r".to_string(),
            detected_at: ts,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = DetectionSummary::from_anomalies(&[]);
        assert_eq!(summary.total_anomalies, 0);
        assert!(summary.most_severe.is_none());
        assert_eq!(summary.total_cost_impact, 0.0);
    }

    #[test]
    fn test_summary_counts_and_impact() {
        let anomalies = vec![
            anomaly(0, Severity::Low, 1.0),
            anomaly(1, Severity::High, 3.2),
            anomaly(2, Severity::High, 3.2),
        ];
        let summary = DetectionSummary::from_anomalies(&anomalies);

        assert_eq!(summary.total_anomalies, 3);
        assert_eq!(summary.by_severity[&Severity::High], 2);
        assert_eq!(summary.by_severity.get(&Severity::Critical), None);
        assert_eq!(summary.by_type[&AnomalyType::CostSpike], 3);
        assert_eq!(summary.total_cost_impact, 150.0);
        // Tie on severity and deviation keeps the earliest
        assert_eq!(summary.most_severe.unwrap().series_index, 1);
    }

    #[test]
    fn test_most_severe_prefers_larger_deviation() {
        let anomalies = vec![
            anomaly(0, Severity::High, 3.1),
            anomaly(1, Severity::High, -3.8),
            anomaly(2, Severity::Medium, 2.5),
        ];
        let summary = DetectionSummary::from_anomalies(&anomalies);
        assert_eq!(summary.most_severe.unwrap().series_index, 1);
    }

    #[test]
    fn test_summary_serializes_enum_keys() {
        let summary = DetectionSummary::from_anomalies(&[anomaly(0, Severity::Medium, 2.1)]);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["by_severity"]["MEDIUM"], 1);
        assert_eq!(value["by_type"]["cost_spike"], 1);
    }
}
