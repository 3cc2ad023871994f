//! Alerts for anomalies of MEDIUM severity and above

use crate::anomaly::{Anomaly, AnomalyType, Severity};
use crate::detector::DetectedAnomaly;
use crate::root_cause::{Recommendation, RootCauseAnalysis};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Cost anomaly alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Name-based id derived from the anomaly id
    pub id: Uuid,
    /// Severity of the anomaly
    pub severity: Severity,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// The alerted anomaly
    pub anomaly: Anomaly,
    /// Root cause attached to the anomaly
    pub root_cause: RootCauseAnalysis,
    /// Copied from the root cause
    pub recommendations: Vec<Recommendation>,
    /// Region
    pub region: String,
}

/// Builds alerts from detected anomalies
#[derive(Debug, Clone, Default)]
pub struct AlertGenerator;

impl AlertGenerator {
    /// Create a generator
    pub fn new() -> Self {
        Self
    }

    /// Alerts for every alertable anomaly, in input order.
    ///
    /// LOW anomalies are skipped.
    pub fn generate(&self, detected: &[DetectedAnomaly]) -> Vec<Alert> {
        detected
            .iter()
            .filter(|d| d.anomaly.severity.is_alertable())
            .map(|d| {
                let alert = Self::build(&d.anomaly, &d.root_cause_analysis);
                info!("Alert {}: {}", alert.severity, alert.title);
                alert
            })
            .collect()
    }

    fn build(anomaly: &Anomaly, root_cause: &RootCauseAnalysis) -> Alert {
        Alert {
            id: alert_id(&anomaly.id),
            severity: anomaly.severity,
            title: format!(
                "{} {} in {}",
                anomaly.severity,
                label(anomaly.anomaly_type),
                anomaly.region
            ),
            description: describe(anomaly),
            anomaly: anomaly.clone(),
            root_cause: root_cause.clone(),
            recommendations: root_cause.recommendations.clone(),
            region: anomaly.region.clone(),
        }
    }
}

/// Same anomaly id, same alert id
pub fn alert_id(anomaly_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, anomaly_id.as_bytes())
}

fn label(anomaly_type: AnomalyType) -> &'static str {
    match anomaly_type {
        AnomalyType::CostSpike => "cost spike",
        AnomalyType::CostTrend => "cost trend",
        AnomalyType::UsagePattern => "usage pattern anomaly",
        AnomalyType::ServiceAnomaly => "service anomaly",
        AnomalyType::RegionalAnomaly => "regional anomaly",
    }
}

fn describe(anomaly: &Anomaly) -> String {
    match anomaly.anomaly_type {
        AnomalyType::CostSpike => format!(
            "Cost spike detected: ${:.2} vs expected ${:.2} ({:+.1}% deviation)",
            anomaly.actual_cost, anomaly.expected_cost, anomaly.deviation_pct
        ),
        AnomalyType::CostTrend => format!(
            "Cost trend detected: unusual trend, {:+.1}% deviation",
            anomaly.deviation_pct
        ),
        other => format!(
            "Unusual cost pattern ({}): {:+.1}% deviation, {:+.2} standard deviations from the baseline mean",
            other, anomaly.deviation_pct, anomaly.deviation_std
        ),
    }
}
