//! Input data model for cost anomaly detection
//!
//! Cost and resource records arrive from billing collectors as loosely typed
//! records. They are parsed once into a time-ordered [`CostSeries`] and never
//! modified afterwards.

use crate::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Cost record as supplied by a billing collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCostRecord {
    /// ISO-8601 timestamp
    pub timestamp: String,
    /// Cost for the period, absent when the collector had no figure
    pub cost: Option<f64>,
}

impl RawCostRecord {
    /// Build a record with a known cost
    pub fn new(timestamp: impl Into<String>, cost: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            cost: Some(cost),
        }
    }
}

/// A cost observation with a parsed timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedCost {
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// Usable cost, `None` when missing, negative or not finite
    pub cost: Option<f64>,
}

/// A validated cost data point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostDataPoint {
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// Cost, always finite and non-negative
    pub cost: f64,
}

/// Time-ordered cost observations for one account/region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSeries {
    observations: Vec<ObservedCost>,
    skipped_records: usize,
}

impl CostSeries {
    /// Parse raw records, skipping those with unparsable timestamps.
    ///
    /// Records are sorted by timestamp; equal timestamps keep input order and
    /// are not deduplicated.
    pub fn from_records(records: &[RawCostRecord]) -> Self {
        let mut observations = Vec::with_capacity(records.len());
        let mut skipped_records = 0;

        for record in records {
            match parse_timestamp(&record.timestamp) {
                Some(timestamp) => observations.push(ObservedCost {
                    timestamp,
                    cost: record.cost.filter(|cost| cost.is_finite() && *cost >= 0.0),
                }),
                None => {
                    skipped_records += 1;
                    warn!(
                        "Skipping cost record with unparsable timestamp: {:?}",
                        record.timestamp
                    );
                }
            }
        }

        observations.sort_by_key(|observation| observation.timestamp);

        Self {
            observations,
            skipped_records,
        }
    }

    /// Build a series from already typed data points
    pub fn from_points(points: &[CostDataPoint]) -> Self {
        let mut observations: Vec<ObservedCost> = points
            .iter()
            .map(|point| ObservedCost {
                timestamp: point.timestamp,
                cost: Some(point.cost).filter(|cost| cost.is_finite() && *cost >= 0.0),
            })
            .collect();
        observations.sort_by_key(|observation| observation.timestamp);

        Self {
            observations,
            skipped_records: 0,
        }
    }

    /// All parsed observations in time order
    pub fn observations(&self) -> &[ObservedCost] {
        &self.observations
    }

    /// Observations with a usable cost, in time order
    pub fn valid_points(&self) -> Vec<CostDataPoint> {
        self.observations
            .iter()
            .filter_map(|observation| {
                observation.cost.map(|cost| CostDataPoint {
                    timestamp: observation.timestamp,
                    cost,
                })
            })
            .collect()
    }

    /// Records dropped because their timestamp could not be parsed
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Number of parsed observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether no observation was parsed
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Per-resource cost snapshot used for root cause attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCostRecord {
    /// Resource identifier (instance id, ARN, ...)
    pub resource_id: String,
    /// Service or resource type the resource belongs to (ec2, rds, ...)
    pub resource_type: String,
    /// Cost in the current period
    pub current_cost: f64,
    /// Average cost over the historical periods
    pub historical_average_cost: f64,
    /// Region the resource lives in
    #[serde(default)]
    pub region: String,
}

impl ResourceCostRecord {
    /// Cost increase over the historical average, never negative
    pub fn cost_increase(&self) -> f64 {
        (self.current_cost - self.historical_average_cost).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_records_are_sorted() {
        let records = vec![
            RawCostRecord::new("2024-03-01T02:00:00Z", 3.0),
            RawCostRecord::new("2024-03-01T00:00:00Z", 1.0),
            RawCostRecord::new("2024-03-01T01:00:00Z", 2.0),
        ];

        let series = CostSeries::from_records(&records);
        let costs: Vec<f64> = series.valid_points().iter().map(|p| p.cost).collect();
        assert_eq!(costs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unparsable_timestamps_are_skipped() {
        let records = vec![
            RawCostRecord::new("2024-03-01T00:00:00Z", 1.0),
            RawCostRecord::new("not-a-date", 2.0),
            RawCostRecord::new("", 3.0),
        ];

        let series = CostSeries::from_records(&records);
        assert_eq!(series.len(), 1);
        assert_eq!(series.skipped_records(), 2);
    }

    #[test]
    fn test_unusable_costs_kept_as_observations() {
        let records = vec![
            RawCostRecord::new("2024-03-01T00:00:00Z", 1.0),
            RawCostRecord {
                timestamp: "2024-03-01T01:00:00Z".to_string(),
                cost: None,
            },
            RawCostRecord::new("2024-03-01T02:00:00Z", -4.0),
            RawCostRecord::new("2024-03-01T03:00:00Z", f64::NAN),
        ];

        let series = CostSeries::from_records(&records);
        assert_eq!(series.len(), 4);
        assert_eq!(series.valid_points().len(), 1);
    }

    #[test]
    fn test_duplicate_timestamps_not_deduplicated() {
        let records = vec![
            RawCostRecord::new("2024-03-01T00:00:00Z", 1.0),
            RawCostRecord::new("2024-03-01T00:00:00Z", 2.0),
        ];

        let series = CostSeries::from_records(&records);
        let costs: Vec<f64> = series.valid_points().iter().map(|p| p.cost).collect();
        assert_eq!(costs, vec![1.0, 2.0]);
    }

    #[test]
    fn test_from_points() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let points = vec![
            CostDataPoint {
                timestamp: base + chrono::Duration::hours(1),
                cost: 5.0,
            },
            CostDataPoint {
                timestamp: base,
                cost: 4.0,
            },
        ];

        let series = CostSeries::from_points(&points);
        assert_eq!(series.observations()[0].timestamp, base);
        assert_eq!(series.skipped_records(), 0);
    }

    #[test]
    fn test_resource_record_camel_case() {
        let json = r#"{
            "resourceId": "i-0abc",
            "resourceType": "ec2",
            "currentCost": 120.0,
            "historicalAverageCost": 20.0,
            "region": "us-east-1"
        }"#;

        let record: ResourceCostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.resource_id, "i-0abc");
        assert_eq!(record.cost_increase(), 100.0);
    }

    #[test]
    fn test_cost_increase_never_negative() {
        let record = ResourceCostRecord {
            resource_id: "db-1".to_string(),
            resource_type: "rds".to_string(),
            current_cost: 5.0,
            historical_average_cost: 10.0,
            region: String::new(),
        };
        assert_eq!(record.cost_increase(), 0.0);
    }
}
