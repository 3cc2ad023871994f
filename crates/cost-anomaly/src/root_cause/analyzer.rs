//! Attribution of an anomaly to services and resources

use super::types::*;
use crate::anomaly::Anomaly;
use crate::config::DetectionThresholds;
use crate::error::{CostAnomalyError, CostAnomalyResult};
use crate::statistics;
use crate::types::{CostDataPoint, ResourceCostRecord};
use chrono::Duration as ChronoDuration;
use std::collections::BTreeMap;
use tracing::debug;

/// Root cause analyzer
#[derive(Debug, Clone)]
pub struct RootCauseAnalyzer {
    service_contribution_threshold: f64,
    resource_contribution_threshold: f64,
    window_hours: i64,
}

impl RootCauseAnalyzer {
    /// Create an analyzer from the detection thresholds
    pub fn new(thresholds: &DetectionThresholds) -> Self {
        Self {
            service_contribution_threshold: thresholds.service_contribution_threshold,
            resource_contribution_threshold: thresholds.resource_contribution_threshold,
            window_hours: thresholds.root_cause_window_hours,
        }
    }

    /// Attribute `anomaly` to the resources in the snapshot.
    ///
    /// Without a snapshot the breakdowns are empty and only the time window
    /// and the monitoring recommendation are reported. Fails on the first
    /// malformed resource record.
    pub fn analyze(
        &self,
        anomaly: &Anomaly,
        points: &[CostDataPoint],
        resources: Option<&[ResourceCostRecord]>,
    ) -> CostAnomalyResult<RootCauseAnalysis> {
        let resources = resources.unwrap_or(&[]);
        for resource in resources {
            validate_resource(resource)?;
        }

        let total_cost_increase: f64 = resources.iter().map(|r| r.cost_increase()).sum();
        let service_breakdown = service_breakdown(resources, total_cost_increase);
        let resource_breakdown = resource_breakdown(resources, total_cost_increase);

        let mut contributing_factors = Vec::new();
        for entry in &service_breakdown {
            if entry.contribution_pct >= self.service_contribution_threshold {
                contributing_factors.push(ContributingFactor {
                    factor_type: FactorType::Service,
                    name: entry.service.clone(),
                    contribution_pct: entry.contribution_pct,
                    cost_increase: entry.cost_increase,
                    description: format!(
                        "Service {} accounts for {:.1}% of the ${:.2} cost increase",
                        entry.service, entry.contribution_pct, total_cost_increase
                    ),
                });
            }
        }
        for entry in &resource_breakdown {
            if entry.contribution_pct >= self.resource_contribution_threshold {
                contributing_factors.push(ContributingFactor {
                    factor_type: FactorType::Resource,
                    name: entry.resource_id.clone(),
                    contribution_pct: entry.contribution_pct,
                    cost_increase: entry.cost_increase,
                    description: format!(
                        "Resource {} ({}) accounts for {:.1}% of the ${:.2} cost increase",
                        entry.resource_id,
                        entry.resource_type,
                        entry.contribution_pct,
                        total_cost_increase
                    ),
                });
            }
        }

        let recommendations = recommendations(anomaly, &contributing_factors);

        debug!(
            "Root cause for {}: {} contributing factors over ${:.2} increase",
            anomaly.id,
            contributing_factors.len(),
            total_cost_increase
        );

        Ok(RootCauseAnalysis {
            contributing_factors,
            service_breakdown,
            resource_breakdown,
            total_cost_increase,
            time_window_analysis: self.time_window(anomaly, points),
            recommendations,
            error: None,
        })
    }

    /// Analysis for an anomaly whose attribution failed.
    ///
    /// Breakdowns stay empty; the time window does not depend on the
    /// resources and is still reported.
    pub fn unavailable(
        &self,
        anomaly: &Anomaly,
        points: &[CostDataPoint],
        error: impl Into<String>,
    ) -> RootCauseAnalysis {
        RootCauseAnalysis {
            contributing_factors: Vec::new(),
            service_breakdown: Vec::new(),
            resource_breakdown: Vec::new(),
            total_cost_increase: 0.0,
            time_window_analysis: self.time_window(anomaly, points),
            recommendations: recommendations(anomaly, &[]),
            error: Some(error.into()),
        }
    }

    /// Statistics of the points within `window_hours` either side of the anomaly
    pub fn time_window(&self, anomaly: &Anomaly, points: &[CostDataPoint]) -> TimeWindowAnalysis {
        let half = ChronoDuration::hours(self.window_hours);
        let start = anomaly.timestamp - half;
        let end = anomaly.timestamp + half;

        let values: Vec<f64> = points
            .iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .map(|p| p.cost)
            .collect();

        if values.is_empty() {
            return TimeWindowAnalysis::Empty { start, end };
        }

        let mean = statistics::mean(&values).unwrap_or(0.0);
        let std_dev = statistics::std_dev(&values).unwrap_or(0.0);

        TimeWindowAnalysis::Populated {
            start,
            end,
            point_count: values.len(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            median: statistics::median(&values).unwrap_or(0.0),
            std_dev,
            trend_slope: statistics::fit_linear_trend(&values)
                .map(|fit| fit.slope)
                .unwrap_or(0.0),
            volatility: if mean != 0.0 { std_dev / mean } else { 0.0 },
        }
    }
}

fn validate_resource(resource: &ResourceCostRecord) -> CostAnomalyResult<()> {
    let invalid = |reason: &str| CostAnomalyError::InvalidResource {
        resource_id: resource.resource_id.clone(),
        reason: reason.to_string(),
    };

    if resource.resource_id.trim().is_empty() {
        return Err(invalid("empty resource id"));
    }
    if !resource.current_cost.is_finite() || resource.current_cost < 0.0 {
        return Err(invalid("current cost must be a non-negative number"));
    }
    if !resource.historical_average_cost.is_finite() || resource.historical_average_cost < 0.0 {
        return Err(invalid("historical average cost must be a non-negative number"));
    }
    Ok(())
}

fn share(increase: f64, total: f64) -> f64 {
    if total > 0.0 {
        increase / total * 100.0
    } else {
        0.0
    }
}

/// Per-service totals, largest increase first, ties by name
fn service_breakdown(resources: &[ResourceCostRecord], total: f64) -> Vec<ServiceContribution> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for resource in resources {
        let entry = groups.entry(resource.resource_type.as_str()).or_insert((0.0, 0));
        entry.0 += resource.cost_increase();
        entry.1 += 1;
    }

    let mut breakdown: Vec<ServiceContribution> = groups
        .into_iter()
        .map(|(service, (cost_increase, resource_count))| ServiceContribution {
            service: service.to_string(),
            cost_increase,
            contribution_pct: share(cost_increase, total),
            resource_count,
        })
        .collect();
    // Stable: equal increases keep name order from the BTreeMap
    breakdown.sort_by(|a, b| b.cost_increase.total_cmp(&a.cost_increase));
    breakdown
}

/// Per-resource shares, largest increase first, ties by input order
fn resource_breakdown(resources: &[ResourceCostRecord], total: f64) -> Vec<ResourceContribution> {
    let mut breakdown: Vec<ResourceContribution> = resources
        .iter()
        .map(|resource| {
            let cost_increase = resource.cost_increase();
            ResourceContribution {
                resource_id: resource.resource_id.clone(),
                resource_type: resource.resource_type.clone(),
                cost_increase,
                contribution_pct: share(cost_increase, total),
            }
        })
        .collect();
    breakdown.sort_by(|a, b| b.cost_increase.total_cmp(&a.cost_increase));
    breakdown
}

fn recommendations(anomaly: &Anomaly, factors: &[ContributingFactor]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = factors
        .iter()
        .map(|factor| {
            let priority = if factor.contribution_pct >= 50.0 {
                Priority::High
            } else {
                Priority::Medium
            };
            match factor.factor_type {
                FactorType::Service => Recommendation {
                    category: RecommendationCategory::InvestigateService,
                    priority,
                    title: format!("Investigate {} cost increase", factor.name),
                    description: format!(
                        "Review {} usage and scaling: its cost rose by ${:.2} ({:.1}% of the increase)",
                        factor.name, factor.cost_increase, factor.contribution_pct
                    ),
                },
                FactorType::Resource => Recommendation {
                    category: RecommendationCategory::InvestigateResource,
                    priority,
                    title: format!("Investigate resource {}", factor.name),
                    description: format!(
                        "Check sizing and utilization of {}: its cost rose by ${:.2} ({:.1}% of the increase)",
                        factor.name, factor.cost_increase, factor.contribution_pct
                    ),
                },
            }
        })
        .collect();

    recommendations.push(Recommendation {
        category: RecommendationCategory::EnhanceMonitoring,
        priority: Priority::Low,
        title: "Enhance cost monitoring".to_string(),
        description: format!(
            "Add finer-grained budget alerts in {} to catch {} anomalies earlier",
            anomaly.region, anomaly.anomaly_type
        ),
    });

    recommendations
}
