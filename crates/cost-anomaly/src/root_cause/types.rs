//! Root cause analysis results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Granularity a contributing factor was found at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorType {
    /// A whole service (resource type)
    Service,
    /// A single resource
    Resource,
}

/// A service or resource whose share of the cost increase crossed its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    /// Service or resource
    pub factor_type: FactorType,
    /// Service name or resource id
    pub name: String,
    /// Share of the total cost increase (0-100)
    pub contribution_pct: f64,
    /// Cost increase attributed to this factor
    pub cost_increase: f64,
    /// Human readable summary
    pub description: String,
}

/// Cost increase of one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceContribution {
    /// Service name (the resources' declared type)
    pub service: String,
    /// Summed cost increase of the service's resources
    pub cost_increase: f64,
    /// Share of the total cost increase (0-100)
    pub contribution_pct: f64,
    /// Resources of this service in the snapshot
    pub resource_count: usize,
}

/// Cost increase of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContribution {
    /// Resource identifier
    pub resource_id: String,
    /// Service the resource belongs to
    pub resource_type: String,
    /// `max(0, current - historical average)`
    pub cost_increase: f64,
    /// Share of the total cost increase (0-100)
    pub contribution_pct: f64,
}

/// Cost pattern around the anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeWindowAnalysis {
    /// No cost points fell inside the window
    Empty {
        /// Window start
        start: DateTime<Utc>,
        /// Window end
        end: DateTime<Utc>,
    },
    /// Statistics of the points inside the window
    Populated {
        /// Window start
        start: DateTime<Utc>,
        /// Window end
        end: DateTime<Utc>,
        /// Points inside the window
        point_count: usize,
        /// Lowest cost
        min: f64,
        /// Highest cost
        max: f64,
        /// Mean cost
        mean: f64,
        /// Median cost
        median: f64,
        /// Sample standard deviation
        std_dev: f64,
        /// Least squares slope per point
        trend_slope: f64,
        /// `std_dev / mean`, 0 when the mean is 0
        volatility: f64,
    },
}

impl TimeWindowAnalysis {
    /// Whether no points fell inside the window
    pub fn is_empty(&self) -> bool {
        matches!(self, TimeWindowAnalysis::Empty { .. })
    }
}

/// Recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    /// Look into a service's usage
    InvestigateService,
    /// Look into a single resource
    InvestigateResource,
    /// Tighten monitoring so the next anomaly is caught earlier
    EnhanceMonitoring,
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Low priority
    Low = 0,
    /// Medium priority
    Medium = 1,
    /// High priority
    High = 2,
}

/// Suggested follow-up action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Category
    pub category: RecommendationCategory,
    /// Priority
    pub priority: Priority,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
}

/// Attribution of one anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    /// Services then resources over their contribution thresholds
    pub contributing_factors: Vec<ContributingFactor>,
    /// Every service, largest increase first
    pub service_breakdown: Vec<ServiceContribution>,
    /// Every resource, largest increase first
    pub resource_breakdown: Vec<ResourceContribution>,
    /// Summed cost increase over all resources
    pub total_cost_increase: f64,
    /// Cost pattern around the anomaly
    pub time_window_analysis: TimeWindowAnalysis,
    /// One per contributing factor, then a monitoring entry
    pub recommendations: Vec<Recommendation>,
    /// Set when attribution failed and the breakdowns are empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RootCauseAnalysis {
    /// Factors of one granularity
    pub fn factors_of(
        &self,
        factor_type: FactorType,
    ) -> impl Iterator<Item = &ContributingFactor> {
        self.contributing_factors
            .iter()
            .filter(move |factor| factor.factor_type == factor_type)
    }

    /// Contribution of `service`, if it appears in the snapshot
    pub fn service_contribution(&self, service: &str) -> Option<f64> {
        self.service_breakdown
            .iter()
            .find(|entry| entry.service == service)
            .map(|entry| entry.contribution_pct)
    }
}
