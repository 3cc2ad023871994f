//! Anomaly detection engine

use super::metrics::DetectionMetrics;
use super::types::*;
use crate::alerts::AlertGenerator;
use crate::anomaly::{Anomaly, AnomalyScorer};
use crate::baseline::{BaselineAnalysis, BaselineEstimator, BaselineOutcome, BaselineStore};
use crate::config::DetectionThresholds;
use crate::error::{CostAnomalyError, CostAnomalyResult};
use crate::quality::{DataQualityReport, DataQualityValidator};
use crate::root_cause::RootCauseAnalyzer;
use crate::types::{CostSeries, RawCostRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Cost anomaly detection engine.
///
/// Holds the per-region baseline store; everything else is a pure function
/// of the request and the thresholds.
pub struct AnomalyDetectionEngine {
    /// Thresholds
    thresholds: Arc<DetectionThresholds>,
    validator: DataQualityValidator,
    estimator: BaselineEstimator,
    scorer: AnomalyScorer,
    root_cause: RootCauseAnalyzer,
    alerts: AlertGenerator,
    /// Latest baseline per region
    store: BaselineStore,
    /// Metrics
    metrics: Arc<RwLock<DetectionMetrics>>,
}

impl AnomalyDetectionEngine {
    /// Create an engine with an empty baseline store
    pub fn new(thresholds: DetectionThresholds) -> CostAnomalyResult<Self> {
        Self::with_store(thresholds, BaselineStore::new())
    }

    /// Create an engine over an existing baseline store
    pub fn with_store(
        thresholds: DetectionThresholds,
        store: BaselineStore,
    ) -> CostAnomalyResult<Self> {
        thresholds.validate()?;

        Ok(Self {
            validator: DataQualityValidator::new(&thresholds),
            estimator: BaselineEstimator::new(&thresholds),
            scorer: AnomalyScorer::new(&thresholds),
            root_cause: RootCauseAnalyzer::new(&thresholds),
            alerts: AlertGenerator::new(),
            thresholds: Arc::new(thresholds),
            store,
            metrics: Arc::new(RwLock::new(DetectionMetrics::default())),
        })
    }

    /// Run detection for one region, stamped with the current time
    pub fn detect(&self, request: DetectionRequest) -> DetectionResult {
        self.detect_at(request, Utc::now())
    }

    /// Run detection for one region, stamped with `detected_at`.
    ///
    /// Never fails: insufficient data comes back as a result with no
    /// anomalies and `error` set. On success the region's stored baseline is
    /// replaced.
    pub fn detect_at(
        &self,
        request: DetectionRequest,
        detected_at: DateTime<Utc>,
    ) -> DetectionResult {
        let DetectionRequest {
            region,
            cost_data,
            resources,
        } = request;

        let series = CostSeries::from_records(&cost_data);
        let skipped_records = series.skipped_records();
        self.metrics.write().skipped_records += skipped_records as u64;

        let report = self.validator.validate(&series);
        if !report.sufficient {
            let reason = report
                .reason
                .clone()
                .unwrap_or_else(|| "Insufficient data".to_string());
            return self.not_established(region, detected_at, reason, report, skipped_records);
        }

        let points = series.valid_points();
        let analysis = match self.estimator.estimate(&points, report) {
            BaselineOutcome::Established(analysis) => *analysis,
            BaselineOutcome::NotEstablished {
                reason,
                quality_report,
            } => {
                return self.not_established(
                    region,
                    detected_at,
                    reason,
                    quality_report,
                    skipped_records,
                )
            }
        };

        let anomalies = self.scorer.score(&points, &analysis, &region, detected_at);

        let mut root_cause_failures = 0;
        let anomalies_detected: Vec<DetectedAnomaly> = anomalies
            .iter()
            .map(|anomaly| {
                let root_cause_analysis = match self.root_cause.analyze(
                    anomaly,
                    &points,
                    resources.as_deref(),
                ) {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        warn!("Root cause analysis failed for {}: {}", anomaly.id, e);
                        root_cause_failures += 1;
                        self.root_cause.unavailable(anomaly, &points, e.to_string())
                    }
                };
                DetectedAnomaly {
                    anomaly: anomaly.clone(),
                    root_cause_analysis,
                }
            })
            .collect();

        let alerts_generated = self.alerts.generate(&anomalies_detected);
        let detection_summary = DetectionSummary::from_anomalies(&anomalies);

        self.store.put(&region, analysis.clone());

        {
            let mut metrics = self.metrics.write();
            metrics.detection_runs += 1;
            metrics.anomalies_detected += anomalies.len() as u64;
            metrics.alerts_generated += alerts_generated.len() as u64;
            metrics.root_cause_failures += root_cause_failures;
        }

        info!(
            "Detection for {} complete: {} anomalies, {} alerts, {} baseline",
            region,
            anomalies.len(),
            alerts_generated.len(),
            analysis.selected_kind()
        );

        DetectionResult {
            region,
            timestamp: detected_at,
            anomalies_detected,
            baseline_analysis: BaselineOutcome::Established(Box::new(analysis)),
            alerts_generated,
            detection_summary,
            skipped_records,
            error: None,
        }
    }

    /// Score a new series against the stored baseline for `region`, stamped
    /// with the current time.
    ///
    /// The stored baseline is left untouched.
    pub fn rescore(
        &self,
        region: &str,
        cost_data: &[RawCostRecord],
    ) -> CostAnomalyResult<Vec<Anomaly>> {
        self.rescore_at(region, cost_data, Utc::now())
    }

    /// Score a new series against the stored baseline for `region`, stamped
    /// with `detected_at`.
    ///
    /// The same series, stored baseline and `detected_at` always give the
    /// same anomalies, ids included.
    pub fn rescore_at(
        &self,
        region: &str,
        cost_data: &[RawCostRecord],
        detected_at: DateTime<Utc>,
    ) -> CostAnomalyResult<Vec<Anomaly>> {
        let baseline = self
            .store
            .get(region)
            .ok_or_else(|| CostAnomalyError::InsufficientData {
                reason: format!("No baseline cached for region {}", region),
            })?;

        let points = CostSeries::from_records(cost_data).valid_points();
        Ok(self.scorer.score(&points, &baseline, region, detected_at))
    }

    /// Stored baseline for `region`
    pub fn baseline_for(&self, region: &str) -> Option<BaselineAnalysis> {
        self.store.get(region)
    }

    /// Baseline store
    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Thresholds the engine was built with
    pub fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Metrics snapshot
    pub fn metrics(&self) -> DetectionMetrics {
        self.metrics.read().clone()
    }

    fn not_established(
        &self,
        region: String,
        detected_at: DateTime<Utc>,
        reason: String,
        quality_report: DataQualityReport,
        skipped_records: usize,
    ) -> DetectionResult {
        warn!("No baseline for {}: {}", region, reason);

        {
            let mut metrics = self.metrics.write();
            metrics.detection_runs += 1;
            metrics.insufficient_data_runs += 1;
        }

        DetectionResult {
            region,
            timestamp: detected_at,
            anomalies_detected: Vec::new(),
            baseline_analysis: BaselineOutcome::NotEstablished {
                reason: reason.clone(),
                quality_report,
            },
            alerts_generated: Vec::new(),
            detection_summary: DetectionSummary::default(),
            skipped_records,
            error: Some(reason),
        }
    }
}
