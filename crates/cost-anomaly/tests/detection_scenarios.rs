use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use stratoswarm_cost_anomaly::{
    baseline::ModelParameters,
    root_cause::{FactorType, RootCauseAnalyzer},
    AnomalyDetectionEngine, AnomalyType, BaselineStore, CostAnomalyError, DetectionRequest,
    DetectionThresholds, ModelKind, RawCostRecord, ResourceCostRecord, Severity,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn hourly(values: &[f64]) -> Vec<RawCostRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, cost)| {
            RawCostRecord::new(
                (start() + Duration::hours(i as i64)).to_rfc3339(),
                *cost,
            )
        })
        .collect()
}

/// Defaults, except a one-day span so short hourly series qualify
fn short_span_engine() -> AnomalyDetectionEngine {
    let thresholds = DetectionThresholds::from_json(r#"{"min_historical_days": 1}"#).unwrap();
    AnomalyDetectionEngine::new(thresholds).unwrap()
}

fn spike_series() -> Vec<f64> {
    let mut values = vec![10.0; 48];
    values[40] = 500.0;
    values
}

fn resource(id: &str, kind: &str, current: f64, historical: f64) -> ResourceCostRecord {
    ResourceCostRecord {
        resource_id: id.to_string(),
        resource_type: kind.to_string(),
        current_cost: current,
        historical_average_cost: historical,
        region: "us-east-1".to_string(),
    }
}

#[test]
fn test_flat_series_has_no_anomalies() {
    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&[10.0; 48])));

    assert!(result.baseline_established());
    assert!(result.anomalies_detected.is_empty());
    assert!(result.alerts_generated.is_empty());

    let analysis = result.baseline_analysis.analysis().unwrap();
    assert_eq!(analysis.selected_kind(), ModelKind::MovingAverage);
    assert_eq!(analysis.statistics.std_dev, 0.0);
    assert_eq!(result.detection_summary.total_anomalies, 0);
}

#[test]
fn test_single_spike_is_critical() {
    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&spike_series())));

    assert_eq!(result.anomalies_detected.len(), 1);
    let anomaly = &result.anomalies_detected[0].anomaly;
    assert_eq!(anomaly.series_index, 40);
    assert_eq!(anomaly.timestamp, start() + Duration::hours(40));
    assert_eq!(anomaly.anomaly_type, AnomalyType::CostSpike);
    assert_eq!(anomaly.severity, Severity::Critical);
    assert_relative_eq!(anomaly.deviation_pct, 4900.0, epsilon = 1e-9);
    assert!(anomaly.deviation_std > 6.0);

    let summary = &result.detection_summary;
    assert_eq!(summary.by_severity[&Severity::Critical], 1);
    assert_relative_eq!(summary.total_cost_impact, 490.0, epsilon = 1e-9);
    assert_eq!(summary.most_severe.as_ref(), Some(anomaly));

    assert_eq!(result.alerts_generated.len(), 1);
    assert_eq!(
        result.alerts_generated[0].description,
        "Cost spike detected: $500.00 vs expected $10.00 (+4900.0% deviation)"
    );
}

#[test]
fn test_linear_ramp_selects_linear_trend() {
    let values: Vec<f64> = (0..200).map(|i| 10.0 + i as f64 * 200.0 / 199.0).collect();
    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&values)));

    let analysis = result.baseline_analysis.analysis().unwrap();
    assert_eq!(analysis.selected_kind(), ModelKind::LinearTrend);
    assert!(analysis.selected_model.accuracy > 99.9);

    // Normalized slope is 1/sqrt(3350), far below the 1.5 trend cutoff, and
    // the ends of the ramp stay within 2 standard deviations of the mean
    let slope = match analysis.selected_model.parameters {
        ModelParameters::LinearTrend { slope, .. } => slope,
        ref other => panic!("unexpected parameters {other:?}"),
    };
    assert_relative_eq!(
        slope / analysis.statistics.std_dev,
        1.0 / 3350.0_f64.sqrt(),
        epsilon = 1e-9
    );
    assert!(result.anomalies_detected.is_empty());
}

#[test]
fn test_root_cause_attributes_to_ec2() {
    let engine = short_span_engine();
    let request = DetectionRequest::new("us-east-1", hourly(&spike_series())).with_resources(vec![
        resource("i-0abc", "ec2", 120.0, 20.0),
        resource("db-1", "rds", 10.0, 10.0),
    ]);
    let result = engine.detect(request);

    let root_cause = &result.anomalies_detected[0].root_cause_analysis;
    assert_relative_eq!(root_cause.total_cost_increase, 100.0);
    assert_eq!(root_cause.service_contribution("ec2"), Some(100.0));
    assert_eq!(root_cause.service_contribution("rds"), Some(0.0));

    let services: Vec<&str> = root_cause
        .factors_of(FactorType::Service)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(services, vec!["ec2"]);
    assert!(!root_cause.time_window_analysis.is_empty());

    // The alert carries the root cause recommendations verbatim
    assert_eq!(
        result.alerts_generated[0].recommendations,
        root_cause.recommendations
    );
}

#[test]
fn test_ten_day_series_fails_span_check() {
    let engine = AnomalyDetectionEngine::new(DetectionThresholds::default()).unwrap();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&[10.0; 240])));

    assert!(!result.baseline_established());
    assert!(result.anomalies_detected.is_empty());
    assert!(result
        .baseline_analysis
        .reason()
        .unwrap()
        .contains("historical span"));
    assert!(result.error.unwrap().contains("historical span"));
}

#[test]
fn test_second_run_replaces_stored_baseline() {
    let store = BaselineStore::new();
    let thresholds = DetectionThresholds {
        min_historical_days: 1,
        ..Default::default()
    };
    let engine = AnomalyDetectionEngine::with_store(thresholds, store.clone()).unwrap();

    let first = engine.detect(DetectionRequest::new("us-east-1", hourly(&[10.0; 48])));
    let second = engine.detect(DetectionRequest::new("us-east-1", hourly(&spike_series())));

    let stored = store.get("us-east-1").unwrap();
    assert_eq!(Some(&stored), second.baseline_analysis.analysis());
    assert_ne!(Some(&stored), first.baseline_analysis.analysis());
    assert_eq!(store.regions(), vec!["us-east-1"]);
}

#[test]
fn test_exact_thresholds_pass_quality_gate() {
    // 24 points, the last exactly 14 days after the first
    let mut records: Vec<RawCostRecord> = (0..23)
        .map(|i| RawCostRecord::new((start() + Duration::hours(i)).to_rfc3339(), 10.0))
        .collect();
    records.push(RawCostRecord::new(
        (start() + Duration::days(14)).to_rfc3339(),
        10.0,
    ));

    let engine = AnomalyDetectionEngine::new(DetectionThresholds::default()).unwrap();
    let result = engine.detect(DetectionRequest::new("us-east-1", records));

    assert!(result.baseline_established());
    let report = &result.baseline_analysis.analysis().unwrap().quality_report;
    assert_eq!(report.point_count, 24);
    assert_eq!(report.span_days, 14);
}

#[test]
fn test_malformed_resource_does_not_abort_detection() {
    let engine = short_span_engine();
    let request = DetectionRequest::new("us-east-1", hourly(&spike_series()))
        .with_resources(vec![resource("i-0abc", "ec2", -5.0, 20.0)]);
    let result = engine.detect(request);

    assert_eq!(result.anomalies_detected.len(), 1);
    let root_cause = &result.anomalies_detected[0].root_cause_analysis;
    assert!(root_cause.error.as_ref().unwrap().contains("i-0abc"));
    assert!(root_cause.service_breakdown.is_empty());
    assert_eq!(result.alerts_generated.len(), 1);
    assert_eq!(engine.metrics().root_cause_failures, 1);
}

#[test]
fn test_unparsable_timestamps_are_skipped() {
    let mut records = hourly(&spike_series());
    records.insert(3, RawCostRecord::new("not a timestamp", 9999.0));
    records.reverse();

    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", records));

    assert_eq!(result.skipped_records, 1);
    assert_eq!(result.anomalies_detected.len(), 1);
    assert_eq!(result.anomalies_detected[0].anomaly.series_index, 40);
}

#[test]
fn test_rescore_uses_stored_baseline() {
    let engine = short_span_engine();
    engine.detect(DetectionRequest::new("us-east-1", hourly(&spike_series())));
    let stored = engine.baseline_for("us-east-1").unwrap();

    let mut values = vec![10.0; 48];
    values[5] = 600.0;
    let anomalies = engine.rescore("us-east-1", &hourly(&values)).unwrap();

    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].series_index, 5);
    assert_eq!(anomalies[0].baseline_model, ModelKind::Percentile);
    assert_eq!(engine.baseline_for("us-east-1").unwrap(), stored);

    assert!(matches!(
        engine.rescore("eu-west-1", &hourly(&values)),
        Err(CostAnomalyError::InsufficientData { .. })
    ));
}

#[test]
fn test_rescore_at_is_byte_identical() {
    let engine = short_span_engine();
    engine.detect(DetectionRequest::new("us-east-1", hourly(&spike_series())));

    let mut values = vec![10.0; 48];
    values[5] = 600.0;
    values[30] = 250.0;
    let detected_at = start() + Duration::days(30);
    let first = engine.rescore_at("us-east-1", &hourly(&values), detected_at).unwrap();
    let second = engine.rescore_at("us-east-1", &hourly(&values), detected_at).unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(
        first[1].id,
        format!("anomaly-us-east-1-{}-1", detected_at.timestamp())
    );
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_sustained_climb_is_a_cost_trend() {
    // Defaults apart from the one-day span: three climbing spikes in a row
    let mut values = vec![10.0; 60];
    values.extend([200.0, 400.0, 600.0]);

    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&values)));

    let trends = result.anomalies_of_type(AnomalyType::CostTrend);
    assert_eq!(trends.len(), 1);
    let trend = &trends[0].anomaly;
    assert_eq!(trend.series_index, 62);
    assert!(trend.trend_score.unwrap() >= engine.thresholds().cost_trend_threshold);
    assert_eq!(trend.severity, Severity::Critical);
    assert_eq!(result.detection_summary.total_anomalies, 3);

    let trend_alert = result
        .alerts_generated
        .iter()
        .find(|alert| alert.anomaly.anomaly_type == AnomalyType::CostTrend)
        .unwrap();
    assert!(trend_alert.description.starts_with("Cost trend detected"));
}

#[test]
fn test_anomaly_filters() {
    let mut values = vec![10.0; 48];
    values[20] = 180.0;
    values[40] = 500.0;

    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&values)));

    let spikes = result.anomalies_of_type(AnomalyType::CostSpike);
    assert_eq!(spikes.len(), result.anomalies_detected.len());
    assert!(result.anomalies_of_type(AnomalyType::RegionalAnomaly).is_empty());

    let critical = result.anomalies_at_least(Severity::Critical);
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].anomaly.series_index, 40);
}

#[test]
fn test_root_cause_without_resources() {
    let engine = short_span_engine();
    let result = engine.detect(DetectionRequest::new("us-east-1", hourly(&spike_series())));
    let anomaly = &result.anomalies_detected[0].anomaly;

    let analyzer = RootCauseAnalyzer::new(engine.thresholds());
    let analysis = analyzer.analyze(anomaly, &[], None).unwrap();
    assert!(analysis.contributing_factors.is_empty());
    assert!(analysis.time_window_analysis.is_empty());
    assert_eq!(analysis.recommendations.len(), 1);
}
