use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use kira_gaitqc::config::{ConfidenceConfig, CorrelationConfig, PhaseConfig};
use kira_gaitqc::history::HistoricalTest;
use kira_gaitqc::history::correlation::analyze_correlations;
use kira_gaitqc::math::stats::percentile;
use kira_gaitqc::phases::TugPhase;
use kira_gaitqc::phases::segment::segment_features;
use kira_gaitqc::pose::geometry::FrameFeatures;
use kira_gaitqc::schema::v1::{ClinicalVariable, TestType, Variable};
use kira_gaitqc::scores::confidence::{ConfidenceSignals, compute_confidence};

fn feature_stream() -> impl Strategy<Value = Vec<FrameFeatures>> {
    prop::collection::vec(
        (any::<bool>(), 0.3f64..1.2, -3.1f64..3.1, -1.0f64..2.0),
        0..240,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (detected, height, yaw, x))| FrameFeatures {
                time: i as f64 / 30.0,
                detected,
                hip_height: detected.then_some(height),
                trunk_yaw: detected.then_some(yaw),
                hip_x: detected.then_some(x),
                leg_length: detected.then_some(0.4),
            })
            .collect()
    })
}

fn test_type() -> impl Strategy<Value = TestType> {
    prop_oneof![
        Just(TestType::Tug),
        Just(TestType::TenMeterWalk),
        Just(TestType::BergBalance)
    ]
}

proptest! {
    #[test]
    fn segmentation_is_always_five_contiguous_phases(features in feature_stream()) {
        let seg = segment_features(&features, &PhaseConfig::default());
        prop_assert_eq!(seg.phases.len(), 5);
        prop_assert_eq!(seg.boundaries.len(), 4);
        for (segment, phase) in seg.phases.iter().zip(TugPhase::ORDER) {
            prop_assert_eq!(segment.phase, phase);
            prop_assert!(segment.duration >= 0.0);
        }
        for pair in seg.phases.windows(2) {
            prop_assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        for pair in seg.boundaries.windows(2) {
            prop_assert!(pair[1].time >= pair[0].time);
            prop_assert!(pair[1].frame_index >= pair[0].frame_index);
        }
        let total: f64 = seg.phases.iter().map(|p| p.duration).sum();
        prop_assert!((total - seg.total_time).abs() < 1e-6);
        prop_assert_eq!(seg.low_confidence, seg.boundaries.iter().any(|b| b.fallback));
    }

    #[test]
    fn confidence_is_bounded_and_monotonic_in_detection(
        tt in test_type(),
        lo in 0.0f64..1.0,
        gain in 0.0f64..1.0,
        stream in 0.0f64..120.0,
        walk in 0.0f64..120.0,
        speed in 0.0f64..3.0,
    ) {
        let cfg = ConfidenceConfig::default();
        let hi = (lo + gain).min(1.0);
        let signals = |rate: f64| ConfidenceSignals {
            test_type: tt,
            detection_rate: rate,
            stream_duration: stream,
            walk_time_seconds: walk,
            walk_speed_mps: speed,
        };
        let a = compute_confidence(&signals(lo), &cfg);
        let b = compute_confidence(&signals(hi), &cfg);
        prop_assert!((0.0..=100.0).contains(&a.score));
        prop_assert!((0.0..=100.0).contains(&b.score));
        prop_assert!(b.score >= a.score);
        for sub in [
            a.details.pose_detection_rate,
            a.details.walk_duration_score,
            a.details.walk_time_score,
            a.details.walk_speed_score,
        ] {
            prop_assert!((0.0..=100.0).contains(&sub));
        }
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal(
        rows in prop::collection::vec((0.3f64..1.8, 5.0f64..30.0, 80.0f64..130.0), 5..20)
    ) {
        let day0 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let tests: Vec<HistoricalTest> = rows
            .iter()
            .enumerate()
            .map(|(i, &(speed, time, cadence))| {
                let mut vars = BTreeMap::new();
                vars.insert(Variable::Cadence, ClinicalVariable::new(cadence, "steps/min"));
                HistoricalTest {
                    date: day0 + Duration::days(i as i64),
                    test_type: TestType::TenMeterWalk,
                    walk_time_seconds: time,
                    walk_speed_mps: speed,
                    score: None,
                    clinical_variables: vars,
                }
            })
            .collect();
        let refs: Vec<&HistoricalTest> = tests.iter().collect();
        let result = analyze_correlations(&refs, &CorrelationConfig::default());
        prop_assert!(result.sufficient_data);
        let m = &result.correlation_matrix;
        for i in 0..m.len() {
            prop_assert_eq!(m[i][i], 1.0);
            for j in 0..m.len() {
                prop_assert_eq!(m[i][j], m[j][i]);
                prop_assert!((-1.0..=1.0).contains(&m[i][j]));
            }
        }
        for w in result.significant_correlations.windows(2) {
            prop_assert!(w[0].r.abs() >= w[1].r.abs());
        }
    }

    #[test]
    fn percentile_stays_within_range(
        mut values in prop::collection::vec(-1e3f64..1e3, 1..50),
        p in 0.0f64..=100.0,
    ) {
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let v = percentile(&mut values, p);
        prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
    }
}
