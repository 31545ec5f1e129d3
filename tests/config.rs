use std::fs;

use kira_gaitqc::config::{Config, MAX_HORIZON_WEEKS};
use kira_gaitqc::schema::v1::TestType;
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let cfg = Config::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.phases.window_frames, 15);
    assert_eq!(cfg.trend.horizons_weeks, vec![2, 4, 8]);
    assert_eq!(cfg.correlation.min_samples, 5);
    assert_eq!(cfg.confidence.time_range(TestType::Tug), [4.0, 60.0]);
    assert!(cfg.gait.start_line_x.is_none());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("gaitqc.toml");
    fs::write(
        &path,
        "[gait]\nstart_line_x = 0.2\nend_line_x = 0.8\n\n[trend]\nhorizons_weeks = [1, 12]\n",
    )
    .unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.gait.start_line_x, Some(0.2));
    assert_eq!(cfg.gait.end_line_x, Some(0.8));
    assert_eq!(cfg.gait.zone_distance_m, 10.0);
    assert_eq!(cfg.trend.horizons_weeks, vec![1, 12]);
    assert_eq!(cfg.phases, Config::default().phases);
}

#[test]
fn empty_file_and_no_file_match() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.toml");
    fs::write(&path, "").unwrap();
    assert_eq!(Config::load(&path).unwrap(), Config::default());
    assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
}

#[test]
fn invalid_values_are_rejected() {
    let mut cfg = Config::default();
    cfg.confidence.detection_weight = 0.9;
    assert!(cfg.validate().unwrap_err().to_string().contains("sum to 1"));

    let mut cfg = Config::default();
    cfg.phases.turn_exit_rate = 2.0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.gait.start_line_x = Some(0.5);
    cfg.gait.end_line_x = Some(0.5);
    assert!(cfg.validate().unwrap_err().to_string().contains("must differ"));

    let mut cfg = Config::default();
    cfg.trend.interval_level = 1.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn negative_weights_and_unbounded_horizons_are_rejected() {
    let mut cfg = Config::default();
    cfg.confidence.detection_weight = -0.2;
    cfg.confidence.duration_weight = 0.6;
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("confidence.detection_weight"));

    let mut cfg = Config::default();
    cfg.trend.max_eta_weeks = f64::INFINITY;
    assert!(cfg.validate().unwrap_err().to_string().contains("max_eta_weeks"));

    let mut cfg = Config::default();
    cfg.trend.max_eta_weeks = f64::NAN;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.trend.horizons_weeks = vec![4, u32::MAX];
    assert!(cfg.validate().unwrap_err().to_string().contains("horizons_weeks"));

    let mut cfg = Config::default();
    cfg.trend.horizons_weeks = vec![MAX_HORIZON_WEEKS];
    cfg.trend.max_eta_weeks = f64::from(MAX_HORIZON_WEEKS);
    cfg.validate().unwrap();
}

#[test]
fn bad_toml_names_the_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.toml");
    fs::write(&path, "[phases]\nwindow_frames = \"many\"\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("broken.toml"));

    fs::write(&path, "[phases]\nwindow_frames = 2\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("window_frames"));
}
