use kira_gaitqc::math::regression::{correlation_p_value, fit_linear, t_quantile};

#[test]
fn exact_line_has_unit_r_squared() {
    let x = [0.0, 7.0, 14.0, 21.0];
    let y: Vec<f64> = x.iter().map(|v| 3.0 - 0.5 * v).collect();
    let fit = fit_linear(&x, &y).unwrap();
    assert!((fit.slope + 0.5).abs() < 1e-12);
    assert!((fit.intercept - 3.0).abs() < 1e-12);
    assert!((fit.r_squared - 1.0).abs() < 1e-12);
    assert!(fit.residual_std_error < 1e-9);
    assert!((fit.predict(28.0) + 11.0).abs() < 1e-9);
}

#[test]
fn constant_series_has_zero_r_squared() {
    let fit = fit_linear(&[0.0, 1.0, 2.0], &[4.0, 4.0, 4.0]).unwrap();
    assert_eq!(fit.slope, 0.0);
    assert_eq!(fit.r_squared, 0.0);
}

#[test]
fn too_few_points_or_equal_x_is_rejected() {
    assert!(fit_linear(&[0.0, 1.0], &[1.0, 2.0]).is_none());
    assert!(fit_linear(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_none());
}

#[test]
fn prediction_interval_widens_away_from_data() {
    let x = [0.0, 1.0, 2.0, 3.0, 4.0];
    let y = [1.0, 2.2, 2.9, 4.1, 5.0];
    let fit = fit_linear(&x, &y).unwrap();
    let near = fit.prediction_half_width(2.0, 0.95).unwrap();
    let far = fit.prediction_half_width(20.0, 0.95).unwrap();
    assert!(near > 0.0);
    assert!(far > near);
}

#[test]
fn t_quantile_approaches_normal() {
    let t = t_quantile(0.95, 1000.0).unwrap();
    assert!((t - 1.962).abs() < 0.01);
    let small = t_quantile(0.95, 3.0).unwrap();
    assert!((small - 3.182).abs() < 0.01);
}

#[test]
fn correlation_p_value_bounds() {
    assert_eq!(correlation_p_value(0.9, 2), 1.0);
    assert_eq!(correlation_p_value(1.0, 10), 0.0);
    assert!((correlation_p_value(0.0, 10) - 1.0).abs() < 1e-9);
    let strong = correlation_p_value(0.9, 10);
    let weak = correlation_p_value(0.3, 10);
    assert!(strong < 0.01);
    assert!(weak > strong);
}
