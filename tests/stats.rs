use kira_gaitqc::math::stats::{
    asymmetry_index, cv_percent, mad, mean, median, pearson, percentile, robust_z, round_to,
    safe_ratio, std_dev, variance,
};

#[test]
fn median_odd_even() {
    let mut v1 = vec![3.0, 1.0, 2.0];
    assert_eq!(median(&mut v1), 2.0);
    let mut v2 = vec![4.0, 1.0, 2.0, 3.0];
    assert_eq!(median(&mut v2), 2.5);
}

#[test]
fn mad_basic() {
    let mut v1 = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let med = median(&mut v1);
    let mut v2 = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let m = mad(&mut v2, med);
    assert!((m - 1.0).abs() < 1e-6);
}

#[test]
fn robust_z_basic() {
    let z = robust_z(2.0, 1.0, 1.0);
    let expected = (2.0 - 1.0) / 1.4826;
    assert!((z - expected).abs() < 1e-6);
    assert_eq!(robust_z(5.0, 1.0, 0.0), 0.0);
}

#[test]
fn sample_variance_uses_n_minus_one() {
    let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert!((mean(&v) - 5.0).abs() < 1e-12);
    assert!((variance(&v) - 32.0 / 7.0).abs() < 1e-12);
    assert!((std_dev(&v) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    assert_eq!(variance(&[1.0]), 0.0);
}

#[test]
fn cv_percent_of_constant_is_zero() {
    assert_eq!(cv_percent(&[1.2, 1.2, 1.2]), 0.0);
    assert_eq!(cv_percent(&[]), 0.0);
    let cv = cv_percent(&[0.9, 1.0, 1.1]);
    assert!((cv - 10.0).abs() < 1e-9);
}

#[test]
fn percentile_interpolates() {
    let mut v = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    assert_eq!(percentile(&mut v, 0.0), 10.0);
    assert_eq!(percentile(&mut v, 100.0), 50.0);
    assert!((percentile(&mut v, 95.0) - 48.0).abs() < 1e-9);
    assert_eq!(percentile(&mut [], 50.0), 0.0);
}

#[test]
fn pearson_perfect_and_degenerate() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let y = [2.0, 4.0, 6.0, 8.0];
    let neg = [8.0, 6.0, 4.0, 2.0];
    assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    assert!((pearson(&x, &neg) + 1.0).abs() < 1e-12);
    assert_eq!(pearson(&x, &[3.0, 3.0, 3.0, 3.0]), 0.0);
    assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
}

#[test]
fn safe_ratio_neutral_on_zero_or_non_finite() {
    assert_eq!(safe_ratio(1.0, 0.0, -1.0), -1.0);
    assert_eq!(safe_ratio(f64::INFINITY, 1.0, 7.0), 7.0);
    assert_eq!(safe_ratio(6.0, 3.0, 0.0), 2.0);
}

#[test]
fn asymmetry_index_is_symmetric() {
    assert!((asymmetry_index(1.1, 0.9) - 20.0).abs() < 1e-9);
    assert_eq!(asymmetry_index(1.1, 0.9), asymmetry_index(0.9, 1.1));
    assert_eq!(asymmetry_index(0.0, 0.0), 0.0);
}

#[test]
fn round_to_decimals() {
    assert_eq!(round_to(1.23456, 3), 1.235);
    assert_eq!(round_to(2.71828, 2), 2.72);
    assert_eq!(round_to(12.0, 1), 12.0);
}
