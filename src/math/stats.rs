//! Robust statistical primitives.
//!
//! Note: Functions taking `&mut [f64]` may reorder the input slice.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator). Zero for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n as f64 - 1.0)
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of variation in percent.
pub fn cv_percent(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m.abs() * 100.0
}

pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        let a = values[n / 2 - 1];
        let b = values[n / 2];
        (a + b) / 2.0
    }
}

pub fn mad(values: &mut [f64], median_val: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    for v in values.iter_mut() {
        *v = (*v - median_val).abs();
    }
    median(values)
}

pub fn robust_z(x: f64, median_val: f64, mad_val: f64) -> f64 {
    if mad_val == 0.0 {
        return 0.0;
    }
    (x - median_val) / (1.4826 * mad_val)
}

/// Linear-interpolated percentile, `p` in [0, 100].
pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}

/// Pearson correlation. Returns 0 when either series has zero variance
/// or the series are shorter than two points.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&x[..n]);
    let my = mean(&y[..n]);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// `num / den`, or `neutral` when the denominator is zero or the result
/// is not finite.
pub fn safe_ratio(num: f64, den: f64, neutral: f64) -> f64 {
    if den == 0.0 {
        return neutral;
    }
    let r = num / den;
    if r.is_finite() { r } else { neutral }
}

/// Symmetry index in percent: |a - b| / ((a + b) / 2) * 100.
pub fn asymmetry_index(a: f64, b: f64) -> f64 {
    safe_ratio((a - b).abs(), (a + b) / 2.0, 0.0) * 100.0
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}
