//! Small signal helpers for per-frame series.

/// Centered moving average over `width` samples (odd widths recommended).
/// Edges use the available neighbours.
pub fn smooth(values: &[f64], width: usize) -> Vec<f64> {
    if width <= 1 || values.len() < 2 {
        return values.to_vec();
    }
    let half = width / 2;
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        let slice = &values[lo..hi];
        out.push(slice.iter().sum::<f64>() / slice.len() as f64);
    }
    out
}

/// Central-difference derivative of `values` with respect to `times`.
pub fn derivative(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = times.len().min(values.len());
    let mut out = vec![0.0; n];
    if n < 2 {
        return out;
    }
    for i in 0..n {
        let (a, b) = if i == 0 {
            (0, 1)
        } else if i == n - 1 {
            (n - 2, n - 1)
        } else {
            (i - 1, i + 1)
        };
        let dt = times[b] - times[a];
        if dt > 0.0 {
            out[i] = (values[b] - values[a]) / dt;
        }
    }
    out
}

/// Indices of strict local minima (falling into, not rising out of a
/// plateau) whose value is at or below `ceiling`.
pub fn local_minima(values: &[f64], ceiling: f64) -> Vec<usize> {
    let mut out = Vec::new();
    if values.len() < 3 {
        return out;
    }
    for i in 1..values.len() - 1 {
        let v = values[i];
        if v <= ceiling && v < values[i - 1] && v <= values[i + 1] {
            out.push(i);
        }
    }
    out
}

/// Wraps an angle difference into (-pi, pi].
pub fn wrap_angle(a: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let mut x = a % two_pi;
    if x <= -std::f64::consts::PI {
        x += two_pi;
    } else if x > std::f64::consts::PI {
        x -= two_pi;
    }
    x
}
