//! Ordinary least squares and Student-t helpers.

use anyhow::Result;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::math::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Residual standard error, sqrt(SSE / (n - 2)).
    pub residual_std_error: f64,
    pub slope_std_error: f64,
    pub x_mean: f64,
    pub sxx: f64,
}

/// Fits `y = intercept + slope * x`. Returns `None` with fewer than three
/// points or when all `x` are equal.
pub fn fit_linear(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| {
            let r = yi - (intercept + slope * xi);
            r * r
        })
        .sum();
    let r_squared = if syy == 0.0 {
        0.0
    } else {
        (1.0 - sse / syy).clamp(0.0, 1.0)
    };
    let residual_std_error = (sse / (n as f64 - 2.0)).sqrt();
    Some(LinearFit {
        n,
        slope,
        intercept,
        r_squared,
        residual_std_error,
        slope_std_error: residual_std_error / sxx.sqrt(),
        x_mean: mx,
        sxx,
    })
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Half-width of the two-sided prediction interval for a new
    /// observation at `x`. Grows with the distance from the mean of the
    /// fitted `x` values.
    pub fn prediction_half_width(&self, x: f64, level: f64) -> Result<f64> {
        let t = t_quantile(level, (self.n - 2) as f64)?;
        let dx = x - self.x_mean;
        let leverage = 1.0 + 1.0 / self.n as f64 + dx * dx / self.sxx;
        Ok(t * self.residual_std_error * leverage.sqrt())
    }
}

/// Two-sided critical value of the Student-t distribution.
pub fn t_quantile(level: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| anyhow::anyhow!("invalid t distribution (df={}): {}", df, e))?;
    Ok(dist.inverse_cdf(0.5 + level / 2.0))
}

/// Two-sided p-value for a Pearson correlation `r` over `n` pairs.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = n as f64 - 2.0;
    let t = r * (df / (1.0 - r * r)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
