//! Small numeric helpers shared by the valuation and scoring crates.

use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Keeps finite, strictly positive values.
pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Clamps `value` to `[-limit, limit]`; NaN maps to 0.
pub fn saturate(value: f64, limit: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-limit, limit)
}

/// Mean of `values`, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.mean())
}

/// Weighted mean of `(value, weight)` pairs ignoring non-positive weights.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let (sum, weight) = pairs
        .iter()
        .filter(|(v, w)| v.is_finite() && *w > 0.0)
        .fold((0.0, 0.0), |(s, tw), (v, w)| (s + v * w, tw + w));
    (weight > 0.0).then(|| sum / weight)
}

/// Compound annual growth rate between the first and last observation.
pub fn cagr(history: &[f64]) -> Option<f64> {
    let first = *history.first()?;
    let last = *history.last()?;
    let periods = history.len().checked_sub(1)?;
    if periods == 0 || first <= 0.0 || last <= 0.0 {
        return None;
    }
    Some((last / first).powf(1.0 / periods as f64) - 1.0)
}

/// Finite ratio as a fraction; magnitudes above 1.0 are read as percentages.
pub fn fraction(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| v.is_finite())
        .map(|v| if v.abs() > 1.0 { v / 100.0 } else { v })
}

/// Median and quartiles of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub count: usize,
}

impl Distribution {
    /// Summarises the finite values in `values`; `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let count = finite.len();
        let mut data = Data::new(finite);
        Some(Self {
            median: data.quantile(0.5),
            q1: data.lower_quartile(),
            q3: data.upper_quartile(),
            count,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Distance of `value` from the median in units of the IQR.
    ///
    /// With a degenerate IQR the median itself (or 1.0) is used as the scale.
    pub fn scaled_deviation(&self, value: f64) -> f64 {
        let scale = if self.iqr() > f64::EPSILON {
            self.iqr()
        } else if self.median.abs() > f64::EPSILON {
            self.median.abs()
        } else {
            1.0
        };
        (value - self.median) / scale
    }
}
