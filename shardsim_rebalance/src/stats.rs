//! Descriptive statistics over numeric samples.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Summary of one sample. An empty sample summarizes to the all-zero
/// sentinel with `n == 0`; check [`SummaryStats::is_empty`] before reading
/// the moments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Sample size.
    pub n: usize,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Empirical 50th percentile.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Sum of all values.
    pub sum: f64,
    /// The sample, sorted ascending.
    pub raw_data: Vec<f64>,
}

impl SummaryStats {
    /// Whether this is the empty-sample sentinel.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Five-number summary of the sample, `None` when empty.
    pub fn box_summary(&self) -> Option<BoxSummary> {
        Some(BoxSummary {
            min: *self.raw_data.first()?,
            q1: quantile(0.25, &self.raw_data)?,
            median: quantile(0.5, &self.raw_data)?,
            q3: quantile(0.75, &self.raw_data)?,
            max: *self.raw_data.last()?,
        })
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "n: 0 (empty sample)");
        }
        write!(
            f,
            "n: {}, min: {:.2e}, max: {:.2e}, mean: {:.2e}, median: {:.2e}, stddev: {:.2e}, sum: {:.2e}",
            self.n, self.min, self.max, self.mean, self.median, self.std_dev, self.sum
        )
    }
}

/// Min, quartiles and max of a sample: what a box plot draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    /// Smallest value.
    pub min: f64,
    /// 25th percentile.
    pub q1: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub q3: f64,
    /// Largest value.
    pub max: f64,
}

impl fmt::Display for BoxSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2e} | {:.2e} {:.2e} {:.2e} | {:.2e}]",
            self.min, self.q1, self.median, self.q3, self.max
        )
    }
}

/// Empirical quantile of an ascending-sorted sample: the first element at
/// which the cumulative count reaches `p * n`. No interpolation.
pub fn quantile(p: f64, sorted: &[f64]) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let target = p * sorted.len() as f64;
    let idx = (0..sorted.len()).find(|&i| (i + 1) as f64 >= target).unwrap_or(last);
    Some(sorted[idx])
}

/// Summarize a sample. Takes ownership so the sorted data can be retained.
pub fn summarize(mut data: Vec<f64>) -> SummaryStats {
    if data.is_empty() {
        return SummaryStats::default();
    }
    data.sort_by(f64::total_cmp);

    let n = data.len();
    let sum: f64 = data.iter().sum();
    let mean = sum / n as f64;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

    SummaryStats {
        n,
        min: data[0],
        max: data[n - 1],
        mean,
        median: quantile(0.5, &data).unwrap_or(mean),
        std_dev: variance.sqrt(),
        sum,
        raw_data: data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_sample() {
        let s = summarize(vec![4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.n, 4);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.sum, 10.0);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.0);
        assert!((s.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.raw_data, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_sample_is_sentinel() {
        let s = summarize(Vec::new());
        assert!(s.is_empty());
        assert_eq!(s.mean, 0.0);
        assert!(!s.std_dev.is_nan());
        assert!(s.box_summary().is_none());
        assert_eq!(s.to_string(), "n: 0 (empty sample)");
    }

    #[test]
    fn empirical_quantiles() {
        let data: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(quantile(0.0, &data), Some(1.0));
        assert_eq!(quantile(0.5, &data), Some(10.0));
        assert_eq!(quantile(0.95, &data), Some(19.0));
        assert_eq!(quantile(1.0, &data), Some(20.0));
        assert_eq!(quantile(0.5, &[]), None);
        assert_eq!(quantile(0.5, &[7.0, 9.0, 11.0]), Some(9.0));
    }

    #[test]
    fn box_summary_of_sample() {
        let s = summarize((1..=8).map(f64::from).collect());
        let b = s.box_summary().unwrap();
        assert_eq!((b.min, b.q1, b.median, b.q3, b.max), (1.0, 2.0, 4.0, 6.0, 8.0));
    }
}
