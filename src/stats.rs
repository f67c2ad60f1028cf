//! Statistics over samples and sampling distributions.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

/// Large-sample 95% multiplier of the standard normal distribution.
pub const Z_95: f64 = 1.96;

/// Sample size below which the normal approximation behind
/// [`confidence_interval_95`] becomes questionable.
pub const NORMAL_APPROX_MIN_LEN: usize = 30;

/// Arithmetic mean of a sample.
pub fn mean(sample: &[f64]) -> Result<f64> {
    if sample.is_empty() {
        return Err(Error::EmptyInput("mean"));
    }
    Ok(compute_mean(sample))
}

/// Sample standard deviation, using the unbiased (n - 1) estimator.
pub fn sample_std_dev(sample: &[f64]) -> Result<f64> {
    if sample.len() < 2 {
        return Err(Error::InsufficientData {
            statistic: "sample standard deviation",
            expected: 2,
            actual: sample.len(),
        });
    }
    Ok(compute_var(sample).sqrt())
}

/// Standard error of the mean: sample standard deviation over sqrt(n).
pub fn standard_error(sample: &[f64]) -> Result<f64> {
    if sample.len() < 2 {
        return Err(Error::InsufficientData {
            statistic: "standard error",
            expected: 2,
            actual: sample.len(),
        });
    }
    Ok(compute_var(sample).sqrt() / (sample.len() as f64).sqrt())
}

/// Closed interval on the real line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Warning attached to a confidence interval computed from a sample too
/// small for the large-sample normal approximation.
///
/// Non-fatal: the interval is still computed and returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmallSampleWarning {
    pub sample_len: usize,
}

impl fmt::Display for SmallSampleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sample of {} values is below the normal-approximation threshold of {}; \
             the interval may be inaccurate (consider the student_t method)",
            self.sample_len, NORMAL_APPROX_MIN_LEN
        )
    }
}

/// Confidence interval estimate for the mean of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CiEstimate {
    pub interval: Interval,
    pub level: f64,
    pub warning: Option<SmallSampleWarning>,
}

/// 95% confidence interval for the mean: mean ± 1.96 · standard error.
///
/// Valid as a large-sample normal approximation; below
/// [`NORMAL_APPROX_MIN_LEN`] values the estimate carries a
/// [`SmallSampleWarning`] instead of failing.
pub fn confidence_interval_95(sample: &[f64]) -> Result<CiEstimate> {
    let mean = mean(sample)?;
    let se = standard_error(sample)?;
    let warning = (sample.len() < NORMAL_APPROX_MIN_LEN).then(|| SmallSampleWarning {
        sample_len: sample.len(),
    });
    Ok(CiEstimate {
        interval: Interval {
            lower: mean - Z_95 * se,
            upper: mean + Z_95 * se,
        },
        level: 0.95,
        warning,
    })
}

/// Confidence interval for the mean using the Student-t multiplier with
/// n - 1 degrees of freedom.
///
/// The small-sample alternative to [`confidence_interval_95`]; exact for
/// normally distributed data at any sample size ≥ 2.
pub fn student_t_interval(sample: &[f64], level: f64) -> Result<CiEstimate> {
    if !(level > 0.0 && level < 1.0) {
        return Err(Error::InvalidLevel(level));
    }
    let mean = mean(sample)?;
    let se = standard_error(sample)?;

    let df = (sample.len() - 1) as f64;
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|err| {
        Error::Computation(format!("t-distribution with {df} degrees of freedom: {err}"))
    })?;
    let multiplier = dist.inverse_cdf(0.5 + level / 2.0);

    Ok(CiEstimate {
        interval: Interval {
            lower: mean - multiplier * se,
            upper: mean + multiplier * se,
        },
        level,
        warning: None,
    })
}

/// Descriptive summary of an empirical sampling distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

/// Mean and sample standard deviation of a sampling distribution.
///
/// Degenerate lengths yield NaN fields rather than an error: an empty
/// distribution is a legitimate zero-trial result.
pub fn summarize(values: &[f64]) -> Summary {
    Summary {
        mean: compute_mean(values),
        std_dev: compute_var(values).sqrt(),
    }
}

/// Fraction of `true` values; NaN for an empty slice.
pub fn coverage_rate(results: &[bool]) -> f64 {
    if results.is_empty() {
        return f64::NAN;
    }
    let hits = results.iter().filter(|&&covered| covered).count();
    hits as f64 / results.len() as f64
}

/// Equal-width histogram of a sampling distribution.
///
/// Bins are left-inclusive; the top edge closes the last bin. Zero bins
/// or zero values yield a degenerate histogram with a `[0, 0]` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub low: f64,
    pub high: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn build(values: &[f64], bins: usize) -> Self {
        if bins == 0 || values.is_empty() {
            return Self {
                low: 0.0,
                high: 0.0,
                counts: vec![0; bins],
            };
        }

        let mut low = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if low == high {
            // Degenerate range gets unit width so every value lands in a bin.
            low -= 0.5;
            high += 0.5;
        }

        let mut counts = vec![0; bins];
        let scale = bins as f64 / (high - low);
        for &val in values {
            let idx = (((val - low) * scale) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { low, high, counts }
    }
}

fn compute_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn compute_var(values: &[f64]) -> f64 {
    let n_vals = values.len();
    if n_vals < 2 {
        return f64::NAN;
    }
    let mean = compute_mean(values);
    values.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Textbook sample: mean 5, sample variance 32/7.
    const SAMPLE: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn mean_of_known_sample() {
        assert_relative_eq!(mean(&SAMPLE).unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn mean_of_empty_sample_fails() {
        assert_eq!(mean(&[]), Err(Error::EmptyInput("mean")));
    }

    #[test]
    fn sample_std_dev_uses_unbiased_estimator() {
        let std = sample_std_dev(&SAMPLE).unwrap();
        assert_relative_eq!(std, (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sample_std_dev_needs_two_values() {
        let err = sample_std_dev(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientData {
                statistic: "sample standard deviation",
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn standard_error_scales_with_sample_size() {
        let se = standard_error(&SAMPLE).unwrap();
        let expected = (32.0_f64 / 7.0).sqrt() / 8.0_f64.sqrt();
        assert_relative_eq!(se, expected, epsilon = 1e-12);
    }

    #[test]
    fn interval_contains_its_bounds() {
        let interval = Interval {
            lower: -1.5,
            upper: 2.5,
        };
        assert!(interval.contains(-1.5));
        assert!(interval.contains(0.0));
        assert!(interval.contains(2.5));
        assert!(!interval.contains(2.500001));
    }

    #[test]
    fn ci95_matches_hand_computation() {
        let sample: Vec<f64> = (1..=100).map(|val| val as f64).collect();
        let est = confidence_interval_95(&sample).unwrap();

        // mean 50.5, sample std sqrt(83325/99), se = std / 10.
        assert_relative_eq!(est.interval.lower, 44.813_747_6, epsilon = 1e-5);
        assert_relative_eq!(est.interval.upper, 56.186_252_4, epsilon = 1e-5);
        assert_eq!(est.level, 0.95);
        assert!(est.warning.is_none());
    }

    #[test]
    fn ci95_warns_below_threshold() {
        let small: Vec<f64> = (1..30).map(|val| val as f64).collect();
        let est = confidence_interval_95(&small).unwrap();
        assert_eq!(est.warning, Some(SmallSampleWarning { sample_len: 29 }));

        let large: Vec<f64> = (1..=30).map(|val| val as f64).collect();
        assert!(confidence_interval_95(&large).unwrap().warning.is_none());
    }

    #[test]
    fn student_t_matches_tabulated_quantile() {
        let sample: Vec<f64> = (1..=10).map(|val| val as f64).collect();
        let est = student_t_interval(&sample, 0.95).unwrap();

        // mean 5.5, se = sqrt(82.5 / 9) / sqrt(10), t(0.975, df = 9) = 2.2621571628.
        assert_relative_eq!(est.interval.lower, 3.334_149_5, epsilon = 1e-4);
        assert_relative_eq!(est.interval.upper, 7.665_850_5, epsilon = 1e-4);
        assert!(est.warning.is_none());
    }

    #[test]
    fn student_t_is_wider_than_z_for_small_samples() {
        let sample: Vec<f64> = (1..=10).map(|val| val as f64).collect();
        let z = confidence_interval_95(&sample).unwrap();
        let t = student_t_interval(&sample, 0.95).unwrap();
        assert!(t.interval.upper - t.interval.lower > z.interval.upper - z.interval.lower);
    }

    #[test]
    fn student_t_rejects_invalid_levels() {
        let sample = [1.0, 2.0, 3.0];
        assert_eq!(
            student_t_interval(&sample, 0.0),
            Err(Error::InvalidLevel(0.0))
        );
        assert_eq!(
            student_t_interval(&sample, 1.0),
            Err(Error::InvalidLevel(1.0))
        );
    }

    #[test]
    fn summarize_known_values() {
        let summary = summarize(&SAMPLE);
        assert_relative_eq!(summary.mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(summary.std_dev, (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn summarize_degenerate_lengths() {
        assert!(summarize(&[]).mean.is_nan());
        assert!(summarize(&[]).std_dev.is_nan());

        let single = summarize(&[3.0]);
        assert_relative_eq!(single.mean, 3.0);
        assert!(single.std_dev.is_nan());
    }

    #[test]
    fn coverage_rate_counts_hits() {
        assert_relative_eq!(coverage_rate(&[true, true, false, true]), 0.75);
        assert_relative_eq!(coverage_rate(&[false]), 0.0);
        assert!(coverage_rate(&[]).is_nan());
    }

    #[test]
    fn histogram_bins_cover_the_range() {
        let values: Vec<f64> = (0..=8).map(|val| val as f64).collect();
        let hist = Histogram::build(&values, 4);

        assert_relative_eq!(hist.low, 0.0);
        assert_relative_eq!(hist.high, 8.0);
        // Top edge closes the last bin, so 8.0 lands in it.
        assert_eq!(hist.counts, vec![2, 2, 2, 3]);
    }

    #[test]
    fn histogram_handles_constant_values() {
        let hist = Histogram::build(&[5.0; 4], 4);
        assert_relative_eq!(hist.low, 4.5);
        assert_relative_eq!(hist.high, 5.5);
        assert_eq!(hist.counts.iter().sum::<usize>(), 4);
        assert_eq!(hist.counts[2], 4);
    }

    #[test]
    fn histogram_of_empty_distribution() {
        let hist = Histogram::build(&[], 5);
        assert_eq!(hist.counts, vec![0; 5]);
    }

    #[test]
    fn histogram_with_zero_bins_is_empty() {
        let hist = Histogram::build(&[1.0, 2.0, 3.0], 0);
        assert!(hist.counts.is_empty());
        assert_relative_eq!(hist.low, 0.0);
        assert_relative_eq!(hist.high, 0.0);
    }
}
