//! One-sample t-test on paired differences.

use crate::data::PairedDifferenceResult;
use crate::difference::DifferenceSample;
use crate::error::{PairedError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::warn;

/// Result of a one-sample t-test against a population mean of zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TTestResult {
    /// Sample size.
    pub n: usize,
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// t statistic.
    pub statistic: f64,
    /// Degrees of freedom (n - 1).
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Perform a one-sample t-test of H0: mean difference = 0.
///
/// t = mean / (sd / sqrt(n)), compared to a t-distribution with n - 1
/// degrees of freedom.
///
/// # Errors
/// - [`PairedError::InsufficientData`] when fewer than two differences are available
/// - [`PairedError::ZeroVariance`] when all differences are identical, which
///   leaves the statistic undefined
pub fn t_one_sample(sample: &DifferenceSample) -> Result<TTestResult> {
    let n = sample.len();
    if n < 2 {
        return Err(PairedError::InsufficientData {
            category: sample.category.clone(),
            n,
        });
    }

    let n_f64 = n as f64;
    let mean = sample.differences.iter().sum::<f64>() / n_f64;
    let variance = sample
        .differences
        .iter()
        .map(|d| (d - mean).powi(2))
        .sum::<f64>()
        / (n_f64 - 1.0);
    let std_dev = variance.sqrt();

    let statistic = mean / (std_dev / n_f64.sqrt());
    if !statistic.is_finite() {
        return Err(PairedError::ZeroVariance {
            category: sample.category.clone(),
        });
    }

    let df = n_f64 - 1.0;
    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| PairedError::Numerical(format!("t-distribution with df={}: {}", df, e)))?;
    let p_value = (2.0 * (1.0 - t_dist.cdf(statistic.abs()))).clamp(0.0, 1.0);

    Ok(TTestResult {
        n,
        mean,
        std_dev,
        statistic,
        df,
        p_value,
    })
}

/// Summarize a category's differences into an (uncorrected) result row.
///
/// Test failures are recorded in the row's status instead of being returned,
/// so one degenerate category never aborts a run.
pub fn test_paired(sample: &DifferenceSample) -> PairedDifferenceResult {
    let (statistic, p_value) = match t_one_sample(sample) {
        Ok(t) => (Some(t.statistic), Some(t.p_value)),
        Err(e) => {
            warn!("{}", e);
            (None, None)
        }
    };

    PairedDifferenceResult::new(
        sample.category.clone(),
        sample.len(),
        sample.mean(),
        sample.median(),
        statistic,
        p_value,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TestStatus;
    use approx::assert_relative_eq;

    fn sample(differences: Vec<f64>) -> DifferenceSample {
        DifferenceSample {
            category: "A".to_string(),
            differences,
        }
    }

    #[test]
    fn test_t_known_values() {
        // mean = 1, sd = sqrt(2), t = 1 with df = 1 (Cauchy): P(|T| > 1) = 0.5
        let result = t_one_sample(&sample(vec![2.0, 0.0])).unwrap();

        assert_eq!(result.n, 2);
        assert_relative_eq!(result.mean, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.std_dev, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.df, 1.0);
        assert_relative_eq!(result.p_value, 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_t_larger_sample() {
        // mean = 2, sd = sqrt(2/3), n = 4, df = 3
        let result = t_one_sample(&sample(vec![1.0, 2.0, 3.0, 2.0])).unwrap();
        let expected_t = 2.0 / ((2.0_f64 / 3.0).sqrt() / 2.0);
        assert_relative_eq!(result.statistic, expected_t, epsilon = 1e-10);
        assert_relative_eq!(result.df, 3.0);
        assert!(result.p_value > 0.01 && result.p_value < 0.02);

        let result = t_one_sample(&sample(vec![-1.0, -2.0, -3.0])).unwrap();
        assert!(result.statistic < 0.0);
    }

    #[test]
    fn test_t_symmetric_sample_not_significant() {
        let result = t_one_sample(&sample(vec![-1.0, 1.0, -2.0, 2.0])).unwrap();
        assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_t_insufficient_data() {
        assert!(matches!(
            t_one_sample(&sample(vec![3.0])),
            Err(PairedError::InsufficientData { n: 1, .. })
        ));
        assert!(matches!(
            t_one_sample(&sample(vec![])),
            Err(PairedError::InsufficientData { n: 0, .. })
        ));
    }

    #[test]
    fn test_t_zero_variance() {
        assert!(matches!(
            t_one_sample(&sample(vec![0.0, 0.0, 0.0])),
            Err(PairedError::ZeroVariance { .. })
        ));
        assert!(matches!(
            t_one_sample(&sample(vec![1.5, 1.5])),
            Err(PairedError::ZeroVariance { .. })
        ));
    }

    #[test]
    fn test_paired_row() {
        let row = test_paired(&sample(vec![2.0, 0.0]));
        assert_eq!(row.status, TestStatus::Tested);
        assert_eq!(row.n, 2);
        assert_relative_eq!(row.mean.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(row.median.unwrap(), 1.0, epsilon = 1e-12);
        assert!(row.corrected_p_value.is_none());
    }

    #[test]
    fn test_paired_row_degrades() {
        let row = test_paired(&sample(vec![4.0]));
        assert_eq!(row.status, TestStatus::InsufficientData);
        assert_eq!(row.mean, Some(4.0));
        assert_eq!(row.statistic, None);
        assert_eq!(row.p_value, None);

        let row = test_paired(&sample(vec![]));
        assert_eq!(row.status, TestStatus::InsufficientData);
        assert_eq!(row.mean, None);

        let row = test_paired(&sample(vec![1.0, 1.0, 1.0]));
        assert_eq!(row.status, TestStatus::ZeroVariance);
        assert_eq!(row.median, Some(1.0));
    }
}
