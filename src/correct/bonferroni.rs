//! Bonferroni family-wise error rate correction.

use crate::data::PairedDifferenceResult;
use crate::error::{PairedError, Result};

/// Bonferroni-adjust a single p-value: `min(p * n_tests, 1.0)`.
#[inline]
pub fn bonferroni(p_value: f64, n_tests: usize) -> f64 {
    (p_value * n_tests as f64).min(1.0)
}

/// Apply Bonferroni correction to a batch of results.
///
/// `n_tests` is the number of categories analyzed in the current run and must
/// be supplied by the caller. Rows without a raw p-value keep an undefined
/// corrected p-value.
pub fn correct_bonferroni(
    results: Vec<PairedDifferenceResult>,
    n_tests: usize,
) -> Result<Vec<PairedDifferenceResult>> {
    if n_tests == 0 {
        return Err(PairedError::InvalidParameter(
            "Bonferroni correction requires at least one test".to_string(),
        ));
    }
    if results.len() > n_tests {
        return Err(PairedError::InvalidParameter(format!(
            "{} results but only {} tests in the family",
            results.len(),
            n_tests
        )));
    }

    Ok(results
        .into_iter()
        .map(|r| PairedDifferenceResult {
            corrected_p_value: r.p_value.map(|p| bonferroni(p, n_tests)),
            ..r
        })
        .collect())
}
