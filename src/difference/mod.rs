//! Within-individual differences between the two states.

use crate::data::{complete_pair, IndividualRecords};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Differences (`second - first`) for one category, one per complete individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceSample {
    /// Category the differences belong to.
    pub category: String,
    /// Differences in the iteration order of the source records.
    pub differences: Vec<f64>,
}

impl DifferenceSample {
    /// Number of differences.
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Arithmetic mean, or `None` for an empty sample.
    pub fn mean(&self) -> Option<f64> {
        if self.differences.is_empty() {
            return None;
        }
        Some(self.differences.iter().sum::<f64>() / self.differences.len() as f64)
    }

    /// Median (average of the middle two for even sizes), or `None` for an empty sample.
    pub fn median(&self) -> Option<f64> {
        if self.differences.is_empty() {
            return None;
        }
        let mut sorted = self.differences.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

/// Compute paired differences for a category.
///
/// Individuals missing either value are skipped; incomplete follow-up is
/// expected and not an error.
pub fn compute_differences(category: &str, records: &IndividualRecords) -> DifferenceSample {
    let differences: Vec<f64> = records
        .values()
        .filter_map(complete_pair)
        .map(|(first, second)| second - first)
        .collect();

    let skipped = records.len() - differences.len();
    if skipped > 0 {
        debug!(category, skipped, "Skipped individuals with incomplete pairs");
    }

    DifferenceSample {
        category: category.to_string(),
        differences,
    }
}
