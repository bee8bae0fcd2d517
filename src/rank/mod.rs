//! Ordering of results for reporting.

use crate::data::PairedDifferenceResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Statistic whose absolute value orders the report (largest first).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// |t statistic|: strongest evidence of change first.
    #[default]
    TStatistic,
    /// |median difference|: largest typical change first. Matches the row
    /// order of legacy paired-difference reports.
    Median,
}

impl SortKey {
    /// Value used for ordering, `None` when undefined for the row.
    pub fn key(&self, result: &PairedDifferenceResult) -> Option<f64> {
        let value = match self {
            Self::TStatistic => result.statistic,
            Self::Median => result.median,
        };
        value.map(f64::abs).filter(|v| !v.is_nan())
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TStatistic => "t_statistic",
            Self::Median => "median",
        }
    }
}

/// Sort results descending by the absolute value of `key`.
///
/// Ties keep their input order; rows without a defined key go last.
pub fn rank_results(
    mut results: Vec<PairedDifferenceResult>,
    key: SortKey,
) -> Vec<PairedDifferenceResult> {
    results.sort_by(|a, b| match (key.key(a), key.key(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    results
}
