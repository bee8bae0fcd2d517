//! Per-individual, per-state measurements.

use crate::error::{PairedError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Exactly two ordered state labels (e.g. "Pre", "Post").
///
/// The order defines the sign of a paired difference: `state[1] - state[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct StatePair {
    labels: [String; 2],
}

impl StatePair {
    /// Create a state pair from an ordered list of labels.
    ///
    /// Fails with a configuration error unless exactly two labels are given.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        match labels {
            [first, second] => Ok(Self {
                labels: [first.as_ref().to_string(), second.as_ref().to_string()],
            }),
            _ => Err(PairedError::Config(format!(
                "Exactly two state values must be passed, got {}",
                labels.len()
            ))),
        }
    }

    /// Parse a comma-separated list such as `"Pre,Post"`.
    pub fn parse(spec: &str) -> Result<Self> {
        let labels: Vec<&str> = spec.split(',').map(str::trim).collect();
        Self::new(&labels)
    }

    /// The starting state.
    pub fn first(&self) -> &str {
        &self.labels[0]
    }

    /// The ending state.
    pub fn second(&self) -> &str {
        &self.labels[1]
    }

    /// Both labels in order.
    pub fn labels(&self) -> &[String; 2] {
        &self.labels
    }

    /// Position of a state label within the pair.
    pub fn index_of(&self, state: &str) -> Option<usize> {
        self.labels.iter().position(|s| s == state)
    }
}

impl TryFrom<Vec<String>> for StatePair {
    type Error = PairedError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::new(&labels)
    }
}

impl From<StatePair> for Vec<String> {
    fn from(pair: StatePair) -> Self {
        pair.labels.into()
    }
}

/// Values for one individual, one slot per state. `None` marks a missing measurement.
pub type StateValues = [Option<f64>; 2];

/// Individual identifier -> values in state order.
pub type IndividualRecords = BTreeMap<String, StateValues>;

/// Returns both values when neither is missing.
pub fn complete_pair(values: &StateValues) -> Option<(f64, f64)> {
    match values {
        [Some(first), Some(second)] => Some((*first, *second)),
        _ => None,
    }
}

/// Measurements for a set of categories, keyed by individual.
///
/// Categories keep the order in which they were requested; individuals within a
/// category iterate in identifier order.
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    categories: Vec<String>,
    records: HashMap<String, IndividualRecords>,
}

impl MeasurementTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the records for a category.
    pub fn insert(&mut self, category: impl Into<String>, records: IndividualRecords) {
        let category = category.into();
        if !self.records.contains_key(&category) {
            self.categories.push(category.clone());
        }
        self.records.insert(category, records);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_category(mut self, category: impl Into<String>, records: IndividualRecords) -> Self {
        self.insert(category, records);
        self
    }

    /// Category identifiers in order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of categories.
    pub fn n_categories(&self) -> usize {
        self.categories.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Records for a category.
    pub fn get(&self, category: &str) -> Option<&IndividualRecords> {
        self.records.get(category)
    }

    /// Iterate categories in order together with their records.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndividualRecords)> {
        self.categories
            .iter()
            .filter_map(move |c| self.records.get(c).map(|r| (c.as_str(), r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_pair() {
        let states = StatePair::parse("Pre, Post").unwrap();
        assert_eq!(states.first(), "Pre");
        assert_eq!(states.second(), "Post");
        assert_eq!(states.index_of("Post"), Some(1));
        assert_eq!(states.index_of("Followup"), None);
    }

    #[test]
    fn test_state_pair_wrong_count() {
        assert!(matches!(StatePair::parse("Pre"), Err(PairedError::Config(_))));
        assert!(matches!(
            StatePair::parse("Pre,Mid,Post"),
            Err(PairedError::Config(_))
        ));
    }

    #[test]
    fn test_state_pair_yaml() {
        let states: StatePair = serde_yaml::from_str("[Pre, Post]").unwrap();
        assert_eq!(states.labels(), &["Pre".to_string(), "Post".to_string()]);
        assert!(serde_yaml::from_str::<StatePair>("[Pre]").is_err());
    }

    #[test]
    fn test_complete_pair() {
        assert_eq!(complete_pair(&[Some(1.0), Some(0.0)]), Some((1.0, 0.0)));
        assert_eq!(complete_pair(&[Some(1.0), None]), None);
        assert_eq!(complete_pair(&[None, None]), None);
    }

    #[test]
    fn test_table_keeps_category_order() {
        let mut records = IndividualRecords::new();
        records.insert("p1".into(), [Some(1.0), Some(2.0)]);

        let table = MeasurementTable::new()
            .with_category("Veillonella", records.clone())
            .with_category("Streptococcus", records.clone())
            .with_category("Veillonella", records);

        assert_eq!(table.categories(), &["Veillonella", "Streptococcus"]);
        assert_eq!(table.n_categories(), 2);
        let order: Vec<&str> = table.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["Veillonella", "Streptococcus"]);
    }
}
