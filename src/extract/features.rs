use super::{individual_samples, StateExtractor, StateSpec};
use crate::data::{FeatureTable, IndividualRecords, MappingFile, MeasurementTable};
use crate::error::{PairedError, Result};
use tracing::{info, warn};

/// Measurements taken from a feature table: one category per observation.
#[derive(Debug, Clone)]
pub struct FeatureTableExtractor {
    table: FeatureTable,
    observation_ids: Option<Vec<String>>,
}

impl FeatureTableExtractor {
    /// Extract every observation in the table.
    pub fn new(table: FeatureTable) -> Self {
        Self {
            table,
            observation_ids: None,
        }
    }

    /// Restrict extraction to the listed observations, in order.
    pub fn with_observation_ids(mut self, observation_ids: Vec<String>) -> Self {
        self.observation_ids = Some(observation_ids);
        self
    }

    /// Observation IDs that will become categories.
    pub fn categories(&self) -> Vec<String> {
        self.observation_ids
            .clone()
            .unwrap_or_else(|| self.table.feature_ids().to_vec())
    }

    fn observation_rows(&self) -> Result<Vec<(String, usize)>> {
        self.categories()
            .into_iter()
            .map(|id| match self.table.feature_index(&id) {
                Some(row) => Ok((id, row)),
                None => Err(PairedError::InvalidParameter(format!(
                    "Observation '{}' not found in feature table",
                    id
                ))),
            })
            .collect()
    }
}

impl StateExtractor for FeatureTableExtractor {
    fn extract(&self, mapping: &MappingFile, spec: &StateSpec) -> Result<MeasurementTable> {
        let observations = self.observation_rows()?;
        let individuals = individual_samples(mapping, spec)?;

        // Columns of each individual's state samples; samples absent from the
        // table have no measurement.
        let columns: Vec<(String, [Option<usize>; 2])> = individuals
            .iter()
            .map(|(individual_id, samples)| {
                let cols = samples.clone().map(|sample| {
                    sample.and_then(|sid| {
                        let col = self.table.sample_index(&sid);
                        if col.is_none() {
                            warn!(sample_id = %sid, "Sample not found in feature table");
                        }
                        col
                    })
                });
                (individual_id.clone(), cols)
            })
            .collect();

        let mut table = MeasurementTable::new();
        for (observation_id, row) in observations {
            let records: IndividualRecords = columns
                .iter()
                .map(|(individual_id, cols)| {
                    let values = cols.map(|col| col.map(|c| self.table.get(row, c)));
                    (individual_id.clone(), values)
                })
                .collect();
            table.insert(observation_id, records);
        }

        info!(
            categories = table.n_categories(),
            individuals = individuals.len(),
            "Extracted feature table measurements"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::*;

    fn create_test_table() -> FeatureTable {
        let text = "#OTU ID\tS1\tS2\tS3\tS5\tS6\n\
                    otu1\t10\t20\t5\t0\t1\n\
                    otu2\t0\t0\t3\t4\t4\n";
        FeatureTable::from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_extract_all_observations() {
        let extractor = FeatureTableExtractor::new(create_test_table());
        let table = extractor
            .extract(&create_test_mapping(), &create_test_spec())
            .unwrap();

        assert_eq!(table.categories(), &["otu1", "otu2"]);
        let otu1 = table.get("otu1").unwrap();
        assert_eq!(otu1["p1"], [Some(10.0), Some(20.0)]);
        // S4 (p2 Post) is not in the table
        assert_eq!(otu1["p2"], [Some(5.0), None]);
        assert_eq!(otu1["p3"], [Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_extract_selected_observations() {
        let extractor = FeatureTableExtractor::new(create_test_table())
            .with_observation_ids(vec!["otu2".to_string()]);
        let table = extractor
            .extract(&create_test_mapping(), &create_test_spec())
            .unwrap();

        assert_eq!(table.categories(), &["otu2"]);
        assert_eq!(table.get("otu2").unwrap()["p3"], [Some(4.0), Some(4.0)]);
    }

    #[test]
    fn test_extract_unknown_observation() {
        let extractor = FeatureTableExtractor::new(create_test_table())
            .with_observation_ids(vec!["otu9".to_string()]);
        let result = extractor.extract(&create_test_mapping(), &create_test_spec());
        assert!(matches!(result, Err(PairedError::InvalidParameter(_))));
    }
}
