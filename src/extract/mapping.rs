use super::{individual_samples, StateExtractor, StateSpec};
use crate::data::{IndividualRecords, MappingFile, MeasurementTable, Variable, VariableType};
use crate::error::{PairedError, Result};
use tracing::info;

/// Measurements taken from numeric mapping file columns
/// (e.g. `Streptococcus Abundance`, `Phylogenetic Diversity`).
#[derive(Debug, Clone)]
pub struct MappingExtractor {
    categories: Vec<String>,
}

impl MappingExtractor {
    /// Extract the listed mapping file columns, in order.
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    /// Requested categories.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl StateExtractor for MappingExtractor {
    fn extract(&self, mapping: &MappingFile, spec: &StateSpec) -> Result<MeasurementTable> {
        for category in &self.categories {
            mapping.require_column(category)?;
            if mapping.column_type(category) == Some(VariableType::Categorical) {
                return Err(PairedError::InvalidVariableType {
                    column: category.clone(),
                    reason: "expected numeric values".to_string(),
                });
            }
        }

        let individuals = individual_samples(mapping, spec)?;
        let mut table = MeasurementTable::new();
        for category in &self.categories {
            let records: IndividualRecords = individuals
                .iter()
                .map(|(individual_id, samples)| {
                    let values = samples.clone().map(|sample| {
                        sample.and_then(|sid| match mapping.value(&sid, category) {
                            Variable::Continuous(v) => Some(v),
                            _ => None,
                        })
                    });
                    (individual_id.clone(), values)
                })
                .collect();
            table.insert(category.clone(), records);
        }

        info!(
            categories = table.n_categories(),
            individuals = individuals.len(),
            "Extracted mapping file measurements"
        );
        Ok(table)
    }
}
