//! Sample inclusion by mapping file values, e.g. `TreatmentResponse:Improved`.

use crate::data::MappingFile;
use crate::error::{PairedError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One `Column:V1,V2` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClause {
    /// Mapping file column to test.
    pub column: String,
    /// Accepted (or, when negated, rejected) values.
    pub values: Vec<String>,
    /// Keep samples whose value is NOT listed.
    pub negate: bool,
}

impl StateClause {
    fn matches(&self, mapping: &MappingFile, sample_id: &str) -> bool {
        let listed = mapping
            .text(sample_id, &self.column)
            .map(|v| self.values.iter().any(|accepted| accepted == v))
            .unwrap_or(false);
        listed != self.negate
    }
}

/// A conjunction of clauses separated by `;`.
///
/// Syntax: `Column:V1,V2` keeps samples whose value is V1 or V2;
/// `Column:!V1,V2` keeps samples whose value is neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFilter {
    pub clauses: Vec<StateClause>,
}

impl SampleFilter {
    /// Parse a filter description such as `TreatmentResponse:Improved;Site:!Gut`.
    pub fn parse(description: &str) -> Result<Self> {
        let clauses = description
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|clause| {
                let (column, values) = clause.split_once(':').ok_or_else(|| {
                    PairedError::Config(format!(
                        "Invalid sample filter '{}': expected Column:Value[,Value]",
                        clause
                    ))
                })?;
                let (negate, values) = match values.trim().strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, values),
                };
                let values: Vec<String> = values
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                if column.trim().is_empty() || values.is_empty() {
                    return Err(PairedError::Config(format!(
                        "Invalid sample filter '{}': column and at least one value required",
                        clause
                    )));
                }
                Ok(StateClause {
                    column: column.trim().to_string(),
                    values,
                    negate,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if clauses.is_empty() {
            return Err(PairedError::Config("Empty sample filter".to_string()));
        }
        Ok(Self { clauses })
    }

    /// Sample IDs satisfying every clause, in mapping file order.
    pub fn sample_ids(&self, mapping: &MappingFile) -> Result<Vec<String>> {
        for clause in &self.clauses {
            mapping.require_column(&clause.column)?;
        }
        Ok(mapping
            .sample_ids()
            .iter()
            .filter(|sid| self.clauses.iter().all(|c| c.matches(mapping, sid)))
            .cloned()
            .collect())
    }

    /// Mapping file restricted to matching samples.
    pub fn apply(&self, mapping: &MappingFile) -> Result<MappingFile> {
        let keep = self.sample_ids(mapping)?;
        info!(
            kept = keep.len(),
            total = mapping.n_samples(),
            "Applied sample filter"
        );
        if keep.is_empty() {
            return Err(PairedError::EmptyData(
                "No samples pass the sample filter".to_string(),
            ));
        }
        Ok(mapping.retain_samples(&keep))
    }
}
