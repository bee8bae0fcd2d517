//! Mapping file (per-sample metadata) handling.

use crate::error::{PairedError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A typed metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with a string level.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }
}

/// Inferred type of a mapping file column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

fn is_missing_token(raw: &str) -> bool {
    raw.is_empty() || raw == "NA" || raw == "na" || raw == "N/A"
}

/// A mapping file: one row per sample, one column per metadata category.
///
/// Raw cell text is kept so identifiers such as `"007"` survive untouched;
/// typed access goes through [`MappingFile::value`].
#[derive(Debug, Clone, Default)]
pub struct MappingFile {
    /// Sample IDs in file order.
    sample_ids: Vec<String>,
    /// Column names (excluding the sample ID column).
    column_names: Vec<String>,
    /// sample_id -> column_name -> trimmed cell text.
    data: HashMap<String, HashMap<String, String>>,
    /// Inferred type of each column.
    column_types: HashMap<String, VariableType>,
}

impl MappingFile {
    /// Create an empty mapping file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping file from a tab-separated file.
    ///
    /// Expected format:
    /// - First row: header, first column is the sample ID (a leading `#`, as in
    ///   `#SampleID`, is stripped)
    /// - Later rows starting with `#` are comments
    /// - Subsequent rows: sample ID followed by values
    ///
    /// A column is continuous if every non-missing value parses as a number,
    /// otherwise categorical. `NA` and empty cells are missing.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a mapping file from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| PairedError::EmptyData("Empty mapping file".to_string()))??;
        let header: Vec<&str> = header_line
            .trim_start_matches('#')
            .trim_end_matches('\r')
            .split('\t')
            .collect();
        if header.len() < 2 {
            return Err(PairedError::EmptyData(
                "Mapping file must have at least one metadata column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();

        let mut sample_ids = Vec::new();
        let mut data = HashMap::new();
        for line_result in lines {
            let line = line_result?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let sample_id = fields[0].trim().to_string();
            let row: HashMap<String, String> = column_names
                .iter()
                .enumerate()
                .map(|(col_idx, name)| {
                    let value = fields.get(col_idx + 1).map(|s| s.trim()).unwrap_or("");
                    (name.clone(), value.to_string())
                })
                .collect();
            if data.insert(sample_id.clone(), row).is_none() {
                sample_ids.push(sample_id);
            }
        }

        if sample_ids.is_empty() {
            return Err(PairedError::EmptyData("No samples in mapping file".to_string()));
        }

        let column_types = column_names
            .iter()
            .map(|name| {
                let all_numeric = sample_ids.iter().all(|sid| {
                    let raw = data[sid].get(name).map(String::as_str).unwrap_or("");
                    is_missing_token(raw) || raw.parse::<f64>().is_ok()
                });
                let var_type = if all_numeric {
                    VariableType::Continuous
                } else {
                    VariableType::Categorical
                };
                (name.clone(), var_type)
            })
            .collect();

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Fail with [`PairedError::MissingColumn`] unless the column exists.
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(PairedError::MissingColumn(column.to_string()))
        }
    }

    /// Inferred type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Raw cell text, or `None` when the cell is missing.
    pub fn text(&self, sample_id: &str, column: &str) -> Option<&str> {
        self.data
            .get(sample_id)
            .and_then(|row| row.get(column))
            .map(String::as_str)
            .filter(|raw| !is_missing_token(raw))
    }

    /// Typed value of a cell according to the column's inferred type.
    pub fn value(&self, sample_id: &str, column: &str) -> Variable {
        let Some(raw) = self.text(sample_id, column) else {
            return Variable::Missing;
        };
        match self.column_type(column) {
            Some(VariableType::Continuous) => raw
                .parse::<f64>()
                .map(Variable::Continuous)
                .unwrap_or(Variable::Missing),
            _ => Variable::Categorical(raw.to_string()),
        }
    }

    /// Keep only the listed samples, preserving this file's sample order.
    pub fn retain_samples(&self, keep: &[String]) -> Self {
        let sample_ids: Vec<String> = self
            .sample_ids
            .iter()
            .filter(|sid| keep.contains(sid))
            .cloned()
            .collect();
        let data = sample_ids
            .iter()
            .map(|sid| (sid.clone(), self.data[sid].clone()))
            .collect();
        Self {
            sample_ids,
            column_names: self.column_names.clone(),
            data,
            column_types: self.column_types.clone(),
        }
    }
}
