//! Sparse feature (observation) table, e.g. OTU abundances per sample.

use crate::error::{PairedError, Result};
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A sparse table of observation values across samples.
///
/// Rows are observations (OTUs, taxa), columns are samples. Stored in CSR
/// format; absent entries read as zero.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Sparse matrix in CSR format (features × samples)
    data: CsMat<f64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
    sample_index: HashMap<String, usize>,
}

impl FeatureTable {
    /// Create a new FeatureTable from a sparse matrix and identifiers.
    pub fn new(data: CsMat<f64>, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(PairedError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(PairedError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        let sample_index = sample_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
            sample_index,
        })
    }

    /// Load a feature table from a classic tab-separated file.
    ///
    /// Expected format:
    /// - Optional leading `#` comment lines (e.g. `# Constructed from biom file`)
    /// - Header: feature ID header (e.g. `#OTU ID`) followed by sample IDs,
    ///   optionally ending in a `taxonomy` column which is ignored
    /// - Subsequent rows: feature ID followed by numeric values
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a feature table from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut lines = reader.lines().enumerate();

        // The header is the last of the leading '#' lines, or the first line
        // if the file has no comment block.
        let mut header_line = None;
        let mut header_is_plain = false;
        let mut first_data = None;
        for (line_no, line_result) in lines.by_ref() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if !header_is_plain {
                    header_line = Some(line);
                }
                continue;
            }
            if header_line.is_none() {
                header_line = Some(line);
                header_is_plain = true;
                continue;
            }
            first_data = Some((line_no, line));
            break;
        }
        let header_line = header_line
            .ok_or_else(|| PairedError::EmptyData("Empty feature table".to_string()))?;

        let mut header: Vec<&str> = header_line.trim_end_matches('\r').split('\t').collect();
        let has_taxonomy = header
            .last()
            .map(|h| h.trim().eq_ignore_ascii_case("taxonomy"))
            .unwrap_or(false);
        if has_taxonomy {
            header.pop();
        }
        if header.len() < 2 {
            return Err(PairedError::EmptyData(
                "Feature table must have at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n_samples = sample_ids.len();

        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut feature_ids: Vec<String> = Vec::new();

        let remaining = lines.map(|(line_no, line)| line.map(|l| (line_no, l)));
        for item in first_data.into_iter().map(Ok).chain(remaining) {
            let (line_no, line) = item?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let row_idx = feature_ids.len();
            feature_ids.push(fields[0].trim().to_string());

            for (col_idx, value_str) in fields[1..].iter().take(n_samples).enumerate() {
                let value: f64 = value_str.trim().parse().map_err(|_| PairedError::InvalidValue {
                    value: value_str.to_string(),
                    line: line_no + 1,
                    col: col_idx + 1,
                })?;
                if value != 0.0 {
                    triplets.push((row_idx, col_idx, value));
                }
            }
        }

        let n_features = feature_ids.len();
        if n_features == 0 {
            return Err(PairedError::EmptyData("No features in feature table".to_string()));
        }

        let mut tri_mat = TriMat::new((n_features, n_samples));
        for (row, col, val) in triplets {
            tri_mat.add_triplet(row, col, val);
        }

        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Get the value at (row, col), returning 0 for absent entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Row index of a feature.
    pub fn feature_index(&self, feature_id: &str) -> Option<usize> {
        self.feature_ids.iter().position(|f| f == feature_id)
    }

    /// Column index of a sample.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_index.get(sample_id).copied()
    }
}
