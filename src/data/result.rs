//! Result types for paired difference analysis.

use crate::error::{PairedError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Descriptive column names, first header line of the report.
const LONG_HEADER: [&str; 7] = [
    "Metadata category",
    "Num differences (i.e., n)",
    "Mean difference",
    "Median difference",
    "t one sample",
    "t one sample parametric p-value",
    "t one sample parametric p-value (Bonferroni-corrected)",
];

/// Short column keys, second header line of the report.
const SHORT_HEADER: [&str; 7] = ["category", "n", "mean", "median", "t", "p", "corrected_p"];

/// Marker written for statistics that are undefined for a category.
const NA: &str = "NA";

/// Outcome of the one-sample test for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// t statistic and p-value are defined.
    Tested,
    /// Fewer than two complete pairs.
    InsufficientData,
    /// At least two pairs, but every difference is identical.
    ZeroVariance,
}

impl TestStatus {
    /// Recover the status of a row from its sample size and statistic.
    pub fn infer(n: usize, statistic: Option<f64>) -> Self {
        if n < 2 {
            Self::InsufficientData
        } else if statistic.is_none() {
            Self::ZeroVariance
        } else {
            Self::Tested
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tested => "tested",
            Self::InsufficientData => "insufficient_data",
            Self::ZeroVariance => "zero_variance",
        }
    }
}

/// Paired difference statistics for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedDifferenceResult {
    /// Metadata category or observation identifier.
    pub category: String,
    /// Number of individuals with both values present.
    pub n: usize,
    /// Mean difference (undefined when n = 0).
    pub mean: Option<f64>,
    /// Median difference (undefined when n = 0).
    pub median: Option<f64>,
    /// One-sample t statistic.
    pub statistic: Option<f64>,
    /// Two-sided p-value.
    pub p_value: Option<f64>,
    /// Bonferroni-corrected p-value.
    pub corrected_p_value: Option<f64>,
    /// Whether the test could be performed.
    pub status: TestStatus,
}

impl PairedDifferenceResult {
    /// Create a result row; the status is derived from `n` and `statistic`.
    pub fn new(
        category: String,
        n: usize,
        mean: Option<f64>,
        median: Option<f64>,
        statistic: Option<f64>,
        p_value: Option<f64>,
        corrected_p_value: Option<f64>,
    ) -> Self {
        let status = TestStatus::infer(n, statistic);
        Self {
            category,
            n,
            mean,
            median,
            statistic,
            p_value,
            corrected_p_value,
            status,
        }
    }

    /// Check if significant at a corrected-p threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.corrected_p_value.map(|p| p < alpha).unwrap_or(false)
    }

    fn to_record(&self) -> [String; 7] {
        [
            self.category.clone(),
            self.n.to_string(),
            format_value(self.mean),
            format_value(self.median),
            format_value(self.statistic),
            format_value(self.p_value),
            format_value(self.corrected_p_value),
        ]
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NA.to_string(),
    }
}

fn parse_value(raw: &str, line: usize, col: usize) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw == NA {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| PairedError::InvalidValue {
            value: raw.to_string(),
            line,
            col,
        })
}

/// Ordered collection of paired difference results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairedResultSet {
    /// Results in report order.
    pub results: Vec<PairedDifferenceResult>,
}

impl PairedResultSet {
    /// Create a new result set.
    pub fn new(results: Vec<PairedDifferenceResult>) -> Self {
        Self { results }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &PairedDifferenceResult> {
        self.results.iter()
    }

    /// Get the result for a category.
    pub fn get(&self, category: &str) -> Option<&PairedDifferenceResult> {
        self.results.iter().find(|r| r.category == category)
    }

    /// Count results by status and significance.
    pub fn summary(&self) -> ResultSummary {
        let count = |status| self.results.iter().filter(|r| r.status == status).count();
        ResultSummary {
            total: self.len(),
            tested: count(TestStatus::Tested),
            insufficient_data: count(TestStatus::InsufficientData),
            zero_variance: count(TestStatus::ZeroVariance),
            significant_05: self.results.iter().filter(|r| r.is_significant_at(0.05)).count(),
        }
    }

    /// Write results to a TSV report.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_tsv(BufWriter::new(file))
    }

    /// Write the two header lines followed by one row per result.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "#{}", LONG_HEADER.join("\t"))?;
        writeln!(writer, "#{}", SHORT_HEADER.join("\t"))?;

        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);
        for r in &self.results {
            tsv.write_record(r.to_record())?;
        }
        tsv.flush()?;
        Ok(())
    }

    /// Load results from a TSV report.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_tsv(file)
    }

    /// Parse a report, skipping the leading header lines.
    ///
    /// Only lines equal to one of the written headers are skipped, so a
    /// category whose name starts with `#` is read back as data.
    pub fn read_tsv<R: Read>(reader: R) -> Result<Self> {
        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut results = Vec::new();
        let mut in_header = true;
        for record in tsv.records() {
            let record = record?;
            if in_header && (is_header(&record, &LONG_HEADER) || is_header(&record, &SHORT_HEADER)) {
                continue;
            }
            in_header = false;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            if record.len() != SHORT_HEADER.len() {
                return Err(PairedError::DimensionMismatch {
                    expected: SHORT_HEADER.len(),
                    actual: record.len(),
                });
            }
            let n = record[1].trim().parse::<usize>().map_err(|_| PairedError::InvalidValue {
                value: record[1].to_string(),
                line,
                col: 1,
            })?;
            results.push(PairedDifferenceResult::new(
                record[0].to_string(),
                n,
                parse_value(&record[2], line, 2)?,
                parse_value(&record[3], line, 3)?,
                parse_value(&record[4], line, 4)?,
                parse_value(&record[5], line, 5)?,
                parse_value(&record[6], line, 6)?,
            ));
        }

        Ok(Self { results })
    }
}

fn is_header(record: &csv::StringRecord, header: &[&str; 7]) -> bool {
    record.len() == header.len()
        && record
            .iter()
            .zip(header.iter())
            .enumerate()
            .all(|(i, (field, name))| match i {
                0 => field.strip_prefix('#') == Some(*name),
                _ => field == *name,
            })
}

/// Summary counts for a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub tested: usize,
    pub insufficient_data: usize,
    pub zero_variance: usize,
    pub significant_05: usize,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Categories analyzed:           {}", self.total)?;
        writeln!(f, "Tested:                        {}", self.tested)?;
        writeln!(f, "Insufficient data (n < 2):     {}", self.insufficient_data)?;
        writeln!(f, "Zero variance:                 {}", self.zero_variance)?;
        writeln!(f, "Significant at corrected p < 0.05: {}", self.significant_05)?;
        Ok(())
    }
}
