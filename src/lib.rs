//! Paired Difference Analysis Library
//!
//! This library compares measurements taken from the same individuals in two
//! states (e.g. before and after a treatment). For each category it computes
//! within-individual differences, tests them with a one-sample t-test,
//! applies Bonferroni correction, and reports the results as a ranked TSV
//! alongside a multi-panel trajectory figure.
//!
//! # Overview
//!
//! - **data**: Core data structures (MappingFile, FeatureTable, MeasurementTable, results)
//! - **filter**: Sample inclusion filters applied to the mapping file
//! - **extract**: Measurement extraction from mapping columns or a feature table
//! - **difference**: Paired differences and their summaries
//! - **test**: One-sample t-test
//! - **correct**: Multiple testing correction (Bonferroni)
//! - **rank**: Result ordering
//! - **plot**: Figure layout and rendering
//! - **pipeline**: Configuration and execution
//!
//! # Example
//!
//! ```no_run
//! use paired_diff::prelude::*;
//!
//! let config = PairedConfig::new(
//!     "map.txt",
//!     CategorySource::MappingColumns {
//!         categories: vec!["Phylogenetic Diversity".to_string()],
//!     },
//!     "TreatmentState",
//!     &["Pre", "Post"],
//!     "PersonalID",
//!     "paired_out",
//! )
//! .valid_states("TreatmentResponse:Improved");
//!
//! let output = run(&config).unwrap();
//! println!("{}", output.analysis.results.summary());
//! ```

pub mod correct;
pub mod data;
pub mod difference;
pub mod error;
pub mod extract;
pub mod filter;
pub mod pipeline;
pub mod plot;
pub mod rank;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::correct::{bonferroni, correct_bonferroni};
    pub use crate::data::{
        FeatureTable, IndividualRecords, MappingFile, MeasurementTable, PairedDifferenceResult,
        PairedResultSet, StatePair, TestStatus, Variable,
    };
    pub use crate::difference::{compute_differences, DifferenceSample};
    pub use crate::error::{PairedError, Result};
    pub use crate::extract::{FeatureTableExtractor, MappingExtractor, StateExtractor, StateSpec};
    pub use crate::filter::SampleFilter;
    pub use crate::pipeline::{
        analyze, run, AnalysisOptions, CategorySource, PairedAnalysis, PairedConfig, RunOutput,
    };
    pub use crate::plot::{render_figure, FigurePlan, GridLayout, PlotFormat};
    pub use crate::rank::{rank_results, SortKey};
    pub use crate::test::{t_one_sample, test_paired, TTestResult};
}
