//! Pipeline configuration and execution for paired difference analysis.

mod runner;

pub use runner::{
    analyze, run, AnalysisOptions, CategorySource, PairedAnalysis, PairedConfig, RunOutput,
    FIGURE_FILE_STEM, REPORT_FILE_NAME,
};
