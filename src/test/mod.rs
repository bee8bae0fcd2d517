//! Statistical hypothesis testing on paired differences.

pub mod t_one_sample;

pub use t_one_sample::{t_one_sample, test_paired, TTestResult};
