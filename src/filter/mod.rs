//! Sample filtering applied before extraction.

pub mod states;

pub use states::{SampleFilter, StateClause};
