//! Multiple testing correction.

pub mod bonferroni;

pub use bonferroni::{bonferroni, correct_bonferroni};
