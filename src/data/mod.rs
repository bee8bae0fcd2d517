//! Data structures for paired difference analysis.

mod feature_table;
mod measurement;
mod metadata;
mod result;

pub use feature_table::FeatureTable;
pub use measurement::{complete_pair, IndividualRecords, MeasurementTable, StatePair, StateValues};
pub use metadata::{MappingFile, Variable, VariableType};
pub use result::{PairedDifferenceResult, PairedResultSet, TestStatus};
