//! Building a [`MeasurementTable`] from a mapping file and optional feature table.
//!
//! Both sources resolve samples to (individual, state) the same way; they only
//! differ in where a category's value for a sample comes from.

mod features;
mod mapping;

pub use features::FeatureTableExtractor;
pub use mapping::MappingExtractor;

use crate::data::{MappingFile, MeasurementTable, StatePair};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Which mapping file columns identify individuals and states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpec {
    /// Column holding the state of each sample (e.g. `TreatmentState`).
    pub state_category: String,
    /// The two states to compare, in order.
    pub states: StatePair,
    /// Column holding each sample's individual identifier (e.g. `PersonalID`).
    pub individual_id_category: String,
}

/// Sample ID per state for one individual.
pub type StateSamples = [Option<String>; 2];

/// A source of per-individual, per-state measurements.
pub trait StateExtractor {
    /// Extract measurements for this source's categories.
    fn extract(&self, mapping: &MappingFile, spec: &StateSpec) -> Result<MeasurementTable>;
}

/// Resolve each individual to its sample in each state.
///
/// Samples in a state outside the pair are ignored, as are samples with no
/// individual identifier. If an individual has several samples in one state
/// the last one in file order is used.
pub fn individual_samples(
    mapping: &MappingFile,
    spec: &StateSpec,
) -> Result<BTreeMap<String, StateSamples>> {
    mapping.require_column(&spec.state_category)?;
    mapping.require_column(&spec.individual_id_category)?;

    let mut individuals: BTreeMap<String, StateSamples> = BTreeMap::new();
    for sample_id in mapping.sample_ids() {
        let Some(state) = mapping.text(sample_id, &spec.state_category) else {
            continue;
        };
        let Some(state_index) = spec.states.index_of(state) else {
            continue;
        };
        let Some(individual_id) = mapping.text(sample_id, &spec.individual_id_category) else {
            warn!(sample_id = %sample_id, "Sample has no individual identifier, skipping");
            continue;
        };

        let slots = individuals.entry(individual_id.to_string()).or_default();
        if let Some(previous) = slots[state_index].replace(sample_id.clone()) {
            warn!(
                individual_id,
                state,
                previous = %previous,
                sample_id = %sample_id,
                "Multiple samples for one individual and state, using the later one"
            );
        }
    }

    debug!(individuals = individuals.len(), "Resolved individuals to state samples");
    Ok(individuals)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn create_test_mapping() -> MappingFile {
        let text = "#SampleID\tPersonalID\tTreatmentState\tResponse\tPD\tNote\n\
                    S1\tp1\tPre\tImproved\t1.0\ta\n\
                    S2\tp1\tPost\tImproved\t3.0\tb\n\
                    S3\tp2\tPre\tWorse\t2.0\tc\n\
                    S4\tp2\tPost\tWorse\tNA\td\n\
                    S5\tp3\tPre\tImproved\t0.0\te\n\
                    S6\tp3\tPost\tImproved\t0.0\tf\n\
                    S7\tp3\tFollowup\tImproved\t9.0\tg\n\
                    S8\t\tPre\tImproved\t5.0\th\n";
        MappingFile::from_reader(text.as_bytes()).unwrap()
    }

    pub fn create_test_spec() -> StateSpec {
        StateSpec {
            state_category: "TreatmentState".to_string(),
            states: StatePair::parse("Pre,Post").unwrap(),
            individual_id_category: "PersonalID".to_string(),
        }
    }
}
