use crate::models::Dataset;
use crate::processors::StagingSelection;
use crate::utils::constants::{group_dataset_name, DEFAULT_POSITION_FIELD};

/// Splits a staging selection into one dataset per position.
pub struct Partitioner {
    position_field: String,
}

impl Partitioner {
    pub fn new() -> Self {
        Self {
            position_field: DEFAULT_POSITION_FIELD.to_string(),
        }
    }

    pub fn with_position_field(position_field: &str) -> Self {
        Self {
            position_field: position_field.to_string(),
        }
    }

    /// Records of `staged` whose position equals `position` exactly, named
    /// `"{position}From{country}"`. Order follows the staging selection.
    pub fn partition(&self, staged: &StagingSelection, position: &str) -> Dataset {
        let name = group_dataset_name(position, &staged.country);
        staged
            .players
            .select(&name, |player| player.has_value(&self.position_field, position))
    }
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new()
    }
}
