//! Engine policy knobs

use serde::{Deserialize, Serialize};

/// Configurable lifecycle policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Essential areas that must pass (in addition to every Core area) for
    /// the seal to be awarded
    pub essential_areas_required: usize,

    /// Maximum number of reviews that may close into rework. `None` is
    /// unbounded.
    pub max_rework_cycles: Option<u32>,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            essential_areas_required: 1,
            max_rework_cycles: None,
        }
    }
}

impl EnginePolicy {
    pub fn with_max_rework_cycles(mut self, limit: u32) -> Self {
        self.max_rework_cycles = Some(limit);
        self
    }

    pub fn with_essential_areas_required(mut self, required: usize) -> Self {
        self.essential_areas_required = required;
        self
    }
}
