//! Seal determination recorded at finalization

use crate::{AreaKind, GovernanceAreaId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall outcome of the "3+1" rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Passed,
    Failed,
}

/// Pass/fail outcome for one governance area
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaResult {
    pub area_id: GovernanceAreaId,
    pub code: String,
    pub name: String,
    pub kind: AreaKind,
    pub passed: bool,
    pub indicators_passed: usize,
    pub indicators_total: usize,
}

/// The barangay's seal outcome for an assessment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealDetermination {
    pub compliance: ComplianceStatus,
    pub core_areas_passed: usize,
    pub core_areas_total: usize,
    pub essential_areas_passed: usize,
    pub essential_areas_required: usize,
    pub area_results: Vec<AreaResult>,
    pub determined_at: DateTime<Utc>,
}

impl SealDetermination {
    pub fn passed(&self) -> bool {
        self.compliance == ComplianceStatus::Passed
    }
}
