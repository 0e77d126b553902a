//! Lifecycle events published to downstream consumers (notifications,
//! reporting). Delivery is best effort: with no subscribers, events are
//! dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sglgb_types::{AssessmentId, AssessmentStatus, BarangayId, ComplianceStatus, PeriodId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Submitted {
        assessment_id: AssessmentId,
        barangay_id: BarangayId,
        rework_cycle: u32,
        at: DateTime<Utc>,
    },
    ReviewClosed {
        assessment_id: AssessmentId,
        barangay_id: BarangayId,
        outcome: AssessmentStatus,
        flagged: usize,
        at: DateTime<Utc>,
    },
    Finalized {
        assessment_id: AssessmentId,
        barangay_id: BarangayId,
        compliance: ComplianceStatus,
        at: DateTime<Utc>,
    },
    PeriodActivated {
        period_id: PeriodId,
        archived: Option<PeriodId>,
        assessments_created: usize,
        at: DateTime<Utc>,
    },
    PeriodArchived {
        period_id: PeriodId,
        at: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    pub fn assessment_id(&self) -> Option<&AssessmentId> {
        match self {
            LifecycleEvent::Submitted { assessment_id, .. }
            | LifecycleEvent::ReviewClosed { assessment_id, .. }
            | LifecycleEvent::Finalized { assessment_id, .. } => Some(assessment_id),
            _ => None,
        }
    }
}
