//! Assessment audit history
//!
//! Every change to an assessment appends one entry. The current validation
//! record is overwritten on re-save; prior judgments survive here.

use crate::{
    Actor, AssessmentStatus, ComplianceAnswer, ComplianceStatus, IndicatorId, MovFileId,
    ResponseId, Role, UserId, ValidationStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    Created {
        responses: usize,
    },
    AnswerSet {
        response_id: ResponseId,
        indicator_id: IndicatorId,
        previous: Option<ComplianceAnswer>,
        answer: ComplianceAnswer,
    },
    EvidenceAttached {
        response_id: ResponseId,
        file_id: MovFileId,
        filename: String,
    },
    EvidenceRemoved {
        response_id: ResponseId,
        file_id: MovFileId,
        filename: String,
    },
    AssessorEvidenceAttached {
        response_id: ResponseId,
        file_id: MovFileId,
        filename: String,
    },
    ValidationRecorded {
        response_id: ResponseId,
        status: Option<ValidationStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_comment: Option<String>,
    },
    Submitted {
        rework_cycle: u32,
    },
    ReviewClosed {
        outcome: AssessmentStatus,
        flagged: Vec<ResponseId>,
    },
    Finalized {
        compliance: ComplianceStatus,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::Created { .. } => "created",
            AuditEvent::AnswerSet { .. } => "answer_set",
            AuditEvent::EvidenceAttached { .. } => "evidence_attached",
            AuditEvent::EvidenceRemoved { .. } => "evidence_removed",
            AuditEvent::AssessorEvidenceAttached { .. } => "assessor_evidence_attached",
            AuditEvent::ValidationRecorded { .. } => "validation_recorded",
            AuditEvent::Submitted { .. } => "submitted",
            AuditEvent::ReviewClosed { .. } => "review_closed",
            AuditEvent::Finalized { .. } => "finalized",
        }
    }

    /// The response this event concerns, if any
    pub fn response_id(&self) -> Option<&ResponseId> {
        match self {
            AuditEvent::AnswerSet { response_id, .. }
            | AuditEvent::EvidenceAttached { response_id, .. }
            | AuditEvent::EvidenceRemoved { response_id, .. }
            | AuditEvent::AssessorEvidenceAttached { response_id, .. }
            | AuditEvent::ValidationRecorded { response_id, .. } => Some(response_id),
            _ => None,
        }
    }
}

/// One line of assessment history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub actor: UserId,
    pub role: Role,
    pub event: AuditEvent,
}

impl AuditEntry {
    pub fn new(actor: &Actor, event: AuditEvent, at: DateTime<Utc>) -> Self {
        Self {
            at,
            actor: actor.user_id.clone(),
            role: actor.role,
            event,
        }
    }
}
