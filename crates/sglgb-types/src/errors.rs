//! Error types for the assessment lifecycle

use crate::{
    AssessmentId, AssessmentStatus, BarangayId, IndicatorId, MovFileId, PeriodId, ResponseId,
};

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Assessment {assessment_id} is locked ({status})")]
    LockedAssessment {
        assessment_id: AssessmentId,
        status: AssessmentStatus,
    },

    #[error("Response {response_id} is not open for rework")]
    NotEligibleForEdit { response_id: ResponseId },

    #[error("A public comment is required for a Conditional verdict on {response_id}")]
    MissingRequiredComment { response_id: ResponseId },

    #[error("Review of {assessment_id} is incomplete; unreviewed: {}", join(.unreviewed))]
    IncompleteValidation {
        assessment_id: AssessmentId,
        unreviewed: Vec<ResponseId>,
    },

    #[error(
        "Assessment {assessment_id} cannot be submitted; unanswered: [{}], missing MOVs: [{}]",
        join(.missing_indicators),
        join(.missing_movs)
    )]
    SubmissionNotEligible {
        assessment_id: AssessmentId,
        missing_indicators: Vec<IndicatorId>,
        missing_movs: Vec<IndicatorId>,
    },

    #[error("Assessment {assessment_id} is finalized")]
    AssessmentFinalized { assessment_id: AssessmentId },

    #[error("Evidence storage failed: {0}")]
    EvidenceStorage(String),

    #[error("Evidence rejected: {0}")]
    InvalidEvidence(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Period {period_id} is archived")]
    PeriodArchived { period_id: PeriodId },

    #[error("Assessment {assessment_id} has reached the rework limit of {limit}")]
    ReworkLimitReached {
        assessment_id: AssessmentId,
        limit: u32,
    },

    #[error("Assessment not found: {0}")]
    AssessmentNotFound(String),

    #[error("Response not found: {0}")]
    ResponseNotFound(ResponseId),

    #[error("Evidence file {file_id} not found on response {response_id}")]
    EvidenceNotFound {
        response_id: ResponseId,
        file_id: MovFileId,
    },

    #[error("Period not found: {0}")]
    PeriodNotFound(String),

    #[error("Barangay not found: {0}")]
    BarangayNotFound(BarangayId),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid indicator catalogue: {0}")]
    InvalidCatalogue(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl LifecycleError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::LockedAssessment { .. } => "LOCKED_ASSESSMENT",
            LifecycleError::NotEligibleForEdit { .. } => "NOT_ELIGIBLE_FOR_EDIT",
            LifecycleError::MissingRequiredComment { .. } => "MISSING_REQUIRED_COMMENT",
            LifecycleError::IncompleteValidation { .. } => "INCOMPLETE_VALIDATION",
            LifecycleError::SubmissionNotEligible { .. } => "SUBMISSION_NOT_ELIGIBLE",
            LifecycleError::AssessmentFinalized { .. } => "ASSESSMENT_FINALIZED",
            LifecycleError::EvidenceStorage(_) => "EVIDENCE_STORAGE",
            LifecycleError::InvalidEvidence(_) => "INVALID_EVIDENCE",
            LifecycleError::PermissionDenied(_) => "PERMISSION_DENIED",
            LifecycleError::PeriodArchived { .. } => "PERIOD_ARCHIVED",
            LifecycleError::ReworkLimitReached { .. } => "REWORK_LIMIT_REACHED",
            LifecycleError::AssessmentNotFound(_)
            | LifecycleError::ResponseNotFound(_)
            | LifecycleError::EvidenceNotFound { .. }
            | LifecycleError::PeriodNotFound(_)
            | LifecycleError::BarangayNotFound(_) => "NOT_FOUND",
            LifecycleError::InvalidTransition(_) => "INVALID_TRANSITION",
            LifecycleError::InvalidCatalogue(_) => "INVALID_CATALOGUE",
            LifecycleError::InvalidInput(_) => "INVALID_INPUT",
            LifecycleError::Conflict(_) => "CONFLICT",
            LifecycleError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "NOT_FOUND"
    }
}

/// Result type alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
