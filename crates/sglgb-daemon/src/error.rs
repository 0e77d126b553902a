//! Error types for sglgb-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sglgb_types::LifecycleError;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// The indicator catalogue could not be loaded
    #[error("Catalogue error: {0}")]
    Catalogue(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or malformed caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Lifecycle rule or store failure
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn lifecycle_status(err: &LifecycleError) -> StatusCode {
    match err {
        LifecycleError::LockedAssessment { .. }
        | LifecycleError::NotEligibleForEdit { .. }
        | LifecycleError::AssessmentFinalized { .. }
        | LifecycleError::PeriodArchived { .. }
        | LifecycleError::ReworkLimitReached { .. }
        | LifecycleError::InvalidTransition(_)
        | LifecycleError::Conflict(_) => StatusCode::CONFLICT,
        LifecycleError::MissingRequiredComment { .. }
        | LifecycleError::IncompleteValidation { .. }
        | LifecycleError::SubmissionNotEligible { .. }
        | LifecycleError::InvalidEvidence(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::InvalidInput(_) | LifecycleError::InvalidCatalogue(_) => {
            StatusCode::BAD_REQUEST
        }
        LifecycleError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        LifecycleError::AssessmentNotFound(_)
        | LifecycleError::ResponseNotFound(_)
        | LifecycleError::EvidenceNotFound { .. }
        | LifecycleError::PeriodNotFound(_)
        | LifecycleError::BarangayNotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::EvidenceStorage(_) => StatusCode::BAD_GATEWAY,
        LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn lifecycle_details(err: &LifecycleError) -> Option<serde_json::Value> {
    match err {
        LifecycleError::LockedAssessment { status, .. } => {
            Some(serde_json::json!({ "status": status }))
        }
        LifecycleError::IncompleteValidation { unreviewed, .. } => {
            Some(serde_json::json!({ "unreviewed": unreviewed }))
        }
        LifecycleError::SubmissionNotEligible {
            missing_indicators,
            missing_movs,
            ..
        } => Some(serde_json::json!({
            "missing_indicators": missing_indicators,
            "missing_movs": missing_movs,
        })),
        LifecycleError::ReworkLimitReached { limit, .. } => {
            Some(serde_json::json!({ "limit": limit }))
        }
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
            ApiError::Lifecycle(err) => (lifecycle_status(err), err.code(), lifecycle_details(err)),
        };

        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sglgb_types::{AssessmentId, AssessmentStatus, IndicatorId, PeriodId, ResponseId};

    fn status_of(err: LifecycleError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_lifecycle_error_status_codes() {
        let id = AssessmentId::new("a-1");
        assert_eq!(
            status_of(LifecycleError::LockedAssessment {
                assessment_id: id.clone(),
                status: AssessmentStatus::Submitted,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LifecycleError::MissingRequiredComment {
                response_id: ResponseId::new("r-1"),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(LifecycleError::PermissionDenied("no".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(LifecycleError::PeriodArchived {
                period_id: PeriodId::new("p-1"),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LifecycleError::AssessmentNotFound("a-9".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LifecycleError::EvidenceStorage("down".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_submission_details_list_missing_indicators() {
        let err = LifecycleError::SubmissionNotEligible {
            assessment_id: AssessmentId::new("a-1"),
            missing_indicators: vec![IndicatorId::new("fa-1")],
            missing_movs: vec![IndicatorId::new("dp-1")],
        };
        let details = lifecycle_details(&err).unwrap();
        assert_eq!(details["missing_indicators"][0], "fa-1");
        assert_eq!(details["missing_movs"][0], "dp-1");
    }
}
