//! Assessment handlers

use super::views::AssessmentView;
use crate::api::rest::actor::CurrentActor;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sglgb_engine::{ProgressMetrics, ReviewOutcome, ValidationSummary};
use sglgb_types::{AssessmentId, AuditEntry, ResponseId, SealDetermination};

/// Get an assessment
pub async fn get_assessment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<AssessmentView>> {
    let assessment = state
        .engine
        .assessment(&actor, &AssessmentId::new(id))
        .await?;
    Ok(Json(assessment.into()))
}

/// Completeness summary and submit eligibility
pub async fn get_validation_summary(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<ValidationSummary>> {
    let summary = state
        .engine
        .validation_summary(&actor, &AssessmentId::new(id))
        .await?;
    Ok(Json(summary))
}

/// Dashboard progress metrics
pub async fn get_progress(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<ProgressMetrics>> {
    let metrics = state
        .engine
        .progress(&actor, &AssessmentId::new(id))
        .await?;
    Ok(Json(metrics))
}

/// Seal determination (recorded once finalized, a preview before)
pub async fn get_seal(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<SealDetermination>> {
    let seal = state.engine.seal(&actor, &AssessmentId::new(id)).await?;
    Ok(Json(seal))
}

/// Audit trail
pub async fn get_history(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AuditEntry>>> {
    let history = state
        .engine
        .history(&actor, &AssessmentId::new(id))
        .await?;
    Ok(Json(history))
}

/// Unreviewed responses
#[derive(Debug, Serialize)]
pub struct UnreviewedResponse {
    pub assessment_id: AssessmentId,
    pub unreviewed: Vec<ResponseId>,
}

/// Responses still waiting for a verdict
pub async fn get_unreviewed(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<UnreviewedResponse>> {
    let assessment_id = AssessmentId::new(id);
    let unreviewed = state.engine.unreviewed(&actor, &assessment_id).await?;
    Ok(Json(UnreviewedResponse {
        assessment_id,
        unreviewed,
    }))
}

/// Submit (or resubmit after rework)
pub async fn submit_assessment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<AssessmentView>> {
    let assessment = state.engine.submit(&actor, &AssessmentId::new(id)).await?;
    Ok(Json(assessment.into()))
}

/// Close the assessor review
pub async fn close_review(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<ReviewOutcome>> {
    let outcome = state
        .engine
        .close_review(&actor, &AssessmentId::new(id))
        .await?;
    Ok(Json(outcome))
}

/// Finalize a validated assessment
pub async fn finalize_assessment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<SealDetermination>> {
    let seal = state
        .engine
        .finalize(&actor, &AssessmentId::new(id))
        .await?;
    Ok(Json(seal))
}
