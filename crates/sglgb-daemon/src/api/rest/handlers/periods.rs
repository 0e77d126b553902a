//! Assessment period handlers

use crate::api::rest::actor::CurrentActor;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sglgb_engine::ActivationReport;
use sglgb_types::{AssessmentPeriod, PeriodDeadlines, PeriodId};

/// Create period request
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    pub performance_year: i32,
    pub assessment_year: i32,
}

/// List all periods, newest first
pub async fn list_periods(State(state): State<AppState>) -> ApiResult<Json<Vec<AssessmentPeriod>>> {
    Ok(Json(state.engine.list_periods().await?))
}

/// Get a specific period
pub async fn get_period(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AssessmentPeriod>> {
    Ok(Json(state.engine.period(&PeriodId::new(id)).await?))
}

/// The active period
pub async fn get_active_period(State(state): State<AppState>) -> ApiResult<Json<AssessmentPeriod>> {
    let period = state
        .engine
        .active_period()
        .await?
        .ok_or_else(|| ApiError::NotFound("No active period".to_string()))?;
    Ok(Json(period))
}

/// Create an upcoming period
pub async fn create_period(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreatePeriodRequest>,
) -> ApiResult<(StatusCode, Json<AssessmentPeriod>)> {
    let period = state
        .engine
        .create_period(&actor, request.performance_year, request.assessment_year)
        .await?;
    Ok((StatusCode::CREATED, Json(period)))
}

/// Activate a period, archiving the previous one
pub async fn activate_period(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<ActivationReport>> {
    let report = state
        .engine
        .activate_period(&actor, &PeriodId::new(id))
        .await?;
    Ok(Json(report))
}

/// Archive a period
pub async fn archive_period(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<AssessmentPeriod>> {
    let period = state
        .engine
        .archive_period(&actor, &PeriodId::new(id))
        .await?;
    Ok(Json(period))
}

/// Set the period's informational deadlines
pub async fn set_deadlines(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(deadlines): Json<PeriodDeadlines>,
) -> ApiResult<Json<AssessmentPeriod>> {
    let period = state
        .engine
        .set_deadlines(&actor, &PeriodId::new(id), deadlines)
        .await?;
    Ok(Json(period))
}
