//! Barangay handlers

use super::views::AssessmentView;
use crate::api::rest::actor::CurrentActor;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sglgb_types::{Barangay, BarangayId};

/// Register barangay request
#[derive(Debug, Deserialize)]
pub struct RegisterBarangayRequest {
    /// Optional caller-chosen id (e.g. the PSGC code)
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// List registered barangays
pub async fn list_barangays(State(state): State<AppState>) -> ApiResult<Json<Vec<Barangay>>> {
    Ok(Json(state.engine.list_barangays().await?))
}

/// Register a barangay
pub async fn register_barangay(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<RegisterBarangayRequest>,
) -> ApiResult<(StatusCode, Json<Barangay>)> {
    let mut barangay = Barangay::new(request.name.trim());
    if let Some(id) = request.id {
        barangay = barangay.with_id(BarangayId::new(id));
    }
    let barangay = state.engine.register_barangay(&actor, barangay).await?;
    Ok((StatusCode::CREATED, Json(barangay)))
}

/// The barangay's assessment in the active period
pub async fn get_current_assessment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Json<AssessmentView>> {
    let assessment = state
        .engine
        .current_assessment(&actor, &BarangayId::new(id))
        .await?;
    Ok(Json(assessment.into()))
}
