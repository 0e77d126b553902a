//! Indicator catalogue handler

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use sglgb_types::GovernanceArea;

/// The governance areas and indicators new assessments are built from
pub async fn get_catalogue(State(state): State<AppState>) -> Json<Vec<GovernanceArea>> {
    Json(state.engine.catalogue().areas().to_vec())
}
