//! Assessor work queue

use crate::api::rest::actor::CurrentActor;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use sglgb_engine::QueueItem;

/// Submissions awaiting or under review, oldest first
pub async fn get_queue(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<QueueItem>>> {
    Ok(Json(state.engine.assessor_queue(&actor).await?))
}
