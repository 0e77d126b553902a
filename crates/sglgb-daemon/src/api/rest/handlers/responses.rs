//! Indicator response handlers: answers, evidence and assessor verdicts

use super::views::ResponseStatusView;
use crate::api::rest::actor::CurrentActor;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sglgb_engine::EvidenceUpload;
use sglgb_types::{
    ComplianceAnswer, MovFile, MovFileId, ResponseId, ValidationRecord, ValidationStatus,
};

/// Set answer request
#[derive(Debug, Deserialize)]
pub struct SetAnswerRequest {
    pub answer: ComplianceAnswer,
}

/// Evidence upload parameters. The file itself is the raw request body.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
    /// Falls back to the request's Content-Type header
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Record validation request
#[derive(Debug, Deserialize)]
pub struct RecordValidationRequest {
    #[serde(default)]
    pub status: Option<ValidationStatus>,
    #[serde(default)]
    pub public_comment: Option<String>,
    #[serde(default)]
    pub internal_note: Option<String>,
}

/// Set the compliance answer
pub async fn set_answer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<SetAnswerRequest>,
) -> ApiResult<Json<ResponseStatusView>> {
    let response = state
        .engine
        .set_answer(&actor, &ResponseId::new(id), request.answer)
        .await?;
    Ok(Json(response.into()))
}

fn upload_from(
    state: &AppState,
    actor: &sglgb_types::Actor,
    params: UploadParams,
    headers: &HeaderMap,
    body: Bytes,
) -> ApiResult<EvidenceUpload> {
    let content_type = params
        .content_type
        .or_else(|| {
            headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .ok_or_else(|| ApiError::BadRequest("content type is required".to_string()))?;

    state
        .uploads
        .check(actor.role, &params.filename, &content_type, body.len() as u64)?;
    Ok(EvidenceUpload::new(params.filename, content_type, body))
}

/// Upload a MOV file for a response
pub async fn upload_evidence(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MovFile>)> {
    let upload = upload_from(&state, &actor, params, &headers, body)?;
    let file = state
        .engine
        .attach_evidence(&actor, &ResponseId::new(id), upload)
        .await?;
    Ok((StatusCode::CREATED, Json(file)))
}

/// Upload supplementary evidence as the assessor
pub async fn upload_assessor_evidence(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MovFile>)> {
    let upload = upload_from(&state, &actor, params, &headers, body)?;
    let file = state
        .engine
        .attach_assessor_evidence(&actor, &ResponseId::new(id), upload)
        .await?;
    Ok((StatusCode::CREATED, Json(file)))
}

/// Remove a MOV file
pub async fn delete_evidence(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, file_id)): Path<(String, String)>,
) -> ApiResult<Json<MovFile>> {
    let file = state
        .engine
        .remove_evidence(&actor, &ResponseId::new(id), &MovFileId::new(file_id))
        .await?;
    Ok(Json(file))
}

/// Download a MOV file
pub async fn download_evidence(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, file_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let (file, bytes) = state
        .engine
        .fetch_evidence(&actor, &ResponseId::new(id), &MovFileId::new(file_id))
        .await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let filename = file.filename.replace(['"', '\\'], "_");
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Record (or clear) the assessor's verdict
pub async fn record_validation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<RecordValidationRequest>,
) -> ApiResult<Json<ValidationRecord>> {
    let record = state
        .engine
        .record_validation(
            &actor,
            &ResponseId::new(id),
            request.status,
            request.public_comment,
            request.internal_note,
        )
        .await?;
    Ok(Json(record))
}
