//! Health and status handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::Serialize;
use sglgb_types::{AssessmentStatus, PeriodId};
use std::collections::BTreeMap;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub stats: DaemonStats,
}

/// Daemon statistics
#[derive(Debug, Serialize)]
pub struct DaemonStats {
    pub active_period: Option<PeriodId>,
    pub total_barangays: usize,
    pub total_indicators: usize,
    /// Assessments in the active period, by status
    pub assessments: BTreeMap<&'static str, usize>,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> ApiResult<Json<DaemonStatusResponse>> {
    let engine = &state.engine;
    let barangays = engine.list_barangays().await?;
    let active = engine.active_period().await?;

    let mut assessments = BTreeMap::new();
    if let Some(period) = &active {
        for status in engine.assessment_statuses(&period.id).await? {
            *assessments.entry(status.as_str()).or_insert(0) += 1;
        }
    }
    for status in [
        AssessmentStatus::InProgress,
        AssessmentStatus::Submitted,
        AssessmentStatus::NeedsRework,
        AssessmentStatus::Validated,
        AssessmentStatus::Finalized,
    ] {
        assessments.entry(status.as_str()).or_insert(0);
    }

    Ok(Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        stats: DaemonStats {
            active_period: active.map(|p| p.id),
            total_barangays: barangays.len(),
            total_indicators: engine.catalogue().indicator_count(),
            assessments,
        },
    }))
}
