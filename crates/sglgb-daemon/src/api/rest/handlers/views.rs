//! Response bodies that add derived fields to domain types

use chrono::{DateTime, Utc};
use serde::Serialize;
use sglgb_types::{
    Assessment, AssessmentId, AssessmentStatus, BarangayId, IndicatorResponse, PeriodId,
    ResponseStatus, SealDetermination, ValidationRecord,
};

/// A response with its derived status and catalogue labels
#[derive(Debug, Serialize)]
pub struct ResponseView {
    #[serde(flatten)]
    pub response: IndicatorResponse,
    pub status: ResponseStatus,
    pub indicator_code: Option<String>,
    pub indicator_name: Option<String>,
    pub validation: Option<ValidationRecord>,
}

/// An assessment as returned by the API. History has its own endpoint.
#[derive(Debug, Serialize)]
pub struct AssessmentView {
    pub id: AssessmentId,
    pub barangay_id: BarangayId,
    pub period_id: PeriodId,
    pub status: AssessmentStatus,
    pub rework_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub seal: Option<SealDetermination>,
    pub responses: Vec<ResponseView>,
}

impl From<Assessment> for AssessmentView {
    fn from(assessment: Assessment) -> Self {
        let responses = assessment
            .responses
            .iter()
            .map(|response| {
                let indicator = assessment.indicator(response);
                ResponseView {
                    status: response.status(),
                    indicator_code: indicator.map(|i| i.code.clone()),
                    indicator_name: indicator.map(|i| i.name.clone()),
                    validation: assessment.validation(&response.id).cloned(),
                    response: response.clone(),
                }
            })
            .collect();

        Self {
            id: assessment.id,
            barangay_id: assessment.barangay_id,
            period_id: assessment.period_id,
            status: assessment.status,
            rework_count: assessment.rework_count,
            created_at: assessment.created_at,
            updated_at: assessment.updated_at,
            submitted_at: assessment.submitted_at,
            validated_at: assessment.validated_at,
            finalized_at: assessment.finalized_at,
            seal: assessment.seal,
            responses,
        }
    }
}

/// A single response after an edit
#[derive(Debug, Serialize)]
pub struct ResponseStatusView {
    #[serde(flatten)]
    pub response: IndicatorResponse,
    pub status: ResponseStatus,
}

impl From<IndicatorResponse> for ResponseStatusView {
    fn from(response: IndicatorResponse) -> Self {
        Self {
            status: response.status(),
            response,
        }
    }
}
