//! Submission gate
//!
//! The one place that decides whether an assessment is complete enough to
//! submit. During rework only the flagged responses are in scope; responses
//! the assessor already passed stay locked and are not re-checked.

use serde::{Deserialize, Serialize};
use sglgb_types::{Assessment, AssessmentStatus, IndicatorId, IndicatorResponse, ResponseId};

/// Result of [`compute_validation`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub is_complete: bool,
    /// Indicators with no answer yet
    pub missing_indicators: Vec<IndicatorId>,
    /// Indicators answered "yes" without any MOV
    pub missing_movs: Vec<IndicatorId>,
    pub can_submit: bool,
}

fn in_scope<'a>(
    assessment: &'a Assessment,
) -> Box<dyn Iterator<Item = &'a IndicatorResponse> + 'a> {
    if assessment.status == AssessmentStatus::NeedsRework {
        Box::new(assessment.flagged_responses())
    } else {
        Box::new(assessment.responses.iter())
    }
}

/// Evaluate the submission gate. Pure.
pub fn compute_validation(assessment: &Assessment) -> ValidationSummary {
    let mut missing_indicators = Vec::new();
    let mut missing_movs = Vec::new();

    for response in in_scope(assessment) {
        if response.answer.is_none() {
            missing_indicators.push(response.indicator_id.clone());
        } else if response.is_missing_evidence() {
            missing_movs.push(response.indicator_id.clone());
        }
    }

    let is_complete = missing_indicators.is_empty() && missing_movs.is_empty();
    ValidationSummary {
        is_complete,
        missing_indicators,
        missing_movs,
        can_submit: is_complete && assessment.status.is_unlocked(),
    }
}

/// Responses with no current judgment (no record, or a record with no verdict)
pub fn unreviewed_responses(assessment: &Assessment) -> Vec<ResponseId> {
    assessment
        .responses
        .iter()
        .filter(|r| {
            assessment
                .validation(&r.id)
                .and_then(|v| v.status())
                .is_none()
        })
        .map(|r| r.id.clone())
        .collect()
}
