//! Dashboard progress metrics

use serde::{Deserialize, Serialize};
use sglgb_types::{Assessment, GovernanceAreaId, IndicatorResponse, ResponseStatus};

/// Response counts for one governance area
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaProgress {
    pub area_id: GovernanceAreaId,
    pub code: String,
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub needs_rework: usize,
}

/// Response counts for an assessment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub total: usize,
    pub completed: usize,
    pub needs_rework: usize,
    pub missing_evidence: usize,
    pub not_started: usize,
    /// Completed share of all responses, 0.0 to 100.0, one decimal
    pub percent_complete: f64,
    pub per_area: Vec<AreaProgress>,
}

fn count<'a>(
    responses: impl Iterator<Item = &'a IndicatorResponse>,
    status: ResponseStatus,
) -> usize {
    responses.filter(|r| r.status() == status).count()
}

pub fn progress(assessment: &Assessment) -> ProgressMetrics {
    let all = || assessment.responses.iter();
    let total = assessment.responses.len();
    let completed = count(all(), ResponseStatus::Completed);

    let per_area = assessment
        .governance_areas
        .iter()
        .map(|area| AreaProgress {
            area_id: area.id.clone(),
            code: area.code.clone(),
            name: area.name.clone(),
            total: assessment.responses_in_area(&area.id).count(),
            completed: count(assessment.responses_in_area(&area.id), ResponseStatus::Completed),
            needs_rework: count(
                assessment.responses_in_area(&area.id),
                ResponseStatus::NeedsRework,
            ),
        })
        .collect();

    let percent_complete = if total == 0 {
        0.0
    } else {
        (completed as f64 * 1000.0 / total as f64).round() / 10.0
    };

    ProgressMetrics {
        total,
        completed,
        needs_rework: count(all(), ResponseStatus::NeedsRework),
        missing_evidence: count(all(), ResponseStatus::MissingEvidence),
        not_started: count(all(), ResponseStatus::NotStarted),
        percent_complete,
        per_area,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::tests::blank_assessment;
    use sglgb_types::ComplianceAnswer;

    #[test]
    fn test_progress_counts() {
        let mut a = blank_assessment();
        a.responses[0].answer = Some(ComplianceAnswer::No);
        a.responses[1].answer = Some(ComplianceAnswer::Yes);

        let metrics = progress(&a);
        assert_eq!(metrics.total, 7);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.missing_evidence, 1);
        assert_eq!(metrics.not_started, 5);
        assert_eq!(metrics.percent_complete, 14.3);

        let fa = &metrics.per_area[0];
        assert_eq!(fa.total, 2);
        assert_eq!(fa.completed, 1);
        assert_eq!(metrics.per_area.iter().map(|p| p.total).sum::<usize>(), 7);
    }
}
