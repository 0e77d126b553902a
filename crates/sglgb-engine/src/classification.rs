//! Seal determination ("3+1" rule)
//!
//! An area passes when every one of its indicators has a current Pass
//! judgment. The barangay earns the seal when every Core area passes and at
//! least `essential_areas_required` Essential areas pass.

use crate::policy::EnginePolicy;
use chrono::{DateTime, Utc};
use sglgb_types::{AreaKind, AreaResult, Assessment, ComplianceStatus, SealDetermination};

/// Classify an assessment against its current validation records. Pure.
pub fn classify(
    assessment: &Assessment,
    policy: &EnginePolicy,
    now: DateTime<Utc>,
) -> SealDetermination {
    let area_results: Vec<AreaResult> = assessment
        .governance_areas
        .iter()
        .map(|area| {
            let indicators_total = area.indicators.len();
            let indicators_passed = assessment
                .responses_in_area(&area.id)
                .filter(|r| assessment.validation(&r.id).is_some_and(|v| v.is_pass()))
                .count();
            AreaResult {
                area_id: area.id.clone(),
                code: area.code.clone(),
                name: area.name.clone(),
                kind: area.kind,
                passed: indicators_total > 0 && indicators_passed == indicators_total,
                indicators_passed,
                indicators_total,
            }
        })
        .collect();

    let count = |kind: AreaKind, passed_only: bool| {
        area_results
            .iter()
            .filter(|r| r.kind == kind && (!passed_only || r.passed))
            .count()
    };
    let core_areas_total = count(AreaKind::Core, false);
    let core_areas_passed = count(AreaKind::Core, true);
    let essential_areas_passed = count(AreaKind::Essential, true);

    let compliance = if core_areas_passed == core_areas_total
        && essential_areas_passed >= policy.essential_areas_required
    {
        ComplianceStatus::Passed
    } else {
        ComplianceStatus::Failed
    };

    SealDetermination {
        compliance,
        core_areas_passed,
        core_areas_total,
        essential_areas_passed,
        essential_areas_required: policy.essential_areas_required,
        area_results,
        determined_at: now,
    }
}
