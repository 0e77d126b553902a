//! Assessments: the aggregate mutated by the lifecycle engine

use crate::{
    Actor, AuditEntry, AuditEvent, BarangayId, GovernanceArea, Indicator, IndicatorCatalogue,
    IndicatorResponse, PeriodId, ResponseId, SealDetermination, ValidationRecord, AssessmentId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Assessment lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    NeedsRework,
    Submitted,
    Validated,
    Finalized,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::NeedsRework => "needs_rework",
            AssessmentStatus::Submitted => "submitted",
            AssessmentStatus::Validated => "validated",
            AssessmentStatus::Finalized => "finalized",
        }
    }

    /// The BLGU may edit (some) responses in this status
    pub fn is_unlocked(&self) -> bool {
        matches!(
            self,
            AssessmentStatus::InProgress | AssessmentStatus::NeedsRework
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == AssessmentStatus::Finalized
    }
}

impl std::fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One barangay's assessment for one period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub barangay_id: BarangayId,
    pub period_id: PeriodId,
    pub status: AssessmentStatus,
    /// Catalogue snapshot taken when the assessment was created
    pub governance_areas: Vec<GovernanceArea>,
    pub responses: Vec<IndicatorResponse>,
    /// Current validation record per response
    #[serde(default)]
    pub validations: BTreeMap<ResponseId, ValidationRecord>,
    /// Number of times a review has closed into rework
    #[serde(default)]
    pub rework_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seal: Option<SealDetermination>,
    #[serde(default)]
    pub history: Vec<AuditEntry>,
}

impl Assessment {
    /// A fresh assessment with one blank response per catalogue indicator
    pub fn create(
        barangay_id: BarangayId,
        period_id: PeriodId,
        catalogue: &IndicatorCatalogue,
        created_by: &Actor,
    ) -> Self {
        let now = Utc::now();
        let responses: Vec<IndicatorResponse> = catalogue
            .indicators()
            .map(IndicatorResponse::for_indicator)
            .collect();
        let created = AuditEntry::new(
            created_by,
            AuditEvent::Created {
                responses: responses.len(),
            },
            now,
        );

        Self {
            id: AssessmentId::generate(),
            barangay_id,
            period_id,
            status: AssessmentStatus::InProgress,
            governance_areas: catalogue.areas().to_vec(),
            responses,
            validations: BTreeMap::new(),
            rework_count: 0,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            validated_at: None,
            finalized_at: None,
            seal: None,
            history: vec![created],
        }
    }

    pub fn response(&self, id: &ResponseId) -> Option<&IndicatorResponse> {
        self.responses.iter().find(|r| &r.id == id)
    }

    pub fn response_mut(&mut self, id: &ResponseId) -> Option<&mut IndicatorResponse> {
        self.responses.iter_mut().find(|r| &r.id == id)
    }

    pub fn validation(&self, id: &ResponseId) -> Option<&ValidationRecord> {
        self.validations.get(id)
    }

    pub fn indicator(&self, response: &IndicatorResponse) -> Option<&Indicator> {
        self.governance_areas
            .iter()
            .flat_map(|a| a.indicators.iter())
            .find(|i| i.id == response.indicator_id)
    }

    pub fn flagged_responses(&self) -> impl Iterator<Item = &IndicatorResponse> {
        self.responses.iter().filter(|r| r.is_flagged_for_rework())
    }

    /// Responses under the governance area
    pub fn responses_in_area<'a>(
        &'a self,
        area_id: &'a crate::GovernanceAreaId,
    ) -> impl Iterator<Item = &'a IndicatorResponse> + 'a {
        self.responses
            .iter()
            .filter(move |r| &r.governance_area_id == area_id)
    }

    /// Append to the history and bump `updated_at`
    pub fn record(&mut self, actor: &Actor, event: AuditEvent, at: DateTime<Utc>) {
        self.history.push(AuditEntry::new(actor, event, at));
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_instantiates_one_response_per_indicator() {
        let catalogue = IndicatorCatalogue::builtin();
        let a = Assessment::create(
            BarangayId::new("b-1"),
            PeriodId::new("p-1"),
            &catalogue,
            &Actor::admin("root"),
        );

        assert_eq!(a.status, AssessmentStatus::InProgress);
        assert_eq!(a.responses.len(), catalogue.indicator_count());
        assert!(a.responses.iter().all(|r| r.answer.is_none()));
        assert!(a.validations.is_empty());
        assert_eq!(a.history.len(), 1);

        let first = &a.responses[0];
        assert_eq!(a.indicator(first).unwrap().id, first.indicator_id);
    }

    #[test]
    fn test_unlocked_statuses() {
        assert!(AssessmentStatus::InProgress.is_unlocked());
        assert!(AssessmentStatus::NeedsRework.is_unlocked());
        assert!(!AssessmentStatus::Submitted.is_unlocked());
        assert!(!AssessmentStatus::Validated.is_unlocked());
        assert!(AssessmentStatus::Finalized.is_terminal());
    }
}
