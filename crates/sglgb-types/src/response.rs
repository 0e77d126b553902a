//! Indicator responses and their evidence
//!
//! A response's status is a function of its answer, its evidence and its
//! rework flag. There is no status field to fall out of sync.

use crate::{GovernanceAreaId, Indicator, IndicatorId, MovFileId, ResponseId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The BLGU's compliance answer for an indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceAnswer {
    Yes,
    No,
    #[serde(rename = "na", alias = "n/a")]
    NotApplicable,
}

impl ComplianceAnswer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceAnswer::Yes => "yes",
            ComplianceAnswer::No => "no",
            ComplianceAnswer::NotApplicable => "na",
        }
    }
}

impl std::fmt::Display for ComplianceAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived status of a response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// No answer yet
    NotStarted,
    /// Answered "yes" but no MOV attached
    MissingEvidence,
    /// Answered, with at least one MOV when the answer is "yes"
    Completed,
    /// Reopened by the assessor; editable during rework
    NeedsRework,
}

/// A Means of Verification file reference. The bytes live in the evidence gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovFile {
    pub id: MovFileId,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
    pub storage_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: UserId,
}

/// Set on a response when a review closes with a non-Pass verdict for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReworkFlag {
    pub flagged_at: DateTime<Utc>,
    /// Public comment copied from the validation record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessor_comment: Option<String>,
}

/// The BLGU's answer and evidence for one indicator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResponse {
    pub id: ResponseId,
    pub indicator_id: IndicatorId,
    pub governance_area_id: GovernanceAreaId,
    #[serde(default)]
    pub answer: Option<ComplianceAnswer>,
    /// BLGU-uploaded evidence
    #[serde(default)]
    pub mov_files: Vec<MovFile>,
    /// Assessor-uploaded supplementary evidence (site visits and the like)
    #[serde(default)]
    pub assessor_files: Vec<MovFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rework: Option<ReworkFlag>,
    pub updated_at: DateTime<Utc>,
}

impl IndicatorResponse {
    /// A blank response for a catalogue indicator
    pub fn for_indicator(indicator: &Indicator) -> Self {
        Self {
            id: ResponseId::generate(),
            indicator_id: indicator.id.clone(),
            governance_area_id: indicator.governance_area_id.clone(),
            answer: None,
            mov_files: Vec::new(),
            assessor_files: Vec::new(),
            rework: None,
            updated_at: Utc::now(),
        }
    }

    /// Answered "yes" with no MOV attached
    pub fn is_missing_evidence(&self) -> bool {
        self.answer == Some(ComplianceAnswer::Yes) && self.mov_files.is_empty()
    }

    /// Completeness gate used by submission
    pub fn is_complete(&self) -> bool {
        self.answer.is_some() && !self.is_missing_evidence()
    }

    pub fn is_flagged_for_rework(&self) -> bool {
        self.rework.is_some()
    }

    pub fn status(&self) -> ResponseStatus {
        if self.rework.is_some() {
            ResponseStatus::NeedsRework
        } else if self.answer.is_none() {
            ResponseStatus::NotStarted
        } else if self.is_missing_evidence() {
            ResponseStatus::MissingEvidence
        } else {
            ResponseStatus::Completed
        }
    }

    pub fn assessor_comment(&self) -> Option<&str> {
        self.rework
            .as_ref()
            .and_then(|r| r.assessor_comment.as_deref())
    }

    pub fn find_mov(&self, file_id: &MovFileId) -> Option<&MovFile> {
        self.mov_files.iter().find(|f| &f.id == file_id)
    }

    /// Remove a BLGU evidence file, returning it if present
    pub fn take_mov(&mut self, file_id: &MovFileId) -> Option<MovFile> {
        let index = self.mov_files.iter().position(|f| &f.id == file_id)?;
        Some(self.mov_files.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndicatorCatalogue;

    fn response() -> IndicatorResponse {
        let catalogue = IndicatorCatalogue::builtin();
        let indicator = catalogue.indicators().next().unwrap();
        IndicatorResponse::for_indicator(indicator)
    }

    fn mov(name: &str) -> MovFile {
        MovFile {
            id: MovFileId::generate(),
            filename: name.to_string(),
            size: 10,
            content_type: "application/pdf".into(),
            storage_path: format!("test/{}", name),
            uploaded_at: Utc::now(),
            uploaded_by: UserId::new("u"),
        }
    }

    #[test]
    fn test_status_derivation() {
        let mut r = response();
        assert_eq!(r.status(), ResponseStatus::NotStarted);

        r.answer = Some(ComplianceAnswer::No);
        assert_eq!(r.status(), ResponseStatus::Completed);

        r.answer = Some(ComplianceAnswer::Yes);
        assert_eq!(r.status(), ResponseStatus::MissingEvidence);
        assert!(!r.is_complete());

        r.mov_files.push(mov("resolution.pdf"));
        assert_eq!(r.status(), ResponseStatus::Completed);

        r.rework = Some(ReworkFlag {
            flagged_at: Utc::now(),
            assessor_comment: Some("Unsigned".into()),
        });
        assert_eq!(r.status(), ResponseStatus::NeedsRework);
        assert_eq!(r.assessor_comment(), Some("Unsigned"));
    }

    #[test]
    fn test_yes_without_evidence_never_complete() {
        let mut indicator = IndicatorCatalogue::builtin().indicators().next().unwrap().clone();
        indicator.requires_evidence = false;
        let mut r = IndicatorResponse::for_indicator(&indicator);
        r.answer = Some(ComplianceAnswer::Yes);
        assert_eq!(r.status(), ResponseStatus::MissingEvidence);
        assert!(!r.is_complete());

        r.answer = Some(ComplianceAnswer::NotApplicable);
        assert!(r.is_complete());
    }

    #[test]
    fn test_take_mov() {
        let mut r = response();
        let file = mov("a.pdf");
        r.mov_files.push(file.clone());
        assert_eq!(r.take_mov(&file.id), Some(file.clone()));
        assert!(r.take_mov(&file.id).is_none());
    }

    #[test]
    fn test_answer_wire_format() {
        assert_eq!(
            serde_json::to_string(&ComplianceAnswer::NotApplicable).unwrap(),
            "\"na\""
        );
        let parsed: ComplianceAnswer = serde_json::from_str("\"n/a\"").unwrap();
        assert_eq!(parsed, ComplianceAnswer::NotApplicable);
    }
}
