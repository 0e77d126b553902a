//! State machine: assessment transitions and edit permissions
//!
//! Every rule that decides whether an actor may change an assessment lives
//! here. Operations are synchronous and work on a mutable [`Assessment`]
//! value; a rule violation returns before anything is modified, so a failed
//! call never leaves a partial change behind. Persistence, locking and
//! evidence I/O belong to [`LifecycleEngine`](crate::LifecycleEngine).

use crate::classification::classify;
use crate::completeness::{compute_validation, unreviewed_responses};
use crate::policy::EnginePolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sglgb_types::*;

/// What [`StateMachine::record_validation`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Created,
    Updated,
    /// Same judgment as the current record; nothing written
    Unchanged,
}

/// Result of closing a review
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub status: AssessmentStatus,
    /// Responses reopened for the BLGU
    pub flagged: Vec<ResponseId>,
    pub rework_count: u32,
}

/// Pure transition rules for assessments
#[derive(Clone, Debug, Default)]
pub struct StateMachine {
    policy: EnginePolicy,
}

impl StateMachine {
    pub fn new(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    fn ensure_not_finalized(assessment: &Assessment) -> LifecycleResult<()> {
        if assessment.status == AssessmentStatus::Finalized {
            return Err(LifecycleError::AssessmentFinalized {
                assessment_id: assessment.id.clone(),
            });
        }
        Ok(())
    }

    fn locked(assessment: &Assessment) -> LifecycleError {
        LifecycleError::LockedAssessment {
            assessment_id: assessment.id.clone(),
            status: assessment.status,
        }
    }

    fn find_response<'a>(
        assessment: &'a Assessment,
        response_id: &ResponseId,
    ) -> LifecycleResult<&'a IndicatorResponse> {
        assessment
            .response(response_id)
            .ok_or_else(|| LifecycleError::ResponseNotFound(response_id.clone()))
    }

    fn find_response_mut<'a>(
        assessment: &'a mut Assessment,
        response_id: &ResponseId,
    ) -> LifecycleResult<&'a mut IndicatorResponse> {
        assessment
            .response_mut(response_id)
            .ok_or_else(|| LifecycleError::ResponseNotFound(response_id.clone()))
    }

    /// May this BLGU actor change the response right now?
    ///
    /// Checked in order: barangay scope, finalization, response existence,
    /// then status (rework only opens flagged responses).
    pub fn check_blgu_edit(
        &self,
        assessment: &Assessment,
        actor: &Actor,
        response_id: &ResponseId,
    ) -> LifecycleResult<()> {
        if !actor.is_blgu_of(&assessment.barangay_id) {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} cannot edit responses of barangay {}",
                actor, assessment.barangay_id
            )));
        }
        Self::ensure_not_finalized(assessment)?;
        let response = Self::find_response(assessment, response_id)?;

        match assessment.status {
            AssessmentStatus::InProgress => Ok(()),
            AssessmentStatus::NeedsRework if response.is_flagged_for_rework() => Ok(()),
            AssessmentStatus::NeedsRework => Err(LifecycleError::NotEligibleForEdit {
                response_id: response_id.clone(),
            }),
            _ => Err(Self::locked(assessment)),
        }
    }

    /// Set the BLGU's compliance answer. Existing MOVs are kept when the
    /// answer moves away from "yes".
    pub fn set_answer(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        response_id: &ResponseId,
        answer: ComplianceAnswer,
        now: DateTime<Utc>,
    ) -> LifecycleResult<()> {
        self.check_blgu_edit(assessment, actor, response_id)?;

        let response = Self::find_response_mut(assessment, response_id)?;
        let previous = response.answer.replace(answer);
        response.updated_at = now;
        let indicator_id = response.indicator_id.clone();

        assessment.record(
            actor,
            AuditEvent::AnswerSet {
                response_id: response_id.clone(),
                indicator_id,
                previous,
                answer,
            },
            now,
        );
        Ok(())
    }

    /// Append a stored MOV to the response
    pub fn attach_evidence(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        response_id: &ResponseId,
        file: MovFile,
        now: DateTime<Utc>,
    ) -> LifecycleResult<()> {
        self.check_blgu_edit(assessment, actor, response_id)?;

        let event = AuditEvent::EvidenceAttached {
            response_id: response_id.clone(),
            file_id: file.id.clone(),
            filename: file.filename.clone(),
        };
        let response = Self::find_response_mut(assessment, response_id)?;
        response.mov_files.push(file);
        response.updated_at = now;

        assessment.record(actor, event, now);
        Ok(())
    }

    /// Remove a BLGU MOV, returning it
    pub fn remove_evidence(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        response_id: &ResponseId,
        file_id: &MovFileId,
        now: DateTime<Utc>,
    ) -> LifecycleResult<MovFile> {
        self.check_blgu_edit(assessment, actor, response_id)?;

        let response = Self::find_response_mut(assessment, response_id)?;
        let file = response
            .take_mov(file_id)
            .ok_or_else(|| LifecycleError::EvidenceNotFound {
                response_id: response_id.clone(),
                file_id: file_id.clone(),
            })?;
        response.updated_at = now;

        assessment.record(
            actor,
            AuditEvent::EvidenceRemoved {
                response_id: response_id.clone(),
                file_id: file.id.clone(),
                filename: file.filename.clone(),
            },
            now,
        );
        Ok(file)
    }

    /// Assessors annotate responses of their own area in any status short
    /// of finalization.
    pub fn check_assessor_upload(
        &self,
        assessment: &Assessment,
        actor: &Actor,
        response_id: &ResponseId,
    ) -> LifecycleResult<()> {
        let response = Self::find_response(assessment, response_id)?;
        if !actor.is_assessor_of(&response.governance_area_id) {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} is not the assessor of {}",
                actor, response.governance_area_id
            )));
        }
        Self::ensure_not_finalized(assessment)
    }

    pub fn attach_assessor_evidence(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        response_id: &ResponseId,
        file: MovFile,
        now: DateTime<Utc>,
    ) -> LifecycleResult<()> {
        self.check_assessor_upload(assessment, actor, response_id)?;

        let event = AuditEvent::AssessorEvidenceAttached {
            response_id: response_id.clone(),
            file_id: file.id.clone(),
            filename: file.filename.clone(),
        };
        let response = Self::find_response_mut(assessment, response_id)?;
        response.assessor_files.push(file);

        assessment.record(actor, event, now);
        Ok(())
    }

    /// Upsert the assessor's judgment for a response.
    ///
    /// Allowed while the assessment is submitted, or during rework for a
    /// response that was flagged. Does not change the assessment status.
    #[allow(clippy::too_many_arguments)]
    pub fn record_validation(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        response_id: &ResponseId,
        status: Option<ValidationStatus>,
        public_comment: Option<String>,
        internal_note: Option<String>,
        now: DateTime<Utc>,
    ) -> LifecycleResult<RecordOutcome> {
        let response = Self::find_response(assessment, response_id)?;
        if !actor.is_assessor_of(&response.governance_area_id) {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} is not the assessor of {}",
                actor, response.governance_area_id
            )));
        }
        Self::ensure_not_finalized(assessment)?;
        match assessment.status {
            AssessmentStatus::Submitted => {}
            AssessmentStatus::NeedsRework if response.is_flagged_for_rework() => {}
            _ => return Err(Self::locked(assessment)),
        }

        let record = ValidationRecord::new(
            response_id.clone(),
            status,
            public_comment,
            internal_note,
            actor.user_id.clone(),
        )?
        .with_set_at(now);

        let outcome = match assessment.validation(response_id) {
            Some(current) if current.same_judgment(&record) => return Ok(RecordOutcome::Unchanged),
            Some(_) => RecordOutcome::Updated,
            None => RecordOutcome::Created,
        };

        let event = AuditEvent::ValidationRecorded {
            response_id: response_id.clone(),
            status: record.status(),
            public_comment: record.public_comment().map(str::to_string),
        };
        assessment.validations.insert(response_id.clone(), record);
        assessment.record(actor, event, now);
        Ok(outcome)
    }

    /// Aggregate the current judgments into validated or needs_rework.
    pub fn close_review(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> LifecycleResult<ReviewOutcome> {
        if !(actor.role == Role::AreaAssessor || actor.is_admin()) {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} cannot close reviews",
                actor
            )));
        }
        Self::ensure_not_finalized(assessment)?;
        if assessment.status != AssessmentStatus::Submitted {
            return Err(Self::locked(assessment));
        }

        let unreviewed = unreviewed_responses(assessment);
        if !unreviewed.is_empty() {
            return Err(LifecycleError::IncompleteValidation {
                assessment_id: assessment.id.clone(),
                unreviewed,
            });
        }

        let reopened: Vec<(ResponseId, Option<String>)> = assessment
            .validations
            .values()
            .filter(|v| !v.is_pass())
            .map(|v| (v.response_id().clone(), v.public_comment().map(str::to_string)))
            .collect();

        if !reopened.is_empty() {
            if let Some(limit) = self.policy.max_rework_cycles {
                if assessment.rework_count >= limit {
                    return Err(LifecycleError::ReworkLimitReached {
                        assessment_id: assessment.id.clone(),
                        limit,
                    });
                }
            }
        }

        let mut flagged = Vec::with_capacity(reopened.len());
        for (response_id, comment) in reopened {
            let response = Self::find_response_mut(assessment, &response_id)?;
            response.rework = Some(ReworkFlag {
                flagged_at: now,
                assessor_comment: comment,
            });
            response.updated_at = now;
            flagged.push(response_id);
        }

        if flagged.is_empty() {
            assessment.status = AssessmentStatus::Validated;
            assessment.validated_at = Some(now);
        } else {
            assessment.status = AssessmentStatus::NeedsRework;
            assessment.rework_count += 1;
        }

        assessment.record(
            actor,
            AuditEvent::ReviewClosed {
                outcome: assessment.status,
                flagged: flagged.clone(),
            },
            now,
        );

        Ok(ReviewOutcome {
            status: assessment.status,
            flagged,
            rework_count: assessment.rework_count,
        })
    }

    /// Submit (or resubmit after rework) for assessor review
    pub fn submit(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> LifecycleResult<()> {
        if !actor.is_blgu_of(&assessment.barangay_id) {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} cannot submit for barangay {}",
                actor, assessment.barangay_id
            )));
        }
        Self::ensure_not_finalized(assessment)?;
        if !assessment.status.is_unlocked() {
            return Err(Self::locked(assessment));
        }

        let summary = compute_validation(assessment);
        if !summary.can_submit {
            return Err(LifecycleError::SubmissionNotEligible {
                assessment_id: assessment.id.clone(),
                missing_indicators: summary.missing_indicators,
                missing_movs: summary.missing_movs,
            });
        }

        for response in assessment.responses.iter_mut() {
            response.rework = None;
        }
        assessment.status = AssessmentStatus::Submitted;
        assessment.submitted_at = Some(now);

        let rework_cycle = assessment.rework_count;
        assessment.record(actor, AuditEvent::Submitted { rework_cycle }, now);
        Ok(())
    }

    /// Close the assessment for good and record the seal determination
    pub fn finalize(
        &self,
        assessment: &mut Assessment,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> LifecycleResult<SealDetermination> {
        if !actor.is_admin() {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} cannot finalize assessments",
                actor
            )));
        }
        Self::ensure_not_finalized(assessment)?;
        if assessment.status != AssessmentStatus::Validated {
            return Err(LifecycleError::InvalidTransition(format!(
                "cannot finalize assessment {} from {}",
                assessment.id, assessment.status
            )));
        }

        let seal = classify(assessment, &self.policy, now);
        assessment.status = AssessmentStatus::Finalized;
        assessment.finalized_at = Some(now);
        assessment.seal = Some(seal.clone());
        assessment.record(
            actor,
            AuditEvent::Finalized {
                compliance: seal.compliance,
            },
            now,
        );
        Ok(seal)
    }
}
