//! Lifecycle engine: the async controller around [`StateMachine`]
//!
//! Every mutating operation on an assessment runs as one unit of work:
//!
//! 1. take the period gate (shared) and the assessment's lock (exclusive),
//! 2. load the aggregate and refuse if its period is archived,
//! 3. apply the [`StateMachine`] rule to a private copy,
//! 4. write the copy back with a single `put_assessment`.
//!
//! A failed rule leaves the stored aggregate untouched, and `submit` /
//! `close_review` always see a complete snapshot because no other write to
//! the same assessment can interleave. Period administration takes the gate
//! exclusively, so archival and creation of a period's assessments happen
//! as one bulk effect.

use crate::classification::classify;
use crate::completeness::{compute_validation, unreviewed_responses, ValidationSummary};
use crate::events::LifecycleEvent;
use crate::gateway::{EvidenceGateway, EvidenceMetadata, EvidenceUpload, GatewayError};
use crate::policy::EnginePolicy;
use crate::progress::{progress, ProgressMetrics};
use crate::state_machine::{RecordOutcome, ReviewOutcome, StateMachine};
use crate::store::{Store, StoreBatch};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sglgb_types::*;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, RwLock};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One row of an assessor's work queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub assessment_id: AssessmentId,
    pub barangay_id: BarangayId,
    pub barangay_name: String,
    pub status: AssessmentStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rework_count: u32,
    /// Responses in the assessor's area (all responses for administrators)
    pub responses_in_scope: usize,
    /// Of those, responses with a current verdict
    pub reviewed_in_scope: usize,
}

/// Result of activating a period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivationReport {
    pub period: AssessmentPeriod,
    /// The previously active period, now archived
    pub archived: Option<PeriodId>,
    pub assessments_created: usize,
}

struct UnitOfWork {
    assessment: Assessment,
    _lock: OwnedMutexGuard<()>,
    _gate: OwnedRwLockReadGuard<()>,
}

/// The assessment lifecycle controller
pub struct LifecycleEngine {
    store: Arc<dyn Store>,
    gateway: Arc<dyn EvidenceGateway>,
    catalogue: Arc<IndicatorCatalogue>,
    state_machine: StateMachine,
    locks: DashMap<AssessmentId, Arc<Mutex<()>>>,
    period_gate: Arc<RwLock<()>>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn EvidenceGateway>,
        catalogue: IndicatorCatalogue,
        policy: EnginePolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            gateway,
            catalogue: Arc::new(catalogue),
            state_machine: StateMachine::new(policy),
            locks: DashMap::new(),
            period_gate: Arc::new(RwLock::new(())),
            events,
        }
    }

    pub fn catalogue(&self) -> &IndicatorCatalogue {
        &self.catalogue
    }

    pub fn policy(&self) -> &EnginePolicy {
        self.state_machine.policy()
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: LifecycleEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    // ------------------------------------------------------------------
    // Unit of work
    // ------------------------------------------------------------------

    fn lock_for(&self, id: &AssessmentId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn begin(&self, id: &AssessmentId) -> LifecycleResult<UnitOfWork> {
        let gate = self.period_gate.clone().read_owned().await;
        let lock = self.lock_for(id).lock_owned().await;

        let assessment = self
            .store
            .get_assessment(id)
            .await?
            .ok_or_else(|| LifecycleError::AssessmentNotFound(id.to_string()))?;
        let period = self
            .store
            .get_period(&assessment.period_id)
            .await?
            .ok_or_else(|| LifecycleError::PeriodNotFound(assessment.period_id.to_string()))?;
        if period.is_archived() {
            return Err(LifecycleError::PeriodArchived {
                period_id: period.id,
            });
        }

        Ok(UnitOfWork {
            assessment,
            _lock: lock,
            _gate: gate,
        })
    }

    async fn begin_for_response(&self, response_id: &ResponseId) -> LifecycleResult<UnitOfWork> {
        let assessment_id = self.assessment_id_of(response_id).await?;
        self.begin(&assessment_id).await
    }

    async fn commit(&self, uow: UnitOfWork) -> LifecycleResult<Assessment> {
        self.store.put_assessment(uow.assessment.clone()).await?;
        Ok(uow.assessment)
    }

    async fn assessment_id_of(&self, response_id: &ResponseId) -> LifecycleResult<AssessmentId> {
        self.store
            .locate_response(response_id)
            .await?
            .ok_or_else(|| LifecycleError::ResponseNotFound(response_id.clone()))
    }

    async fn load(&self, id: &AssessmentId) -> LifecycleResult<Assessment> {
        self.store
            .get_assessment(id)
            .await?
            .ok_or_else(|| LifecycleError::AssessmentNotFound(id.to_string()))
    }

    fn ensure_admin(actor: &Actor, what: &str) -> LifecycleResult<()> {
        if !actor.is_admin() {
            return Err(LifecycleError::PermissionDenied(format!(
                "{} cannot {}",
                actor, what
            )));
        }
        Ok(())
    }

    /// BLGU users see only their own barangay; assessors and administrators
    /// see every assessment.
    fn ensure_can_read(actor: &Actor, assessment: &Assessment) -> LifecycleResult<()> {
        match actor.role {
            Role::BlguUser if !actor.is_blgu_of(&assessment.barangay_id) => {
                Err(LifecycleError::PermissionDenied(format!(
                    "{} cannot view assessments of barangay {}",
                    actor, assessment.barangay_id
                )))
            }
            _ => Ok(()),
        }
    }

    /// Internal notes are for assessors and administrators only
    fn redact_for(actor: &Actor, mut assessment: Assessment) -> Assessment {
        if actor.role == Role::BlguUser {
            for record in assessment.validations.values_mut() {
                *record = record.without_internal_note();
            }
        }
        assessment
    }

    // ------------------------------------------------------------------
    // BLGU operations
    // ------------------------------------------------------------------

    /// Set the compliance answer for a response
    pub async fn set_answer(
        &self,
        actor: &Actor,
        response_id: &ResponseId,
        answer: ComplianceAnswer,
    ) -> LifecycleResult<IndicatorResponse> {
        let mut uow = self.begin_for_response(response_id).await?;
        self.state_machine
            .set_answer(&mut uow.assessment, actor, response_id, answer, Utc::now())?;
        let assessment = self.commit(uow).await?;

        let response = assessment
            .response(response_id)
            .cloned()
            .ok_or_else(|| LifecycleError::ResponseNotFound(response_id.clone()))?;
        tracing::debug!(
            assessment_id = %assessment.id,
            response_id = %response_id,
            actor = %actor,
            answer = %answer,
            status = ?response.status(),
            "Answer recorded"
        );
        Ok(response)
    }

    /// Store a MOV through the gateway and attach it to the response.
    ///
    /// Permission and lock state are checked before the gateway is called.
    /// If the final write fails the stored blob is deleted again.
    pub async fn attach_evidence(
        &self,
        actor: &Actor,
        response_id: &ResponseId,
        upload: EvidenceUpload,
    ) -> LifecycleResult<MovFile> {
        let mut uow = self.begin_for_response(response_id).await?;
        self.state_machine
            .check_blgu_edit(&uow.assessment, actor, response_id)?;

        let file = self
            .store_upload(&uow.assessment.id, response_id, actor, upload)
            .await?;
        let now = file.uploaded_at;
        self.state_machine.attach_evidence(
            &mut uow.assessment,
            actor,
            response_id,
            file.clone(),
            now,
        )?;
        let assessment_id = uow.assessment.id.clone();
        if let Err(err) = self.commit(uow).await {
            self.discard_blob(&file.storage_path).await;
            return Err(err);
        }

        tracing::info!(
            assessment_id = %assessment_id,
            response_id = %response_id,
            file_id = %file.id,
            size = file.size,
            "Evidence attached"
        );
        Ok(file)
    }

    /// Delete a MOV from the gateway, then from the response. A gateway
    /// failure leaves the response as it was.
    pub async fn remove_evidence(
        &self,
        actor: &Actor,
        response_id: &ResponseId,
        file_id: &MovFileId,
    ) -> LifecycleResult<MovFile> {
        let mut uow = self.begin_for_response(response_id).await?;
        self.state_machine
            .check_blgu_edit(&uow.assessment, actor, response_id)?;

        let storage_path = uow
            .assessment
            .response(response_id)
            .and_then(|r| r.find_mov(file_id))
            .map(|f| f.storage_path.clone())
            .ok_or_else(|| LifecycleError::EvidenceNotFound {
                response_id: response_id.clone(),
                file_id: file_id.clone(),
            })?;
        self.gateway.delete(&storage_path).await?;

        let file = self.state_machine.remove_evidence(
            &mut uow.assessment,
            actor,
            response_id,
            file_id,
            Utc::now(),
        )?;
        let assessment = self.commit(uow).await?;

        tracing::info!(
            assessment_id = %assessment.id,
            response_id = %response_id,
            file_id = %file_id,
            "Evidence removed"
        );
        Ok(file)
    }

    /// Submit, or resubmit after rework
    pub async fn submit(&self, actor: &Actor, assessment_id: &AssessmentId) -> LifecycleResult<Assessment> {
        let mut uow = self.begin(assessment_id).await?;
        let from = uow.assessment.status;
        self.state_machine
            .submit(&mut uow.assessment, actor, Utc::now())?;
        let assessment = self.commit(uow).await?;

        tracing::info!(
            assessment_id = %assessment.id,
            barangay_id = %assessment.barangay_id,
            actor = %actor,
            from = %from,
            to = %assessment.status,
            rework_cycle = assessment.rework_count,
            "Assessment submitted"
        );
        self.publish(LifecycleEvent::Submitted {
            assessment_id: assessment.id.clone(),
            barangay_id: assessment.barangay_id.clone(),
            rework_cycle: assessment.rework_count,
            at: assessment.updated_at,
        });
        Ok(Self::redact_for(actor, assessment))
    }

    // ------------------------------------------------------------------
    // Assessor operations
    // ------------------------------------------------------------------

    /// Upsert the assessor's judgment for a response. Re-recording the same
    /// judgment writes nothing.
    pub async fn record_validation(
        &self,
        actor: &Actor,
        response_id: &ResponseId,
        status: Option<ValidationStatus>,
        public_comment: Option<String>,
        internal_note: Option<String>,
    ) -> LifecycleResult<ValidationRecord> {
        let mut uow = self.begin_for_response(response_id).await?;
        let outcome = self.state_machine.record_validation(
            &mut uow.assessment,
            actor,
            response_id,
            status,
            public_comment,
            internal_note,
            Utc::now(),
        )?;

        let assessment = if outcome == RecordOutcome::Unchanged {
            uow.assessment
        } else {
            self.commit(uow).await?
        };

        tracing::debug!(
            assessment_id = %assessment.id,
            response_id = %response_id,
            actor = %actor,
            outcome = ?outcome,
            "Validation recorded"
        );
        assessment
            .validation(response_id)
            .cloned()
            .ok_or_else(|| LifecycleError::ResponseNotFound(response_id.clone()))
    }

    /// Close the review: validated if every judgment is Pass, otherwise
    /// reopen the non-Pass responses for rework.
    pub async fn close_review(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<ReviewOutcome> {
        let mut uow = self.begin(assessment_id).await?;
        let outcome = self
            .state_machine
            .close_review(&mut uow.assessment, actor, Utc::now())?;
        let assessment = self.commit(uow).await?;

        tracing::info!(
            assessment_id = %assessment.id,
            actor = %actor,
            from = %AssessmentStatus::Submitted,
            to = %outcome.status,
            flagged = outcome.flagged.len(),
            "Review closed"
        );
        self.publish(LifecycleEvent::ReviewClosed {
            assessment_id: assessment.id.clone(),
            barangay_id: assessment.barangay_id.clone(),
            outcome: outcome.status,
            flagged: outcome.flagged.len(),
            at: assessment.updated_at,
        });
        Ok(outcome)
    }

    /// Supplementary evidence from the assessor, allowed in any status
    /// short of finalization
    pub async fn attach_assessor_evidence(
        &self,
        actor: &Actor,
        response_id: &ResponseId,
        upload: EvidenceUpload,
    ) -> LifecycleResult<MovFile> {
        let mut uow = self.begin_for_response(response_id).await?;
        self.state_machine
            .check_assessor_upload(&uow.assessment, actor, response_id)?;

        let file = self
            .store_upload(&uow.assessment.id, response_id, actor, upload)
            .await?;
        let now = file.uploaded_at;
        self.state_machine.attach_assessor_evidence(
            &mut uow.assessment,
            actor,
            response_id,
            file.clone(),
            now,
        )?;
        if let Err(err) = self.commit(uow).await {
            self.discard_blob(&file.storage_path).await;
            return Err(err);
        }

        tracing::info!(
            response_id = %response_id,
            file_id = %file.id,
            actor = %actor,
            "Assessor evidence attached"
        );
        Ok(file)
    }

    /// Items awaiting or under review in the active period
    pub async fn assessor_queue(&self, actor: &Actor) -> LifecycleResult<Vec<QueueItem>> {
        let area = match actor.role {
            Role::AreaAssessor => Some(actor.area_scope().ok_or_else(|| {
                LifecycleError::PermissionDenied(format!("{} has no governance area", actor))
            })?),
            Role::SystemAdmin => None,
            Role::BlguUser => {
                return Err(LifecycleError::PermissionDenied(format!(
                    "{} has no review queue",
                    actor
                )))
            }
        };

        let Some(period) = self.store.active_period().await? else {
            return Ok(Vec::new());
        };

        let mut items = Vec::new();
        for assessment in self.store.list_assessments(&period.id).await? {
            if !matches!(
                assessment.status,
                AssessmentStatus::Submitted
                    | AssessmentStatus::NeedsRework
                    | AssessmentStatus::Validated
            ) {
                continue;
            }

            let in_scope: Vec<&IndicatorResponse> = assessment
                .responses
                .iter()
                .filter(|r| area.as_ref().map_or(true, |a| &r.governance_area_id == a))
                .collect();
            if in_scope.is_empty() {
                continue;
            }
            let reviewed = in_scope
                .iter()
                .filter(|r| assessment.validation(&r.id).and_then(|v| v.status()).is_some())
                .count();

            let barangay_name = self
                .store
                .get_barangay(&assessment.barangay_id)
                .await?
                .map(|b| b.name)
                .unwrap_or_else(|| assessment.barangay_id.to_string());

            items.push(QueueItem {
                assessment_id: assessment.id.clone(),
                barangay_id: assessment.barangay_id.clone(),
                barangay_name,
                status: assessment.status,
                submitted_at: assessment.submitted_at,
                rework_count: assessment.rework_count,
                responses_in_scope: in_scope.len(),
                reviewed_in_scope: reviewed,
            });
        }

        items.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Administrator operations
    // ------------------------------------------------------------------

    /// Finalize a validated assessment and record its seal determination
    pub async fn finalize(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<SealDetermination> {
        let mut uow = self.begin(assessment_id).await?;
        let seal = self
            .state_machine
            .finalize(&mut uow.assessment, actor, Utc::now())?;
        let assessment = self.commit(uow).await?;

        tracing::info!(
            assessment_id = %assessment.id,
            barangay_id = %assessment.barangay_id,
            actor = %actor,
            compliance = ?seal.compliance,
            "Assessment finalized"
        );
        self.publish(LifecycleEvent::Finalized {
            assessment_id: assessment.id.clone(),
            barangay_id: assessment.barangay_id.clone(),
            compliance: seal.compliance,
            at: assessment.updated_at,
        });
        Ok(seal)
    }

    /// Create an upcoming period. Years must be unique across periods.
    pub async fn create_period(
        &self,
        actor: &Actor,
        performance_year: i32,
        assessment_year: i32,
    ) -> LifecycleResult<AssessmentPeriod> {
        Self::ensure_admin(actor, "create periods")?;
        if assessment_year < performance_year {
            return Err(LifecycleError::InvalidInput(format!(
                "assessment year {} precedes performance year {}",
                assessment_year, performance_year
            )));
        }

        let _gate = self.period_gate.write().await;
        let clash = self.store.list_periods().await?.into_iter().any(|p| {
            p.performance_year == performance_year && p.assessment_year == assessment_year
        });
        if clash {
            return Err(LifecycleError::Conflict(format!(
                "period {}/{} already exists",
                performance_year, assessment_year
            )));
        }

        let period = AssessmentPeriod::new(performance_year, assessment_year);
        self.store.put_period(period.clone()).await?;
        tracing::info!(period_id = %period.id, label = %period.label(), "Created period");
        Ok(period)
    }

    /// Activate an upcoming period: archive the current one and create an
    /// assessment for every registered barangay, as one batch.
    pub async fn activate_period(
        &self,
        actor: &Actor,
        period_id: &PeriodId,
    ) -> LifecycleResult<ActivationReport> {
        Self::ensure_admin(actor, "activate periods")?;
        let _gate = self.period_gate.write().await;

        let mut period = self.get_period(period_id).await?;
        match period.status {
            PeriodStatus::Upcoming => {}
            PeriodStatus::Active => {
                return Err(LifecycleError::InvalidTransition(format!(
                    "period {} is already active",
                    period.id
                )))
            }
            PeriodStatus::Archived => {
                return Err(LifecycleError::PeriodArchived {
                    period_id: period.id,
                })
            }
        }

        let now = Utc::now();
        let mut batch = StoreBatch::new();
        let previous = self.store.active_period().await?;
        let archived = previous.as_ref().map(|p| p.id.clone());
        if let Some(mut previous) = previous {
            previous.status = PeriodStatus::Archived;
            previous.updated_at = now;
            batch = batch.put_period(previous);
        }

        let mut created = 0;
        for barangay in self.store.list_barangays().await? {
            if self
                .store
                .find_assessment(&barangay.id, &period.id)
                .await?
                .is_none()
            {
                batch = batch.put_assessment(Assessment::create(
                    barangay.id,
                    period.id.clone(),
                    &self.catalogue,
                    actor,
                ));
                created += 1;
            }
        }

        period.status = PeriodStatus::Active;
        period.updated_at = now;
        batch = batch.put_period(period.clone());
        self.store.apply(batch).await?;

        tracing::info!(
            period_id = %period.id,
            archived = ?archived,
            assessments_created = created,
            "Activated period"
        );
        self.publish(LifecycleEvent::PeriodActivated {
            period_id: period.id.clone(),
            archived: archived.clone(),
            assessments_created: created,
            at: now,
        });
        Ok(ActivationReport {
            period,
            archived,
            assessments_created: created,
        })
    }

    /// Archive a period. Its assessments become read-only.
    pub async fn archive_period(
        &self,
        actor: &Actor,
        period_id: &PeriodId,
    ) -> LifecycleResult<AssessmentPeriod> {
        Self::ensure_admin(actor, "archive periods")?;
        let _gate = self.period_gate.write().await;

        let mut period = self.get_period(period_id).await?;
        if period.is_archived() {
            return Err(LifecycleError::PeriodArchived {
                period_id: period.id,
            });
        }
        period.status = PeriodStatus::Archived;
        period.updated_at = Utc::now();
        self.store.put_period(period.clone()).await?;

        tracing::info!(period_id = %period.id, "Archived period");
        self.publish(LifecycleEvent::PeriodArchived {
            period_id: period.id.clone(),
            at: period.updated_at,
        });
        Ok(period)
    }

    /// Set the informational deadlines shown to BLGU users
    pub async fn set_deadlines(
        &self,
        actor: &Actor,
        period_id: &PeriodId,
        deadlines: PeriodDeadlines,
    ) -> LifecycleResult<AssessmentPeriod> {
        Self::ensure_admin(actor, "set deadlines")?;
        if deadlines.rework_completion_deadline < deadlines.blgu_submission_deadline {
            return Err(LifecycleError::InvalidInput(
                "rework completion deadline precedes the submission deadline".into(),
            ));
        }
        let _gate = self.period_gate.write().await;

        let mut period = self.get_period(period_id).await?;
        if period.is_archived() {
            return Err(LifecycleError::PeriodArchived {
                period_id: period.id,
            });
        }
        period.deadlines = Some(deadlines);
        period.updated_at = Utc::now();
        self.store.put_period(period.clone()).await?;
        tracing::info!(period_id = %period.id, "Updated period deadlines");
        Ok(period)
    }

    /// Register a barangay. If a period is active, its assessment is
    /// created right away.
    pub async fn register_barangay(
        &self,
        actor: &Actor,
        barangay: Barangay,
    ) -> LifecycleResult<Barangay> {
        Self::ensure_admin(actor, "register barangays")?;
        if barangay.name.trim().is_empty() {
            return Err(LifecycleError::InvalidInput("barangay name is empty".into()));
        }
        let _gate = self.period_gate.write().await;

        // Barangay and its active-period assessment land together or not at all
        let mut batch = StoreBatch::new().insert_barangay(barangay.clone());
        if let Some(period) = self.store.active_period().await? {
            let assessment =
                Assessment::create(barangay.id.clone(), period.id, &self.catalogue, actor);
            tracing::debug!(assessment_id = %assessment.id, "Created assessment for new barangay");
            batch = batch.put_assessment(assessment);
        }
        self.store.apply(batch).await?;

        tracing::info!(barangay_id = %barangay.id, name = %barangay.name, "Registered barangay");
        Ok(barangay)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    async fn get_period(&self, id: &PeriodId) -> LifecycleResult<AssessmentPeriod> {
        self.store
            .get_period(id)
            .await?
            .ok_or_else(|| LifecycleError::PeriodNotFound(id.to_string()))
    }

    pub async fn period(&self, id: &PeriodId) -> LifecycleResult<AssessmentPeriod> {
        self.get_period(id).await
    }

    pub async fn list_periods(&self) -> LifecycleResult<Vec<AssessmentPeriod>> {
        Ok(self.store.list_periods().await?)
    }

    pub async fn active_period(&self) -> LifecycleResult<Option<AssessmentPeriod>> {
        Ok(self.store.active_period().await?)
    }

    pub async fn list_barangays(&self) -> LifecycleResult<Vec<Barangay>> {
        Ok(self.store.list_barangays().await?)
    }

    /// Status of every assessment in a period, for dashboards
    pub async fn assessment_statuses(
        &self,
        period_id: &PeriodId,
    ) -> LifecycleResult<Vec<AssessmentStatus>> {
        Ok(self
            .store
            .list_assessments(period_id)
            .await?
            .into_iter()
            .map(|a| a.status)
            .collect())
    }

    /// Read an assessment as the actor may see it
    pub async fn assessment(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<Assessment> {
        let assessment = self.load(assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(Self::redact_for(actor, assessment))
    }

    /// The barangay's assessment in the active period
    pub async fn current_assessment(
        &self,
        actor: &Actor,
        barangay_id: &BarangayId,
    ) -> LifecycleResult<Assessment> {
        let period = self
            .store
            .active_period()
            .await?
            .ok_or_else(|| LifecycleError::PeriodNotFound("no active period".into()))?;
        let assessment = self
            .store
            .find_assessment(barangay_id, &period.id)
            .await?
            .ok_or_else(|| {
                LifecycleError::AssessmentNotFound(format!(
                    "barangay {} in period {}",
                    barangay_id, period.id
                ))
            })?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(Self::redact_for(actor, assessment))
    }

    pub async fn validation_summary(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<ValidationSummary> {
        let assessment = self.load(assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(compute_validation(&assessment))
    }

    pub async fn progress(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<ProgressMetrics> {
        let assessment = self.load(assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(progress(&assessment))
    }

    /// The recorded seal if finalized, otherwise a preview from the current
    /// judgments
    pub async fn seal(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<SealDetermination> {
        let assessment = self.load(assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(match assessment.seal {
            Some(ref seal) => seal.clone(),
            None => classify(&assessment, self.policy(), Utc::now()),
        })
    }

    /// Responses still waiting for a verdict
    pub async fn unreviewed(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<Vec<ResponseId>> {
        let assessment = self.load(assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(unreviewed_responses(&assessment))
    }

    pub async fn history(
        &self,
        actor: &Actor,
        assessment_id: &AssessmentId,
    ) -> LifecycleResult<Vec<AuditEntry>> {
        let assessment = self.load(assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;
        Ok(assessment.history)
    }

    /// Download a BLGU or assessor evidence file
    pub async fn fetch_evidence(
        &self,
        actor: &Actor,
        response_id: &ResponseId,
        file_id: &MovFileId,
    ) -> LifecycleResult<(MovFile, Bytes)> {
        let assessment_id = self.assessment_id_of(response_id).await?;
        let assessment = self.load(&assessment_id).await?;
        Self::ensure_can_read(actor, &assessment)?;

        let file = assessment
            .response(response_id)
            .and_then(|r| {
                r.mov_files
                    .iter()
                    .chain(r.assessor_files.iter())
                    .find(|f| &f.id == file_id)
            })
            .cloned()
            .ok_or_else(|| LifecycleError::EvidenceNotFound {
                response_id: response_id.clone(),
                file_id: file_id.clone(),
            })?;

        let bytes = self
            .gateway
            .fetch(&file.storage_path)
            .await
            .map_err(|err| match err {
                GatewayError::NotFound(_) => LifecycleError::EvidenceNotFound {
                    response_id: response_id.clone(),
                    file_id: file_id.clone(),
                },
                other => other.into(),
            })?;
        Ok((file, bytes))
    }

    // ------------------------------------------------------------------
    // Evidence helpers
    // ------------------------------------------------------------------

    async fn store_upload(
        &self,
        assessment_id: &AssessmentId,
        response_id: &ResponseId,
        actor: &Actor,
        upload: EvidenceUpload,
    ) -> LifecycleResult<MovFile> {
        let filename = upload.filename.trim().to_string();
        if filename.is_empty() {
            return Err(LifecycleError::InvalidEvidence("filename is empty".into()));
        }

        let metadata = EvidenceMetadata {
            assessment_id: assessment_id.clone(),
            response_id: response_id.clone(),
            file_id: MovFileId::generate(),
            filename: filename.clone(),
            content_type: upload.content_type.clone(),
            size: upload.bytes.len() as u64,
            uploaded_by: actor.user_id.clone(),
        };
        let storage_path = self.gateway.store(upload.bytes, &metadata).await?;

        Ok(MovFile {
            id: metadata.file_id,
            filename,
            size: metadata.size,
            content_type: metadata.content_type,
            storage_path,
            uploaded_at: Utc::now(),
            uploaded_by: actor.user_id.clone(),
        })
    }

    async fn discard_blob(&self, storage_path: &str) {
        if let Err(err) = self.gateway.delete(storage_path).await {
            tracing::warn!(storage_path, error = %err, "Failed to discard orphaned evidence");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryEvidenceGateway;
    use crate::store::InMemoryStore;

    struct Fixture {
        engine: LifecycleEngine,
        gateway: Arc<InMemoryEvidenceGateway>,
        admin: Actor,
        barangay: Barangay,
    }

    async fn fixture() -> Fixture {
        let gateway = Arc::new(InMemoryEvidenceGateway::new());
        let engine = LifecycleEngine::new(
            Arc::new(InMemoryStore::new()),
            gateway.clone(),
            IndicatorCatalogue::builtin(),
            EnginePolicy::default(),
        );
        let admin = Actor::admin("root");
        let barangay = engine
            .register_barangay(&admin, Barangay::new("San Isidro").with_id(BarangayId::new("b-1")))
            .await
            .unwrap();
        let period = engine.create_period(&admin, 2023, 2024).await.unwrap();
        engine.activate_period(&admin, &period.id).await.unwrap();
        Fixture {
            engine,
            gateway,
            admin,
            barangay,
        }
    }

    #[tokio::test]
    async fn test_activation_creates_assessments() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();
        assert_eq!(a.status, AssessmentStatus::InProgress);
        assert_eq!(a.responses.len(), 7);
    }

    #[tokio::test]
    async fn test_register_barangay_during_active_period() {
        let f = fixture().await;
        let period = f.engine.active_period().await.unwrap().unwrap();
        let added = f
            .engine
            .register_barangay(&f.admin, Barangay::new("Poblacion").with_id(BarangayId::new("b-2")))
            .await
            .unwrap();
        let blgu = Actor::blgu("u2", &added.id);
        let a = f.engine.current_assessment(&blgu, &added.id).await.unwrap();
        assert_eq!(a.period_id, period.id);

        let err = f
            .engine
            .register_barangay(&f.admin, Barangay::new("Again").with_id(BarangayId::new("b-2")))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)));
        assert_eq!(f.engine.assessment_statuses(&period.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_attach_failure_leaves_response_untouched() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();
        let rid = a.responses[0].id.clone();

        f.gateway.set_unavailable(true);
        let err = f
            .engine
            .attach_evidence(&blgu, &rid, EvidenceUpload::new("a.pdf", "application/pdf", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::EvidenceStorage(_)));

        let after = f.engine.assessment(&blgu, &a.id).await.unwrap();
        assert!(after.response(&rid).unwrap().mov_files.is_empty());
    }

    #[tokio::test]
    async fn test_locked_attach_never_reaches_gateway() {
        let f = fixture().await;
        let stranger = Actor::blgu("x", &BarangayId::new("elsewhere"));
        let a = f
            .engine
            .current_assessment(&f.admin, &f.barangay.id)
            .await
            .unwrap();
        let err = f
            .engine
            .attach_evidence(
                &stranger,
                &a.responses[0].id,
                EvidenceUpload::new("a.pdf", "application/pdf", "x"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::PermissionDenied(_)));
        assert!(f.gateway.is_empty());
    }

    #[tokio::test]
    async fn test_remove_evidence_deletes_blob() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();
        let rid = a.responses[0].id.clone();

        let file = f
            .engine
            .attach_evidence(&blgu, &rid, EvidenceUpload::new("a.pdf", "application/pdf", "pdf"))
            .await
            .unwrap();
        assert!(f.gateway.contains(&file.storage_path));

        let (meta, bytes) = f.engine.fetch_evidence(&blgu, &rid, &file.id).await.unwrap();
        assert_eq!(meta.id, file.id);
        assert_eq!(&bytes[..], b"pdf");

        f.engine.remove_evidence(&blgu, &rid, &file.id).await.unwrap();
        assert!(!f.gateway.contains(&file.storage_path));
    }

    #[tokio::test]
    async fn test_internal_notes_hidden_from_blgu() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();
        for r in &a.responses {
            f.engine.set_answer(&blgu, &r.id, ComplianceAnswer::No).await.unwrap();
        }
        f.engine.submit(&blgu, &a.id).await.unwrap();

        let r = &a.responses[0];
        let assessor = Actor::assessor("as", &r.governance_area_id);
        f.engine
            .record_validation(
                &assessor,
                &r.id,
                Some(ValidationStatus::Fail),
                Some("Unsigned".into()),
                Some("Spoke with the secretary".into()),
            )
            .await
            .unwrap();

        let seen_by_blgu = f.engine.assessment(&blgu, &a.id).await.unwrap();
        let record = seen_by_blgu.validation(&r.id).unwrap();
        assert_eq!(record.public_comment(), Some("Unsigned"));
        assert!(record.internal_note().is_none());

        let seen_by_assessor = f.engine.assessment(&assessor, &a.id).await.unwrap();
        assert!(seen_by_assessor.validation(&r.id).unwrap().internal_note().is_some());
    }

    #[tokio::test]
    async fn test_archived_period_refuses_mutation() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();

        let next = f.engine.create_period(&f.admin, 2024, 2025).await.unwrap();
        let report = f.engine.activate_period(&f.admin, &next.id).await.unwrap();
        assert_eq!(report.archived, Some(a.period_id.clone()));
        assert_eq!(report.assessments_created, 1);

        let err = f
            .engine
            .set_answer(&blgu, &a.responses[0].id, ComplianceAnswer::No)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::PeriodArchived { .. }));

        let active: Vec<_> = f
            .engine
            .list_periods()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_active())
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, next.id);
    }

    #[tokio::test]
    async fn test_period_admin_requires_admin() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        assert!(matches!(
            f.engine.create_period(&blgu, 2030, 2031).await,
            Err(LifecycleError::PermissionDenied(_))
        ));
        assert!(matches!(
            f.engine.create_period(&f.admin, 2023, 2024).await,
            Err(LifecycleError::Conflict(_))
        ));
        assert!(matches!(
            f.engine.create_period(&f.admin, 2025, 2024).await,
            Err(LifecycleError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_deadlines_must_be_ordered() {
        let f = fixture().await;
        let period = f.engine.active_period().await.unwrap().unwrap();
        let now = Utc::now();
        let err = f
            .engine
            .set_deadlines(
                &f.admin,
                &period.id,
                PeriodDeadlines {
                    blgu_submission_deadline: now,
                    rework_completion_deadline: now - chrono::Duration::days(1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidInput(_)));

        let updated = f
            .engine
            .set_deadlines(
                &f.admin,
                &period.id,
                PeriodDeadlines {
                    blgu_submission_deadline: now,
                    rework_completion_deadline: now + chrono::Duration::days(14),
                },
            )
            .await
            .unwrap();
        assert!(updated.deadlines.is_some());
    }

    #[tokio::test]
    async fn test_events_published() {
        let f = fixture().await;
        let mut events = f.engine.subscribe();
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();
        for r in &a.responses {
            f.engine.set_answer(&blgu, &r.id, ComplianceAnswer::NotApplicable).await.unwrap();
        }
        f.engine.submit(&blgu, &a.id).await.unwrap();

        match events.recv().await.unwrap() {
            LifecycleEvent::Submitted { assessment_id, rework_cycle, .. } => {
                assert_eq!(assessment_id, a.id);
                assert_eq!(rework_cycle, 0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_assessor_queue_scoped_to_area() {
        let f = fixture().await;
        let blgu = Actor::blgu("u", &f.barangay.id);
        let a = f.engine.current_assessment(&blgu, &f.barangay.id).await.unwrap();
        let area = GovernanceAreaId::new("financial-admin");
        let assessor = Actor::assessor("as", &area);

        assert!(f.engine.assessor_queue(&assessor).await.unwrap().is_empty());

        for r in &a.responses {
            f.engine.set_answer(&blgu, &r.id, ComplianceAnswer::No).await.unwrap();
        }
        f.engine.submit(&blgu, &a.id).await.unwrap();

        let queue = f.engine.assessor_queue(&assessor).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].barangay_name, "San Isidro");
        assert_eq!(queue[0].responses_in_scope, 2);
        assert_eq!(queue[0].reviewed_in_scope, 0);

        assert!(matches!(
            f.engine.assessor_queue(&blgu).await,
            Err(LifecycleError::PermissionDenied(_))
        ));
    }
}
