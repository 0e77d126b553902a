//! Storage trait definitions

use async_trait::async_trait;
use sglgb_types::{
    Assessment, AssessmentId, AssessmentPeriod, Barangay, BarangayId, LifecycleError, PeriodId,
    ResponseId,
};

/// Storage failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => LifecycleError::Conflict(msg),
            other => LifecycleError::Store(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for assessment periods
#[async_trait]
pub trait PeriodStore: Send + Sync {
    async fn get_period(&self, id: &PeriodId) -> StoreResult<Option<AssessmentPeriod>>;

    /// All periods, newest assessment year first
    async fn list_periods(&self) -> StoreResult<Vec<AssessmentPeriod>>;

    /// Create or update a period
    async fn put_period(&self, period: AssessmentPeriod) -> StoreResult<()>;

    /// The single active period, if any
    async fn active_period(&self) -> StoreResult<Option<AssessmentPeriod>> {
        Ok(self
            .list_periods()
            .await?
            .into_iter()
            .find(|p| p.is_active()))
    }
}

/// Storage for registered barangays
#[async_trait]
pub trait BarangayStore: Send + Sync {
    async fn get_barangay(&self, id: &BarangayId) -> StoreResult<Option<Barangay>>;

    /// All barangays, ordered by name
    async fn list_barangays(&self) -> StoreResult<Vec<Barangay>>;

    /// Insert a barangay. Fails with `Conflict` if the id is taken.
    async fn insert_barangay(&self, barangay: Barangay) -> StoreResult<()>;
}

/// Storage for assessment aggregates
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn get_assessment(&self, id: &AssessmentId) -> StoreResult<Option<Assessment>>;

    /// The assessment owning a response
    async fn locate_response(&self, response_id: &ResponseId) -> StoreResult<Option<AssessmentId>>;

    async fn list_assessments(&self, period_id: &PeriodId) -> StoreResult<Vec<Assessment>>;

    async fn find_assessment(
        &self,
        barangay_id: &BarangayId,
        period_id: &PeriodId,
    ) -> StoreResult<Option<Assessment>>;

    /// Create or replace an assessment as one write. Fails with `Conflict`
    /// if a different assessment already exists for the same barangay and
    /// period.
    async fn put_assessment(&self, assessment: Assessment) -> StoreResult<()>;
}

/// A set of writes applied all-or-nothing
#[derive(Clone, Debug, Default)]
pub struct StoreBatch {
    pub periods: Vec<AssessmentPeriod>,
    /// New barangays. Each id must be unused.
    pub barangays: Vec<Barangay>,
    pub assessments: Vec<Assessment>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_period(mut self, period: AssessmentPeriod) -> Self {
        self.periods.push(period);
        self
    }

    pub fn insert_barangay(mut self, barangay: Barangay) -> Self {
        self.barangays.push(barangay);
        self
    }

    pub fn put_assessment(mut self, assessment: Assessment) -> Self {
        self.assessments.push(assessment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() && self.barangays.is_empty() && self.assessments.is_empty()
    }
}

/// Combined storage trait
#[async_trait]
pub trait Store: PeriodStore + BarangayStore + AssessmentStore + Send + Sync {
    /// Apply every write in the batch, or none of them
    async fn apply(&self, batch: StoreBatch) -> StoreResult<()>;
}
