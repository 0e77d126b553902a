//! In-memory storage implementation

use super::traits::*;
use async_trait::async_trait;
use sglgb_types::{
    Assessment, AssessmentId, AssessmentPeriod, Barangay, BarangayId, PeriodId, ResponseId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for development and testing.
///
/// Locks are always taken in the order periods, barangays, assessments,
/// response index.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    periods: Arc<RwLock<HashMap<PeriodId, AssessmentPeriod>>>,
    barangays: Arc<RwLock<HashMap<BarangayId, Barangay>>>,
    assessments: Arc<RwLock<HashMap<AssessmentId, Assessment>>>,
    response_index: Arc<RwLock<HashMap<ResponseId, AssessmentId>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(
    existing: &HashMap<AssessmentId, Assessment>,
    incoming: &[&Assessment],
) -> StoreResult<()> {
    let mut seen: HashMap<(&BarangayId, &PeriodId), &AssessmentId> = HashMap::new();
    for a in incoming {
        let key = (&a.barangay_id, &a.period_id);
        if let Some(other) = seen.insert(key, &a.id) {
            if other != &a.id {
                return Err(StoreError::Conflict(format!(
                    "barangay {} already has an assessment for period {}",
                    a.barangay_id, a.period_id
                )));
            }
        }
        let clash = existing.values().any(|e| {
            e.id != a.id && e.barangay_id == a.barangay_id && e.period_id == a.period_id
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "barangay {} already has an assessment for period {}",
                a.barangay_id, a.period_id
            )));
        }
    }
    Ok(())
}

fn index_responses(index: &mut HashMap<ResponseId, AssessmentId>, assessment: &Assessment) {
    for response in &assessment.responses {
        index.insert(response.id.clone(), assessment.id.clone());
    }
}

#[async_trait]
impl PeriodStore for InMemoryStore {
    async fn get_period(&self, id: &PeriodId) -> StoreResult<Option<AssessmentPeriod>> {
        let periods = self.periods.read().await;
        Ok(periods.get(id).cloned())
    }

    async fn list_periods(&self) -> StoreResult<Vec<AssessmentPeriod>> {
        let periods = self.periods.read().await;
        let mut list: Vec<_> = periods.values().cloned().collect();
        list.sort_by(|a, b| {
            b.assessment_year
                .cmp(&a.assessment_year)
                .then(b.performance_year.cmp(&a.performance_year))
        });
        Ok(list)
    }

    async fn put_period(&self, period: AssessmentPeriod) -> StoreResult<()> {
        let mut periods = self.periods.write().await;
        periods.insert(period.id.clone(), period);
        Ok(())
    }
}

#[async_trait]
impl BarangayStore for InMemoryStore {
    async fn get_barangay(&self, id: &BarangayId) -> StoreResult<Option<Barangay>> {
        let barangays = self.barangays.read().await;
        Ok(barangays.get(id).cloned())
    }

    async fn list_barangays(&self) -> StoreResult<Vec<Barangay>> {
        let barangays = self.barangays.read().await;
        let mut list: Vec<_> = barangays.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn insert_barangay(&self, barangay: Barangay) -> StoreResult<()> {
        let mut barangays = self.barangays.write().await;
        if barangays.contains_key(&barangay.id) {
            return Err(StoreError::Conflict(format!(
                "barangay {} already registered",
                barangay.id
            )));
        }
        barangays.insert(barangay.id.clone(), barangay);
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for InMemoryStore {
    async fn get_assessment(&self, id: &AssessmentId) -> StoreResult<Option<Assessment>> {
        let assessments = self.assessments.read().await;
        Ok(assessments.get(id).cloned())
    }

    async fn locate_response(&self, response_id: &ResponseId) -> StoreResult<Option<AssessmentId>> {
        let index = self.response_index.read().await;
        Ok(index.get(response_id).cloned())
    }

    async fn list_assessments(&self, period_id: &PeriodId) -> StoreResult<Vec<Assessment>> {
        let assessments = self.assessments.read().await;
        let mut list: Vec<_> = assessments
            .values()
            .filter(|a| &a.period_id == period_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.barangay_id.cmp(&b.barangay_id));
        Ok(list)
    }

    async fn find_assessment(
        &self,
        barangay_id: &BarangayId,
        period_id: &PeriodId,
    ) -> StoreResult<Option<Assessment>> {
        let assessments = self.assessments.read().await;
        Ok(assessments
            .values()
            .find(|a| &a.barangay_id == barangay_id && &a.period_id == period_id)
            .cloned())
    }

    async fn put_assessment(&self, assessment: Assessment) -> StoreResult<()> {
        let mut assessments = self.assessments.write().await;
        let mut index = self.response_index.write().await;
        check_unique(&assessments, &[&assessment])?;
        index_responses(&mut index, &assessment);
        assessments.insert(assessment.id.clone(), assessment);
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn apply(&self, batch: StoreBatch) -> StoreResult<()> {
        let mut periods = self.periods.write().await;
        let mut barangays = self.barangays.write().await;
        let mut assessments = self.assessments.write().await;
        let mut index = self.response_index.write().await;

        for (i, barangay) in batch.barangays.iter().enumerate() {
            let repeated = batch.barangays[..i].iter().any(|b| b.id == barangay.id);
            if repeated || barangays.contains_key(&barangay.id) {
                return Err(StoreError::Conflict(format!(
                    "barangay {} already registered",
                    barangay.id
                )));
            }
        }
        let incoming: Vec<&Assessment> = batch.assessments.iter().collect();
        check_unique(&assessments, &incoming)?;

        for period in batch.periods {
            periods.insert(period.id.clone(), period);
        }
        for barangay in batch.barangays {
            barangays.insert(barangay.id.clone(), barangay);
        }
        for assessment in batch.assessments {
            index_responses(&mut index, &assessment);
            assessments.insert(assessment.id.clone(), assessment);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sglgb_types::{Actor, IndicatorCatalogue};

    fn assessment(barangay: &str, period: &PeriodId) -> Assessment {
        Assessment::create(
            BarangayId::new(barangay),
            period.clone(),
            &IndicatorCatalogue::builtin(),
            &Actor::admin("root"),
        )
    }

    #[tokio::test]
    async fn test_put_indexes_responses() {
        let store = InMemoryStore::new();
        let period = PeriodId::new("p-1");
        let a = assessment("b-1", &period);
        store.put_assessment(a.clone()).await.unwrap();

        let located = store.locate_response(&a.responses[3].id).await.unwrap();
        assert_eq!(located, Some(a.id.clone()));
        assert_eq!(
            store
                .find_assessment(&BarangayId::new("b-1"), &period)
                .await
                .unwrap()
                .map(|found| found.id),
            Some(a.id)
        );
    }

    #[tokio::test]
    async fn test_one_assessment_per_barangay_and_period() {
        let store = InMemoryStore::new();
        let period = PeriodId::new("p-1");
        store.put_assessment(assessment("b-1", &period)).await.unwrap();

        let err = store
            .put_assessment(assessment("b-1", &period))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list_assessments(&period).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let period = AssessmentPeriod::new(2023, 2024);
        store
            .put_assessment(assessment("b-1", &period.id))
            .await
            .unwrap();

        let batch = StoreBatch::new()
            .put_period(period.clone())
            .put_assessment(assessment("b-2", &period.id))
            .put_assessment(assessment("b-1", &period.id));
        assert!(store.apply(batch).await.is_err());
        assert!(store.get_period(&period.id).await.unwrap().is_none());
        assert_eq!(store.list_assessments(&period.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_barangay_rolls_back_with_assessment() {
        let store = InMemoryStore::new();
        let period = AssessmentPeriod::new(2023, 2024);
        store
            .put_assessment(assessment("b-1", &period.id))
            .await
            .unwrap();

        let barangay = Barangay::new("Poblacion").with_id(BarangayId::new("b-1"));
        let batch = StoreBatch::new()
            .insert_barangay(barangay.clone())
            .put_assessment(assessment("b-1", &period.id));
        assert!(matches!(store.apply(batch).await, Err(StoreError::Conflict(_))));
        assert!(store.get_barangay(&barangay.id).await.unwrap().is_none());

        let batch = StoreBatch::new().insert_barangay(barangay.clone());
        store.apply(batch).await.unwrap();
        let batch = StoreBatch::new().insert_barangay(barangay.clone());
        assert!(matches!(store.apply(batch).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_active_period_default_method() {
        let store = InMemoryStore::new();
        let mut p = AssessmentPeriod::new(2023, 2024);
        store.put_period(p.clone()).await.unwrap();
        assert!(store.active_period().await.unwrap().is_none());

        p.status = sglgb_types::PeriodStatus::Active;
        store.put_period(p.clone()).await.unwrap();
        assert_eq!(store.active_period().await.unwrap().map(|a| a.id), Some(p.id));
    }

    #[tokio::test]
    async fn test_duplicate_barangay_conflicts() {
        let store = InMemoryStore::new();
        let b = Barangay::new("San Isidro");
        store.insert_barangay(b.clone()).await.unwrap();
        assert!(matches!(
            store.insert_barangay(b).await,
            Err(StoreError::Conflict(_))
        ));
    }
}
