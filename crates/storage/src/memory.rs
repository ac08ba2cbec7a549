//! In-Memory Store

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::records::{AlertRecord, NewAlert, NewPrediction, PredictionRecord, StoreSummary};
use crate::store::{HistoryStore, UnitOfWork};
use crate::StorageError;

/// Default retention for the in-memory store
pub const DEFAULT_MAX_PREDICTION_RECORDS: usize = 10_000;

#[derive(Debug)]
struct MemoryState {
    predictions: Vec<PredictionRecord>,
    alerts: Vec<AlertRecord>,
    next_prediction_id: i64,
    next_alert_id: i64,
    /// Max prediction records
    max_prediction_records: usize,
}

impl MemoryState {
    fn new(max_prediction_records: usize) -> Self {
        Self {
            predictions: Vec::with_capacity(1000),
            alerts: Vec::new(),
            next_prediction_id: 1,
            next_alert_id: 1,
            max_prediction_records: max_prediction_records.max(1),
        }
    }

    /// Enforce retention. Oldest predictions go first, taking their
    /// alerts with them.
    fn evict(&mut self) {
        let excess = self
            .predictions
            .len()
            .saturating_sub(self.max_prediction_records);
        if excess == 0 {
            return;
        }
        self.predictions.drain(..excess);
        if let Some(oldest) = self.predictions.first().map(|p| p.id) {
            self.alerts.retain(|a| a.prediction_id >= oldest);
        }
        debug!("Evicted {} predictions past retention", excess);
    }
}

/// Process-local history. Units of work hold the state lock until they
/// commit or drop, so submissions are serialised.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_MAX_PREDICTION_RECORDS)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_prediction_records` predictions
    pub fn with_retention(max_prediction_records: usize) -> Self {
        info!(
            "Creating in-memory history store (retention {} predictions)",
            max_prediction_records
        );
        Self {
            state: Arc::new(Mutex::new(MemoryState::new(max_prediction_records))),
        }
    }

    pub async fn prediction_count(&self) -> usize {
        self.state.lock().await.predictions.len()
    }

    pub async fn alert_count(&self) -> usize {
        self.state.lock().await.alerts.len()
    }
}

fn newest_first<T: Clone>(records: &[T], offset: usize, limit: usize) -> Vec<T> {
    records.iter().rev().skip(offset).take(limit).cloned().collect()
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

struct MemoryUnit {
    state: OwnedMutexGuard<MemoryState>,
    staged_predictions: Vec<PredictionRecord>,
    staged_alerts: Vec<AlertRecord>,
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn query_recent(
        &mut self,
        location: &str,
        n: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        Ok(self
            .state
            .predictions
            .iter()
            .chain(self.staged_predictions.iter())
            .rev()
            .filter(|p| p.location == location)
            .take(n)
            .cloned()
            .collect())
    }

    async fn append_prediction(&mut self, prediction: NewPrediction) -> Result<i64, StorageError> {
        let id = self.state.next_prediction_id + self.staged_predictions.len() as i64;
        self.staged_predictions.push(prediction.with_id(id));
        Ok(id)
    }

    async fn append_alert(&mut self, alert: NewAlert) -> Result<i64, StorageError> {
        let exists = self
            .state
            .predictions
            .iter()
            .chain(self.staged_predictions.iter())
            .any(|p| p.id == alert.prediction_id);
        if !exists {
            return Err(StorageError::IntegrityError(format!(
                "alert references missing prediction {}",
                alert.prediction_id
            )));
        }

        let id = self.state.next_alert_id + self.staged_alerts.len() as i64;
        self.staged_alerts.push(alert.with_id(id));
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryUnit {
            mut state,
            staged_predictions,
            staged_alerts,
        } = *self;

        state.next_prediction_id += staged_predictions.len() as i64;
        state.next_alert_id += staged_alerts.len() as i64;
        debug!(
            "Committing {} predictions, {} alerts",
            staged_predictions.len(),
            staged_alerts.len()
        );
        state.predictions.extend(staged_predictions);
        state.alerts.extend(staged_alerts);
        state.evict();
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryUnit {
            state,
            staged_predictions: Vec::new(),
            staged_alerts: Vec::new(),
        }))
    }

    async fn query_recent(
        &self,
        location: &str,
        n: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .predictions
            .iter()
            .rev()
            .filter(|p| p.location == location)
            .take(n)
            .cloned()
            .collect())
    }

    async fn list_predictions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        Ok(newest_first(&self.state.lock().await.predictions, offset, limit))
    }

    async fn list_alerts(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, StorageError> {
        Ok(newest_first(&self.state.lock().await.alerts, offset, limit))
    }

    async fn find_unresolved_alert(
        &self,
        location: &str,
    ) -> Result<Option<AlertRecord>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .alerts
            .iter()
            .rev()
            .find(|a| a.location == location && !a.resolved)
            .cloned())
    }

    async fn resolve(&self, alert_id: i64) -> Result<AlertRecord, StorageError> {
        let mut state = self.state.lock().await;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| StorageError::NotFound(format!("alert {}", alert_id)))?;
        alert.resolved = true;
        Ok(alert.clone())
    }

    async fn summary(&self) -> Result<StoreSummary, StorageError> {
        let state = self.state.lock().await;
        Ok(StoreSummary {
            total_predictions: state.predictions.len() as u64,
            risk_distribution: count_by(state.predictions.iter().map(|p| p.risk_level.as_str())),
            trend_distribution: count_by(state.predictions.iter().map(|p| p.trend.as_str())),
            severity_distribution: count_by(state.predictions.iter().map(|p| p.severity.as_str())),
            total_alerts: state.alerts.len() as u64,
            active_alerts: state.alerts.iter().filter(|a| !a.resolved).count() as u64,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_store_contract() {
        testing::exercise_store(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_rollback_on_drop() {
        testing::exercise_rollback(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_alert_requires_prediction() {
        testing::exercise_integrity(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_resolve_waits_for_open_unit() {
        testing::exercise_resolve_during_unit(MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_retention_limit() {
        let store = MemoryStore::with_retention(3);
        let mut ids = Vec::new();
        for i in 0..5 {
            let risk = if i == 0 { "high" } else { "low" };
            let id = store
                .append_prediction(testing::prediction("Ward 6", risk))
                .await
                .unwrap();
            ids.push(id);
            if i == 0 || i == 4 {
                store.append_alert(testing::alert(id, "Ward 6")).await.unwrap();
            }
        }

        assert_eq!(store.prediction_count().await, 3);
        let kept: Vec<i64> = store
            .list_predictions(0, 10)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(kept, vec![ids[4], ids[3], ids[2]]);

        // The alert on the evicted first prediction went with it
        let alerts = store.list_alerts(0, 10).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].prediction_id, ids[4]);

        // Ids keep counting past evictions
        let next = store
            .append_prediction(testing::prediction("Ward 6", "low"))
            .await
            .unwrap();
        assert_eq!(next, ids[4] + 1);
    }

    #[tokio::test]
    async fn test_ids_continue_after_rollback() {
        let store = MemoryStore::new();
        {
            let mut unit = store.begin().await.unwrap();
            unit.append_prediction(testing::prediction("A", "low")).await.unwrap();
        }
        let id = store
            .append_prediction(testing::prediction("A", "low"))
            .await
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.prediction_count().await, 1);
        assert_eq!(store.alert_count().await, 0);
    }
}
