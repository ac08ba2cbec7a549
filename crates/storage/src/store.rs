//! Store traits

use async_trait::async_trait;

use crate::records::{AlertRecord, NewAlert, NewPrediction, PredictionRecord, StoreSummary};
use crate::StorageError;

/// One transactional scope. Dropping without [`UnitOfWork::commit`]
/// discards every staged write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Most recent predictions for a location, newest first. Sees writes
    /// staged earlier in this unit.
    async fn query_recent(
        &mut self,
        location: &str,
        n: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError>;

    async fn append_prediction(&mut self, prediction: NewPrediction) -> Result<i64, StorageError>;

    /// Fails with [`StorageError::IntegrityError`] unless the referenced
    /// prediction exists in the store or in this unit.
    async fn append_alert(&mut self, alert: NewAlert) -> Result<i64, StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Prediction and alert history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError>;

    async fn query_recent(
        &self,
        location: &str,
        n: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError>;

    /// All predictions, newest first
    async fn list_predictions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError>;

    /// All alerts, newest first
    async fn list_alerts(&self, offset: usize, limit: usize)
        -> Result<Vec<AlertRecord>, StorageError>;

    /// Newest unresolved alert for a location
    async fn find_unresolved_alert(
        &self,
        location: &str,
    ) -> Result<Option<AlertRecord>, StorageError>;

    /// Mark an alert resolved. Resolving twice is a no-op.
    async fn resolve(&self, alert_id: i64) -> Result<AlertRecord, StorageError>;

    async fn summary(&self) -> Result<StoreSummary, StorageError>;

    async fn append_prediction(&self, prediction: NewPrediction) -> Result<i64, StorageError> {
        let mut unit = self.begin().await?;
        let id = unit.append_prediction(prediction).await?;
        unit.commit().await?;
        Ok(id)
    }

    async fn append_alert(&self, alert: NewAlert) -> Result<i64, StorageError> {
        let mut unit = self.begin().await?;
        let id = unit.append_alert(alert).await?;
        unit.commit().await?;
        Ok(id)
    }

    fn name(&self) -> &str;
}
