//! Shared checks run against every store implementation

use crate::records::{NewAlert, NewPrediction};
use crate::store::HistoryStore;
use crate::StorageError;

pub(crate) fn prediction(location: &str, risk_level: &str) -> NewPrediction {
    NewPrediction {
        location: location.to_string(),
        rainfall: 120.0,
        ph_level: 6.8,
        contamination: 0.3,
        cases_count: 12,
        risk_level: risk_level.to_string(),
        confidence: 0.8,
        method: "hybrid_ensemble".to_string(),
        reason: None,
        severity: "INFO".to_string(),
        trend: "STABLE".to_string(),
        recommendation: "INFO: Conditions within expected range".to_string(),
        created_at_ms: 1_700_000_000_000,
    }
}

pub(crate) fn alert(prediction_id: i64, location: &str) -> NewAlert {
    NewAlert {
        prediction_id,
        location: location.to_string(),
        severity: "CRITICAL".to_string(),
        message: format!("HIGH RISK detected at {}!", location),
        created_at_ms: 1_700_000_000_500,
    }
}

pub(crate) async fn exercise_store(store: &dyn HistoryStore) {
    let mut unit = store.begin().await.unwrap();
    assert!(unit.query_recent("Ward 1", 3).await.unwrap().is_empty());
    let first = unit.append_prediction(prediction("Ward 1", "low")).await.unwrap();
    let second = unit.append_prediction(prediction("Ward 2", "medium")).await.unwrap();
    let third = unit.append_prediction(prediction("Ward 1", "high")).await.unwrap();
    let alert_id = unit.append_alert(alert(third, "Ward 1")).await.unwrap();

    // Staged writes are visible inside the unit
    let staged = unit.query_recent("Ward 1", 3).await.unwrap();
    assert_eq!(staged.iter().map(|p| p.id).collect::<Vec<_>>(), vec![third, first]);
    unit.commit().await.unwrap();

    let recent = store.query_recent("Ward 1", 1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].risk_level, "high");

    let all = store.list_predictions(0, 10).await.unwrap();
    assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![third, second, first]);
    assert_eq!(store.list_predictions(1, 1).await.unwrap()[0].id, second);
    assert_eq!(all[2], prediction("Ward 1", "low").with_id(first));

    let unresolved = store.find_unresolved_alert("Ward 1").await.unwrap().unwrap();
    assert_eq!(unresolved.id, alert_id);
    assert_eq!(unresolved.prediction_id, third);
    assert!(store.find_unresolved_alert("Ward 2").await.unwrap().is_none());

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_predictions, 3);
    assert_eq!(summary.risk_distribution.get("high"), Some(&1));
    assert_eq!(summary.trend_distribution.get("STABLE"), Some(&3));
    assert_eq!(summary.active_alerts, 1);

    let resolved = store.resolve(alert_id).await.unwrap();
    assert!(resolved.resolved);
    // Idempotent
    assert!(store.resolve(alert_id).await.unwrap().resolved);
    assert!(store.find_unresolved_alert("Ward 1").await.unwrap().is_none());

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.total_alerts, 1);
    assert_eq!(summary.active_alerts, 0);

    assert!(matches!(
        store.resolve(9_999).await,
        Err(StorageError::NotFound(_))
    ));
    assert_eq!(store.list_alerts(0, 10).await.unwrap().len(), 1);
}

pub(crate) async fn exercise_rollback(store: &dyn HistoryStore) {
    {
        let mut unit = store.begin().await.unwrap();
        let id = unit.append_prediction(prediction("Ward 9", "high")).await.unwrap();
        unit.append_alert(alert(id, "Ward 9")).await.unwrap();
    }
    assert!(store.query_recent("Ward 9", 3).await.unwrap().is_empty());
    assert!(store.list_alerts(0, 10).await.unwrap().is_empty());
}

pub(crate) async fn exercise_integrity(store: &dyn HistoryStore) {
    let result = store.append_alert(alert(42, "Nowhere")).await;
    assert!(matches!(result, Err(StorageError::IntegrityError(_))));
    assert!(store.list_alerts(0, 10).await.unwrap().is_empty());
}

/// An alert resolved from another task while a submission's unit is open
/// must not make the submission fail.
pub(crate) async fn exercise_resolve_during_unit<S>(store: S)
where
    S: HistoryStore + Clone + 'static,
{
    let seed = store.append_prediction(prediction("Ward 5", "high")).await.unwrap();
    let alert_id = store.append_alert(alert(seed, "Ward 5")).await.unwrap();

    let mut unit = store.begin().await.unwrap();
    assert_eq!(unit.query_recent("Ward 5", 3).await.unwrap().len(), 1);

    let resolver = store.clone();
    let resolving = tokio::spawn(async move { resolver.resolve(alert_id).await });
    tokio::task::yield_now().await;

    let id = unit.append_prediction(prediction("Ward 5", "medium")).await.unwrap();
    unit.commit().await.unwrap();

    let resolved = resolving.await.unwrap().unwrap();
    assert!(resolved.resolved);
    assert_eq!(store.query_recent("Ward 5", 1).await.unwrap()[0].id, id);
    assert!(store.find_unresolved_alert("Ward 5").await.unwrap().is_none());
}
