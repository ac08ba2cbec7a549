//! SQLite Store
//!
//! sqlx-backed history. Each unit of work is a real transaction, and a
//! foreign key ties every alert to its prediction.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::records::{AlertRecord, NewAlert, NewPrediction, PredictionRecord, StoreSummary};
use crate::store::{HistoryStore, UnitOfWork};
use crate::StorageError;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        location TEXT NOT NULL,
        rainfall REAL NOT NULL,
        ph_level REAL NOT NULL,
        contamination REAL NOT NULL,
        cases_count INTEGER NOT NULL,
        risk_level TEXT NOT NULL,
        confidence REAL NOT NULL,
        method TEXT NOT NULL,
        reason TEXT,
        severity TEXT NOT NULL,
        trend TEXT NOT NULL,
        recommendation TEXT NOT NULL,
        created_at_ms INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_predictions_location ON predictions (location, id)",
    r#"
    CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        prediction_id INTEGER NOT NULL UNIQUE REFERENCES predictions (id),
        location TEXT NOT NULL,
        severity TEXT NOT NULL,
        message TEXT NOT NULL,
        resolved INTEGER NOT NULL DEFAULT 0,
        created_at_ms INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_alerts_location ON alerts (location, resolved)",
];

const RECENT_FOR_LOCATION: &str =
    "SELECT * FROM predictions WHERE location = ? ORDER BY id DESC LIMIT ?";

const INSERT_PREDICTION: &str = r#"
    INSERT INTO predictions (location, rainfall, ph_level, contamination, cases_count,
        risk_level, confidence, method, reason, severity, trend, recommendation, created_at_ms)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#;

const INSERT_ALERT: &str = r#"
    INSERT INTO alerts (prediction_id, location, severity, message, created_at_ms)
    VALUES (?, ?, ?, ?, ?)
    "#;

/// SQLite-backed history
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    /// One writer at a time; a deferred transaction that reads then
    /// writes would otherwise fail with SQLITE_BUSY under contention.
    writer: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Open (creating if needed) a database and apply the schema.
    /// `sqlite::memory:` gives a private in-memory database.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        info!("Opened SQLite history store at {}", url);
        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn distribution(
    pool: &SqlitePool,
    column: &str,
) -> Result<std::collections::BTreeMap<String, u64>, StorageError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
        "SELECT {column}, COUNT(*) FROM predictions GROUP BY {column}"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(k, v)| (k, v as u64)).collect())
}

struct SqliteUnit {
    tx: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl UnitOfWork for SqliteUnit {
    async fn query_recent(
        &mut self,
        location: &str,
        n: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        Ok(sqlx::query_as::<_, PredictionRecord>(RECENT_FOR_LOCATION)
            .bind(location)
            .bind(n as i64)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn append_prediction(&mut self, p: NewPrediction) -> Result<i64, StorageError> {
        let result = sqlx::query(INSERT_PREDICTION)
            .bind(&p.location)
            .bind(p.rainfall)
            .bind(p.ph_level)
            .bind(p.contamination)
            .bind(p.cases_count)
            .bind(&p.risk_level)
            .bind(p.confidence)
            .bind(&p.method)
            .bind(&p.reason)
            .bind(&p.severity)
            .bind(&p.trend)
            .bind(&p.recommendation)
            .bind(p.created_at_ms)
            .execute(&mut *self.tx)
            .await?;
        let id = result.last_insert_rowid();
        debug!("Staged prediction {}", id);
        Ok(id)
    }

    async fn append_alert(&mut self, alert: NewAlert) -> Result<i64, StorageError> {
        let result = sqlx::query(INSERT_ALERT)
            .bind(alert.prediction_id)
            .bind(&alert.location)
            .bind(&alert.severity)
            .bind(&alert.message)
            .bind(alert.created_at_ms)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let unit = *self;
        unit.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let writer = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteUnit {
            tx,
            _writer: writer,
        }))
    }

    async fn query_recent(
        &self,
        location: &str,
        n: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        Ok(sqlx::query_as::<_, PredictionRecord>(RECENT_FOR_LOCATION)
            .bind(location)
            .bind(n as i64)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_predictions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        Ok(sqlx::query_as::<_, PredictionRecord>(
            "SELECT * FROM predictions ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_alerts(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, StorageError> {
        Ok(sqlx::query_as::<_, AlertRecord>(
            "SELECT * FROM alerts ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_unresolved_alert(
        &self,
        location: &str,
    ) -> Result<Option<AlertRecord>, StorageError> {
        Ok(sqlx::query_as::<_, AlertRecord>(
            "SELECT * FROM alerts WHERE location = ? AND resolved = 0 ORDER BY id DESC LIMIT 1",
        )
        .bind(location)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn resolve(&self, alert_id: i64) -> Result<AlertRecord, StorageError> {
        // Waits for any open unit of work to finish
        let _writer = self.writer.lock().await;
        sqlx::query_as::<_, AlertRecord>("UPDATE alerts SET resolved = 1 WHERE id = ? RETURNING *")
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("alert {}", alert_id)))
    }

    async fn summary(&self) -> Result<StoreSummary, StorageError> {
        let (total_predictions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM predictions")
            .fetch_one(&self.pool)
            .await?;
        let (total_alerts, active_alerts): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN resolved = 0 THEN 1 ELSE 0 END), 0) FROM alerts",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreSummary {
            total_predictions: total_predictions as u64,
            risk_distribution: distribution(&self.pool, "risk_level").await?,
            trend_distribution: distribution(&self.pool, "trend").await?,
            severity_distribution: distribution(&self.pool, "severity").await?,
            total_alerts: total_alerts as u64,
            active_alerts: active_alerts as u64,
        })
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
