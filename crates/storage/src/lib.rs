//! Storage Layer
//!
//! Append-only prediction history plus alerts. Every submission goes
//! through one [`UnitOfWork`]: history read, prediction write and alert
//! write commit together or not at all.

mod memory;
mod records;
mod sqlite;
mod store;
#[cfg(test)]
mod testing;

pub use memory::{MemoryStore, DEFAULT_MAX_PREDICTION_RECORDS};
pub use records::{AlertRecord, NewAlert, NewPrediction, PredictionRecord, StoreSummary};
pub use sqlite::SqliteStore;
pub use store::{HistoryStore, UnitOfWork};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Integrity violation: {0}")]
    IntegrityError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StorageError::NotFound("row".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StorageError::SerializationError(e.to_string())
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                StorageError::IntegrityError(db.message().to_string())
            }
            _ => StorageError::DatabaseError(e.to_string()),
        }
    }
}
