//! Entry storage boundary.
//!
//! The predictor only ever sees a list of entries; where that list lives is
//! behind [`EntryStore`], injected as a capability so the service (and every
//! test) can run against the in-memory implementation with no database.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewPeriodEntry, PeriodEntry};

pub mod cache;
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("entry {0} not found")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable period-entry storage, scoped by user.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// All entries for the user, in store order. Callers sort for themselves.
    async fn list_entries(&self, user_id: &str) -> Result<Vec<PeriodEntry>, StoreError>;

    /// Persist a new entry, returning the id the store assigned.
    async fn add_entry(&self, user_id: &str, entry: NewPeriodEntry)
        -> Result<String, StoreError>;

    /// Replace the stored fields of an existing entry.
    async fn update_entry(
        &self,
        user_id: &str,
        id: &str,
        entry: NewPeriodEntry,
    ) -> Result<(), StoreError>;

    /// Remove an entry.
    async fn delete_entry(&self, user_id: &str, id: &str) -> Result<(), StoreError>;
}
