use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{EntryStore, StoreError};
use crate::models::{NewPeriodEntry, PeriodEntry};

/// In-memory [`EntryStore`].
///
/// Backs the tests and the degraded mode the server drops into when the
/// database is unreachable at startup. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryEntryStore {
    entries: Mutex<Vec<PeriodEntry>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn list_entries(&self, user_id: &str) -> Result<Vec<PeriodEntry>, StoreError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_entry(
        &self,
        user_id: &str,
        entry: NewPeriodEntry,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.entries.lock().unwrap().push(PeriodEntry {
            id: id.clone(),
            user_id: user_id.to_string(),
            start_date: entry.start_date,
            end_date: entry.end_date,
            symptoms: entry.symptoms,
            notes: entry.notes,
        });
        Ok(id)
    }

    async fn update_entry(
        &self,
        user_id: &str,
        id: &str,
        entry: NewPeriodEntry,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(stored) = entries
            .iter_mut()
            .find(|e| e.user_id == user_id && e.id == id)
        else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        stored.start_date = entry.start_date;
        stored.end_date = entry.end_date;
        stored.symptoms = entry.symptoms;
        stored.notes = entry.notes;
        Ok(())
    }

    async fn delete_entry(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.id == id));
        if entries.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Store whose every call fails, for exercising the offline fallback paths.
#[cfg(test)]
pub struct FailingEntryStore;

#[cfg(test)]
#[async_trait]
impl EntryStore for FailingEntryStore {
    async fn list_entries(&self, _user_id: &str) -> Result<Vec<PeriodEntry>, StoreError> {
        Err(StoreError::Unavailable("backend offline".into()))
    }

    async fn add_entry(
        &self,
        _user_id: &str,
        _entry: NewPeriodEntry,
    ) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("backend offline".into()))
    }

    async fn update_entry(
        &self,
        _user_id: &str,
        _id: &str,
        _entry: NewPeriodEntry,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".into()))
    }

    async fn delete_entry(&self, _user_id: &str, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".into()))
    }
}
