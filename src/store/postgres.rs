use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use super::{EntryStore, StoreError};
use crate::models::{NewPeriodEntry, PeriodEntry};

/// Idempotent DDL, run once at connection startup.
///
/// Dates are stored as the same "%Y-%m-%d" strings they travel as, so a row
/// with an unparseable date still loads and is skipped by the predictor
/// instead of poisoning the whole list.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS period_entries (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date   TEXT,
    symptoms   TEXT[],
    notes      TEXT
);

CREATE INDEX IF NOT EXISTS period_entries_user_idx ON period_entries(user_id);
"#;

/// PostgreSQL-backed [`EntryStore`].
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    /// Connects, creates the schema if needed, and returns the store. A
    /// database that cannot be reached at all reports
    /// [`StoreError::Unavailable`]; failures past that point are
    /// [`StoreError::Database`].
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.pool.execute(SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn list_entries(&self, user_id: &str) -> Result<Vec<PeriodEntry>, StoreError> {
        let entries = sqlx::query_as::<_, PeriodEntry>(
            r#"
            SELECT id, user_id, start_date, end_date, symptoms, notes
            FROM period_entries
            WHERE user_id = $1
            ORDER BY start_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn add_entry(
        &self,
        user_id: &str,
        entry: NewPeriodEntry,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO period_entries (id, user_id, start_date, end_date, symptoms, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(&entry.symptoms)
        .bind(&entry.notes)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_entry(
        &self,
        user_id: &str,
        id: &str,
        entry: NewPeriodEntry,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE period_entries
            SET start_date = $1, end_date = $2, symptoms = $3, notes = $4
            WHERE user_id = $5 AND id = $6
            "#,
        )
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(&entry.symptoms)
        .bind(&entry.notes)
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_entry(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM period_entries WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Everything else in here needs a live database; the connect error
    // mapping does not.
    #[tokio::test]
    async fn bad_connection_string_reports_unavailable() {
        let result = PgEntryStore::connect("not-a-connection-string").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
