use axum::{
    Router,
    routing::{get, post, put},
    extract::{Path, Query, State},
    Json,
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{AddOutcome, NewPeriodEntry, PeriodEntry};
use crate::store::StoreError;
use crate::tracker::PeriodTracker;

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

/// Create/update payload. Dates stay raw strings; a malformed date is stored
/// as-is and simply never contributes to predictions.
#[derive(Deserialize)]
pub struct EntryBody {
    pub user_id: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub symptoms: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EntryBody {
    fn split(self) -> (String, NewPeriodEntry) {
        (
            self.user_id,
            NewPeriodEntry {
                start_date: self.start_date,
                end_date: self.end_date,
                symptoms: self.symptoms,
                notes: self.notes,
            },
        )
    }
}

pub fn routes(tracker: Arc<PeriodTracker>) -> Router {
    Router::new()
        .route("/entry", post(add_entry))
        .route("/entry/:id", put(update_entry).delete(delete_entry))
        .route("/entries", get(list_entries))
        .with_state(tracker)
}

async fn add_entry(
    State(tracker): State<Arc<PeriodTracker>>,
    Json(body): Json<EntryBody>,
) -> (StatusCode, Json<AddOutcome>) {
    let (user_id, entry) = body.split();
    let outcome = tracker.add_entry(&user_id, entry).await;
    (StatusCode::CREATED, Json(outcome))
}

async fn update_entry(
    State(tracker): State<Arc<PeriodTracker>>,
    Path(id): Path<String>,
    Json(body): Json<EntryBody>,
) -> Result<StatusCode, (StatusCode, String)> {
    let (user_id, entry) = body.split();
    match tracker.update_entry(&user_id, &id, entry).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound(_)) => Err((StatusCode::NOT_FOUND, "No entry found".into())),
        Err(e) => {
            tracing::error!("❌ Failed to update entry: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "DB error".into()))
        }
    }
}

async fn delete_entry(
    State(tracker): State<Arc<PeriodTracker>>,
    Path(id): Path<String>,
    Query(params): Query<UserQuery>,
) -> Result<StatusCode, (StatusCode, String)> {
    match tracker.delete_entry(&params.user_id, &id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound(_)) => Err((StatusCode::NOT_FOUND, "No entry found".into())),
        Err(e) => {
            eprintln!("❌ DB error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "DB error".into()))
        }
    }
}

async fn list_entries(
    State(tracker): State<Arc<PeriodTracker>>,
    Query(params): Query<UserQuery>,
) -> Json<Vec<PeriodEntry>> {
    Json(tracker.list_entries(&params.user_id).await)
}
