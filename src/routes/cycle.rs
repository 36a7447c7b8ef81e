use axum::{Router, routing::get, Json, extract::{State, Query}};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use axum::http::StatusCode;

use crate::cycle;
use crate::models::CycleInfo;
use crate::tracker::PeriodTracker;

#[derive(Deserialize)]
pub struct CycleQuery {
    pub user_id: String,
    // Evaluation date override, mostly for tests and backfill checks.
    pub as_of: Option<String>,
}

pub fn routes(tracker: Arc<PeriodTracker>) -> Router {
    Router::new()
        .route("/cycle", get(get_cycle_overview))
        .with_state(tracker)
}

async fn get_cycle_overview(
    State(tracker): State<Arc<PeriodTracker>>,
    Query(params): Query<CycleQuery>,
) -> Result<Json<CycleInfo>, (StatusCode, String)> {
    let as_of = match params.as_of.as_deref() {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Invalid as_of (expected YYYY-MM-DD)".into(),
                ))
            }
        },
        // The only place the clock is read; everything below takes the
        // date as a value.
        None => chrono::Utc::now().naive_utc().date(),
    };

    let entries = tracker.list_entries(&params.user_id).await;
    Ok(Json(cycle::cycle_info(&entries, as_of)))
}
