use axum::{Router, routing::get, Json, extract::{State, Query}};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use axum::http::StatusCode;

use crate::cycle;
use crate::models::CycleDay;
use crate::tracker::PeriodTracker;

#[derive(Deserialize)]
pub struct DayQuery {
    pub user_id: String,
    pub date: String,
}

#[derive(Deserialize)]
pub struct MonthQuery {
    pub user_id: String,
    /// YYYY-MM
    pub month: String,
}

pub fn routes(tracker: Arc<PeriodTracker>) -> Router {
    Router::new()
        .route("/day", get(get_day))
        .route("/calendar", get(get_calendar_month))
        .with_state(tracker)
}

async fn get_day(
    State(tracker): State<Arc<PeriodTracker>>,
    Query(params): Query<DayQuery>,
) -> Result<Json<CycleDay>, (StatusCode, String)> {
    let date = match NaiveDate::parse_from_str(&params.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Invalid date format (expected YYYY-MM-DD)".into(),
            ))
        }
    };

    let entries = tracker.list_entries(&params.user_id).await;
    Ok(Json(cycle::classify_day(&entries, date)))
}

/// One classified day per calendar day of the requested month, in order.
async fn get_calendar_month(
    State(tracker): State<Arc<PeriodTracker>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<CycleDay>>, (StatusCode, String)> {
    let first = match NaiveDate::parse_from_str(&format!("{}-01", params.month), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Invalid month (expected YYYY-MM)".into(),
            ))
        }
    };

    let entries = tracker.list_entries(&params.user_id).await;

    let mut days = Vec::with_capacity(31);
    let mut day = first;
    while day.month() == first.month() {
        days.push(cycle::classify_day(&entries, day));
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(Json(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPeriodEntry, Phase};
    use crate::store::cache::EntryCache;
    use crate::store::memory::MemoryEntryStore;

    fn test_tracker(dir: &std::path::Path) -> Arc<PeriodTracker> {
        Arc::new(PeriodTracker::new(
            Arc::new(MemoryEntryStore::new()),
            EntryCache::new(dir),
        ))
    }

    async fn seed(tracker: &PeriodTracker, user: &str, start: &str) {
        tracker
            .add_entry(
                user,
                NewPeriodEntry {
                    start_date: start.to_string(),
                    end_date: None,
                    symptoms: None,
                    notes: None,
                },
            )
            .await;
    }

    #[tokio::test]
    async fn month_without_history_is_all_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = test_tracker(dir.path());

        let Json(days) = get_calendar_month(
            State(tracker),
            Query(MonthQuery {
                user_id: "ana".into(),
                month: "2024-02".into(),
            }),
        )
        .await
        .unwrap();

        // 2024 is a leap year.
        assert_eq!(days.len(), 29);
        assert!(days.iter().all(|d| d.phase == Phase::Unknown));
    }

    #[tokio::test]
    async fn month_walks_the_phases_from_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = test_tracker(dir.path());
        seed(&tracker, "ana", "2024-01-01").await;

        let Json(days) = get_calendar_month(
            State(tracker),
            Query(MonthQuery {
                user_id: "ana".into(),
                month: "2024-01".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(days.len(), 31);
        assert_eq!(days[0].phase, Phase::Period);
        assert_eq!(days[5].phase, Phase::Period);
        assert_eq!(days[6].phase, Phase::Follicular);
        assert_eq!(days[20].phase, Phase::Luteal);
        // Day 29 is one average cycle later: the next predicted period.
        assert_eq!(days[28].phase, Phase::Period);
        assert!(days[28].is_prediction);
        assert!(!days[0].is_prediction);
    }

    #[tokio::test]
    async fn malformed_month_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = test_tracker(dir.path());

        let err = get_calendar_month(
            State(tracker),
            Query(MonthQuery {
                user_id: "ana".into(),
                month: "2024-13".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn single_day_lookup_classifies_the_date() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = test_tracker(dir.path());
        seed(&tracker, "ana", "2024-01-01").await;

        let Json(day) = get_day(
            State(tracker),
            Query(DayQuery {
                user_id: "ana".into(),
                date: "2024-01-15".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(day.phase, Phase::Ovulation);
        assert!(!day.is_prediction);
    }

    #[tokio::test]
    async fn malformed_date_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = test_tracker(dir.path());

        let err = get_day(
            State(tracker),
            Query(DayQuery {
                user_id: "ana".into(),
                date: "01/15/2024".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
