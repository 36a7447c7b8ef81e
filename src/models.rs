use serde::{ Serialize, Deserialize };
use chrono::NaiveDate;

// Dates travel as raw "%Y-%m-%d" strings end to end. Synced stores can hold
// values that do not parse; the predictor filters those out of its statistics
// instead of the store rejecting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PeriodEntry {
    pub id: String,
    pub user_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub symptoms: Option<Vec<String>>,
    pub notes: Option<String>,
}

// Store-bound fields for a new or replaced entry; ids are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPeriodEntry {
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub symptoms: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Period,
    Follicular,
    Ovulation,
    Luteal,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleDay {
    pub date: NaiveDate,
    pub phase: Phase,
    pub is_prediction: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub next_period_start: Option<NaiveDate>,
    pub next_ovulation: Option<NaiveDate>,
    pub current_phase: Phase,
    pub days_until_next_period: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    pub id: String,
    // false means the durable write failed and the entry only lives in the
    // local fallback until a client re-submits it.
    pub persisted: bool,
}
