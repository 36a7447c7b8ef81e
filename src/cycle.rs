//! Cycle phase prediction.
//!
//! Pure date math over the recorded period entries: no clock reads, no I/O,
//! no state. Callers pass the entry list and an explicit query date and get
//! the same answer every time.
//!
//! Period-length policy: a recorded end date bounds its own period segment
//! (and the extrapolation anchored on it); entries without one use the
//! 5-day default, which is also what `CycleInfo::average_period_length`
//! reports. End dates are never folded into the rolling cycle average.

use chrono::{Duration, NaiveDate};

use crate::models::{CycleDay, CycleInfo, PeriodEntry, Phase};

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;

// Start-to-start gaps outside this window are treated as data-entry noise
// (duplicate logs, missed months) and excluded from the average.
const MIN_PLAUSIBLE_GAP: i64 = 21;
const MAX_PLAUSIBLE_GAP: i64 = 35;

// Ovulation is assumed 14 days before the next period start.
const OVULATION_LEAD_DAYS: i64 = 14;

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Entries whose start date parses, sorted ascending. The stable sort keeps
/// same-day duplicates in input order, so the later record wins as reference.
fn sorted_valid(entries: &[PeriodEntry]) -> Vec<(NaiveDate, &PeriodEntry)> {
    let mut valid: Vec<(NaiveDate, &PeriodEntry)> = entries
        .iter()
        .filter_map(|e| parse_date(&e.start_date).map(|d| (d, e)))
        .collect();
    valid.sort_by_key(|(d, _)| *d);
    valid
}

/// Mean start-to-start gap in whole days, ignoring gaps outside the
/// plausible 21-35 day window, rounded to the nearest day. Defaults to 28
/// when no gap survives (fewer than two usable entries, or all noise).
pub fn average_cycle_length(entries: &[PeriodEntry]) -> i64 {
    let starts = sorted_valid(entries);
    let gaps: Vec<i64> = starts
        .windows(2)
        .map(|w| (w[1].0 - w[0].0).num_days())
        .filter(|gap| (MIN_PLAUSIBLE_GAP..=MAX_PLAUSIBLE_GAP).contains(gap))
        .collect();

    if gaps.is_empty() {
        return DEFAULT_CYCLE_LENGTH;
    }
    let sum: i64 = gaps.iter().sum();
    (sum as f64 / gaps.len() as f64).round() as i64
}

/// The latest entry starting on or before `date`; the earliest entry when
/// `date` precedes all of them (an accepted approximation, not an error).
fn reference_for<'a>(
    starts: &[(NaiveDate, &'a PeriodEntry)],
    date: NaiveDate,
) -> Option<(NaiveDate, &'a PeriodEntry)> {
    let mut reference = *starts.first()?;
    for candidate in starts {
        if candidate.0 <= date {
            reference = *candidate;
        } else {
            break;
        }
    }
    Some(reference)
}

/// Length in days of the reference segment. An end date before its own start
/// is treated as unrecorded.
fn period_length_for(start: NaiveDate, entry: &PeriodEntry) -> i64 {
    entry
        .end_date
        .as_deref()
        .and_then(parse_date)
        .map(|end| (end - start).num_days())
        .filter(|len| *len >= 0)
        .unwrap_or(DEFAULT_PERIOD_LENGTH)
}

/// The decision ladder for a whole-day offset `d` from the reference start,
/// top to bottom. `None` means the offset lies outside the observed cycle
/// and must be extrapolated.
fn observed_phase(d: i64, period_length: i64, cycle_length: i64) -> Option<Phase> {
    if d >= 0 && d <= period_length {
        Some(Phase::Period)
    } else if d > period_length && d <= period_length + 7 {
        Some(Phase::Follicular)
    } else if d > period_length + 7 && d <= period_length + 14 {
        Some(Phase::Ovulation)
    } else if d > period_length + 14 && d < cycle_length {
        Some(Phase::Luteal)
    } else {
        None
    }
}

/// The same thresholds applied to a wrapped offset, luteal as fall-through.
fn extrapolated_phase(f: i64, period_length: i64) -> Phase {
    if f <= period_length {
        Phase::Period
    } else if f <= period_length + 7 {
        Phase::Follicular
    } else if f <= period_length + 14 {
        Phase::Ovulation
    } else {
        Phase::Luteal
    }
}

fn classify_against(
    ref_start: NaiveDate,
    ref_entry: &PeriodEntry,
    cycle_length: i64,
    date: NaiveDate,
) -> CycleDay {
    let period_length = period_length_for(ref_start, ref_entry);
    let d = (date - ref_start).num_days();

    match observed_phase(d, period_length, cycle_length) {
        Some(phase) => CycleDay { date, phase, is_prediction: false },
        None => {
            // Repeat the cycle at the average length in either direction;
            // rem_euclid keeps the wrapped offset non-negative even for
            // dates before the reference.
            let f = d.rem_euclid(cycle_length);
            CycleDay {
                date,
                phase: extrapolated_phase(f, period_length),
                is_prediction: true,
            }
        }
    }
}

/// Phase classification for an arbitrary query date.
///
/// Tolerates unsorted input, duplicate starts, and unparseable dates; with
/// no usable history every day is `unknown`.
pub fn classify_day(entries: &[PeriodEntry], date: NaiveDate) -> CycleDay {
    let starts = sorted_valid(entries);
    let Some((ref_start, ref_entry)) = reference_for(&starts, date) else {
        return CycleDay { date, phase: Phase::Unknown, is_prediction: false };
    };

    let cycle_length = average_cycle_length(entries);
    classify_against(ref_start, ref_entry, cycle_length, date)
}

/// Summary anchored on the most recent entry, evaluated at `as_of`.
/// Handlers default `as_of` to today; nothing in here reads the clock.
pub fn cycle_info(entries: &[PeriodEntry], as_of: NaiveDate) -> CycleInfo {
    let starts = sorted_valid(entries);
    let average_cycle_length = average_cycle_length(entries);

    // The anchor must also carry a representable next start: a recorded
    // start at the calendar's edge overflows the addition and reports the
    // same blank summary as no history at all.
    let anchor = starts.last().copied().and_then(|(start, entry)| {
        start
            .checked_add_signed(Duration::days(average_cycle_length))
            .map(|next| (start, entry, next))
    });
    let Some((last_start, last_entry, next_period_start)) = anchor else {
        return CycleInfo {
            average_cycle_length,
            average_period_length: DEFAULT_PERIOD_LENGTH,
            next_period_start: None,
            next_ovulation: None,
            current_phase: Phase::Unknown,
            days_until_next_period: None,
        };
    };

    // The average is never under 21 days, so stepping back 14 stays in range.
    let next_ovulation = next_period_start - Duration::days(OVULATION_LEAD_DAYS);
    let days_until = (next_period_start - as_of).num_days();

    CycleInfo {
        average_cycle_length,
        average_period_length: DEFAULT_PERIOD_LENGTH,
        next_period_start: Some(next_period_start),
        next_ovulation: Some(next_ovulation),
        current_phase: classify_against(last_start, last_entry, average_cycle_length, as_of).phase,
        // Zero or negative means the predicted period has arrived and a new
        // entry should supersede it.
        days_until_next_period: (days_until > 0).then_some(days_until),
    }
}
