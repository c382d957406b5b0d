//! # Slot derivation
//!
//! Turns a user's weekly rules into concrete slots inside an absolute window and
//! drops the slots whose start is already held by a confirmed booking.
//!
//! Ordering of the output is day-major, then rule order, then ascending time
//! inside a rule. Overlapping rules yield duplicate slots; nothing is merged.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::errors::{CalError, CalResult};
use crate::models::{availability::AvailabilityRule, booking::Booking, slot::Slot};

/// Minimum distance bookings are fetched beyond each end of the requested window.
pub fn booking_padding() -> Duration {
    Duration::hours(1)
}

/// Longest window a single slot listing may span.
pub fn max_window() -> Duration {
    Duration::days(366)
}

/// Window used to load bookings that may collide with slots in `[from, to]`.
///
/// Edge slots are returned whole, so a slot overlapping `from` can start up to
/// one slot length earlier. The lower bound is pushed back by the longest
/// available slot length when that exceeds the base padding.
pub fn booking_lookup_window(
    rules: &[AvailabilityRule],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let longest_slot = rules
        .iter()
        .filter(|r| r.available)
        .map(|r| Duration::minutes(i64::from(r.slot_length_minutes.max(0))))
        .max()
        .unwrap_or_else(Duration::zero);
    let lead = booking_padding().max(longest_slot);
    (from - lead, to + booking_padding())
}

/// Expands every available rule over each calendar day touched by `[from, to]`.
///
/// A slot is kept when it ends after `from` and starts before `to`; edge slots
/// are returned whole, not clipped. A trailing period shorter than the slot
/// length is dropped.
pub fn expand_rules(
    rules: &[AvailabilityRule],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> CalResult<Vec<Slot>> {
    let mut candidates = Vec::new();
    if rules.is_empty() {
        return Ok(candidates);
    }

    let last_day = to.date_naive();
    let mut day = from.date_naive();
    while day <= last_day {
        let weekday = day.weekday();
        for rule in rules {
            if rule.weekday() != Some(weekday) || !rule.available {
                continue;
            }
            tile_rule(rule, day, from, to, &mut candidates)?;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(candidates)
}

fn tile_rule(
    rule: &AvailabilityRule,
    day: NaiveDate,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    out: &mut Vec<Slot>,
) -> CalResult<()> {
    if rule.end_time <= rule.start_time {
        return Err(CalError::Validation(format!(
            "end_time must be after start_time for rule {}",
            rule.id
        )));
    }
    if rule.slot_length_minutes <= 0 {
        return Err(CalError::Validation(format!(
            "slot_length_minutes must be positive for rule {}",
            rule.id
        )));
    }

    let rule_start = day.and_time(rule.start_time).and_utc();
    let rule_end = day.and_time(rule.end_time).and_utc();
    let length = Duration::minutes(i64::from(rule.slot_length_minutes));

    let mut start = rule_start;
    while start + length <= rule_end {
        let end = start + length;
        if end > from && start < to {
            out.push(Slot { start, end });
        }
        start = end;
    }
    Ok(())
}

/// Removes candidates whose start equals the start of any given booking.
pub fn remove_booked(candidates: Vec<Slot>, bookings: &[Booking]) -> Vec<Slot> {
    let occupied: HashSet<DateTime<Utc>> = bookings.iter().map(|b| b.start_at).collect();
    candidates
        .into_iter()
        .filter(|slot| !occupied.contains(&slot.start))
        .collect()
}

/// Full derivation: expand the rules, then subtract the booked starts.
pub fn derive_slots(
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> CalResult<Vec<Slot>> {
    let candidates = expand_rules(rules, from, to)?;
    let total = candidates.len();
    let free = remove_booked(candidates, bookings);
    debug!(
        "Derived {} free slots out of {} candidates ({} rules, {} bookings)",
        free.len(),
        total,
        rules.len(),
        bookings.len()
    );
    Ok(free)
}
