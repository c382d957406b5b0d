use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalError, CalResult};

/// A recurring weekly availability window owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub user_id: String,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub slot_length_minutes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub available: bool,
    #[serde(rename = "created_at_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updated_at_utc")]
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityRule {
    pub fn weekday(&self) -> Option<Weekday> {
        weekday_from_sunday(self.day_of_week)
    }
}

/// Fully resolved rule values, ready to be written by a `RuleStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_length_minutes: i32,
    pub title: Option<String>,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub slot_length_minutes: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

/// Update payload. `day_of_week: None` keeps the stored weekday, so an explicit
/// `Some(0)` is Sunday rather than "unset".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRuleRequest {
    #[serde(default)]
    pub day_of_week: Option<u8>,
    pub start_time: String,
    pub end_time: String,
    pub slot_length_minutes: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl CreateRuleRequest {
    pub fn validate(&self) -> CalResult<RuleDraft> {
        build_draft(
            self.day_of_week,
            &self.start_time,
            &self.end_time,
            self.slot_length_minutes,
            self.title.clone(),
            self.available,
        )
    }
}

impl UpdateRuleRequest {
    /// Resolves the request against the stored rule and validates the result.
    pub fn merge_onto(&self, existing: &AvailabilityRule) -> CalResult<RuleDraft> {
        build_draft(
            self.day_of_week.unwrap_or(existing.day_of_week),
            &self.start_time,
            &self.end_time,
            self.slot_length_minutes,
            self.title.clone(),
            self.available,
        )
    }
}

fn build_draft(
    day_of_week: u8,
    start: &str,
    end: &str,
    slot_length_minutes: i32,
    title: Option<String>,
    available: bool,
) -> CalResult<RuleDraft> {
    if day_of_week > 6 {
        return Err(CalError::Validation(format!(
            "day_of_week must be between 0 and 6, got {}",
            day_of_week
        )));
    }
    let start_time = parse_time_of_day(start)?;
    let end_time = parse_time_of_day(end)?;
    check_window(start_time, end_time)?;
    check_slot_length(slot_length_minutes)?;

    Ok(RuleDraft {
        day_of_week,
        start_time,
        end_time,
        slot_length_minutes,
        title: title.filter(|t| !t.is_empty()),
        available,
    })
}

pub(crate) fn check_window(start: NaiveTime, end: NaiveTime) -> CalResult<()> {
    if end <= start {
        return Err(CalError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_slot_length(minutes: i32) -> CalResult<()> {
    if minutes <= 0 {
        return Err(CalError::Validation(format!(
            "slot_length_minutes must be positive, got {}",
            minutes
        )));
    }
    Ok(())
}

/// Parses `HH:MM`. Longer strings such as `HH:MM:SS` are cut to their first
/// five characters.
pub fn parse_time_of_day(value: &str) -> CalResult<NaiveTime> {
    let head = value
        .get(..5)
        .ok_or_else(|| CalError::Validation(format!("invalid time string: {}", value)))?;
    NaiveTime::parse_from_str(head, "%H:%M")
        .map_err(|_| CalError::Validation(format!("invalid time string: {}", value)))
}

pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn weekday_from_sunday(day: u8) -> Option<Weekday> {
    match day {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Serde adapter for `HH:MM` time-of-day strings.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
