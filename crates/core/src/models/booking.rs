use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::errors::{CalError, CalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CalError::Validation(format!("unknown booking status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub candidate_email: String,
    #[serde(rename = "start_at_utc")]
    pub start_at: DateTime<Utc>,
    #[serde(rename = "end_at_utc")]
    pub end_at: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub booking_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "created_at_utc")]
    pub created_at: DateTime<Utc>,
}

/// Booking row about to be inserted; always written as `confirmed`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: String,
    pub candidate_email: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub source: Option<String>,
    pub booking_type: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
}

/// Client request. Instants may carry any offset and are normalised to UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub candidate_email: String,
    #[serde(rename = "start_at_utc")]
    pub start_at: DateTime<FixedOffset>,
    #[serde(rename = "end_at_utc")]
    pub end_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type", default)]
    pub booking_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl CreateBookingRequest {
    /// Checks the candidate email and normalises both instants to UTC.
    pub fn into_new_booking(self, user_id: &str) -> CalResult<NewBooking> {
        let candidate_email = self.candidate_email.trim();
        check_email(candidate_email)?;

        Ok(NewBooking {
            user_id: user_id.to_string(),
            candidate_email: candidate_email.to_string(),
            start_at: self.start_at.with_timezone(&Utc),
            end_at: self.end_at.with_timezone(&Utc),
            source: self.source,
            booking_type: self.booking_type,
            description: self.description,
            title: self.title,
        })
    }
}

/// Structural address check: one `@`, a non-empty local part and a dotted
/// domain, no whitespace.
pub fn check_email(email: &str) -> CalResult<()> {
    let invalid = || CalError::Validation(format!("invalid candidate_email: {:?}", email));

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels_ok = domain.split('.').all(|label| !label.is_empty());
    if !domain.contains('.') || !labels_ok {
        return Err(invalid());
    }
    Ok(())
}

/// Half-open `[from, to)` filter on booking start instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant < self.to
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingResponse {
    pub ok: bool,
}
