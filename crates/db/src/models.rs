use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use slotbook_core::models::{
    api_key::ApiKey,
    availability::{parse_time_of_day, AvailabilityRule},
    booking::{Booking, BookingStatus},
};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityRule {
    pub id: Uuid,
    pub user_id: String,
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub slot_length_minutes: i32,
    pub title: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbAvailabilityRule> for AvailabilityRule {
    type Error = eyre::Report;

    fn try_from(row: DbAvailabilityRule) -> Result<Self> {
        let day_of_week = u8::try_from(row.day_of_week)
            .map_err(|_| eyre!("rule {} has invalid day_of_week {}", row.id, row.day_of_week))?;
        let start_time = parse_time_of_day(&row.start_time)
            .map_err(|e| eyre!("rule {} start_time: {}", row.id, e))?;
        let end_time = parse_time_of_day(&row.end_time)
            .map_err(|e| eyre!("rule {} end_time: {}", row.id, e))?;

        Ok(AvailabilityRule {
            id: row.id,
            user_id: row.user_id,
            day_of_week,
            start_time,
            end_time,
            slot_length_minutes: row.slot_length_minutes,
            title: row.title,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub user_id: String,
    pub candidate_email: String,
    pub start_at_utc: DateTime<Utc>,
    pub end_at_utc: DateTime<Utc>,
    pub status: String,
    pub source: Option<String>,
    #[sqlx(rename = "type")]
    pub booking_type: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbBooking> for Booking {
    type Error = eyre::Report;

    fn try_from(row: DbBooking) -> Result<Self> {
        let status: BookingStatus = row
            .status
            .parse()
            .map_err(|e| eyre!("booking {}: {}", row.id, e))?;

        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            candidate_email: row.candidate_email,
            start_at: row.start_at_utc,
            end_at: row.end_at_utc,
            status,
            source: row.source,
            booking_type: row.booking_type,
            description: row.description,
            title: row.title,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbApiKey {
    pub id: Uuid,
    pub email: String,
    pub key_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<DbApiKey> for ApiKey {
    fn from(row: DbApiKey) -> Self {
        ApiKey {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}
