//! PostgreSQL implementation of the core storage ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotbook_core::{
    errors::{CalError, CalResult},
    models::{
        availability::{AvailabilityRule, RuleDraft},
        booking::{Booking, BookingStatus, NewBooking, TimeRange},
    },
    ports::{BookingStore, BookingTransaction, RuleStore},
};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    DbPool,
    models::{DbAvailabilityRule, DbBooking},
    repositories::{availability, booking},
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_rules(rows: Vec<DbAvailabilityRule>) -> CalResult<Vec<AvailabilityRule>> {
    rows.into_iter()
        .map(|row| AvailabilityRule::try_from(row).map_err(CalError::Database))
        .collect()
}

fn to_bookings(rows: Vec<DbBooking>) -> CalResult<Vec<Booking>> {
    rows.into_iter()
        .map(|row| Booking::try_from(row).map_err(CalError::Database))
        .collect()
}

#[async_trait]
impl RuleStore for PgStore {
    async fn insert_rule(&self, user_id: &str, draft: &RuleDraft) -> CalResult<AvailabilityRule> {
        let row = availability::insert_rule(&self.pool, user_id, draft).await?;
        Ok(AvailabilityRule::try_from(row)?)
    }

    async fn get_rule(&self, user_id: &str, rule_id: Uuid) -> CalResult<Option<AvailabilityRule>> {
        let row = availability::get_rule(&self.pool, user_id, rule_id).await?;
        Ok(row.map(AvailabilityRule::try_from).transpose()?)
    }

    async fn list_rules(&self, user_id: &str) -> CalResult<Vec<AvailabilityRule>> {
        to_rules(availability::list_rules(&self.pool, user_id).await?)
    }

    async fn update_rule(
        &self,
        user_id: &str,
        rule_id: Uuid,
        draft: &RuleDraft,
    ) -> CalResult<Option<AvailabilityRule>> {
        let row = availability::update_rule(&self.pool, user_id, rule_id, draft).await?;
        Ok(row.map(AvailabilityRule::try_from).transpose()?)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn list_bookings(&self, user_id: &str, range: Option<TimeRange>) -> CalResult<Vec<Booking>> {
        let range = range.map(|r| (r.from, r.to));
        to_bookings(booking::list_bookings(&self.pool, user_id, range).await?)
    }

    async fn list_confirmed_in_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Booking>> {
        to_bookings(booking::list_confirmed_in_range(&self.pool, user_id, from, to).await?)
    }

    async fn booking_status(&self, booking_id: Uuid) -> CalResult<Option<BookingStatus>> {
        booking::get_booking_status(&self.pool, booking_id)
            .await?
            .map(|s| s.parse::<BookingStatus>())
            .transpose()
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> CalResult<u64> {
        Ok(booking::cancel_booking(&self.pool, booking_id).await?)
    }

    async fn begin(&self) -> CalResult<Box<dyn BookingTransaction>> {
        let tx = self.pool.begin().await.map_err(eyre::Report::from)?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back if it is dropped uncommitted.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTransaction for PgTransaction {
    async fn lock_slot(&mut self, user_id: &str, start: DateTime<Utc>) -> CalResult<Option<Uuid>> {
        booking::acquire_slot_lock(&mut *self.tx, user_id, start).await?;
        Ok(booking::find_confirmed_at_start_for_update(&mut *self.tx, user_id, start).await?)
    }

    async fn list_rules(&mut self, user_id: &str) -> CalResult<Vec<AvailabilityRule>> {
        to_rules(availability::list_rules(&mut *self.tx, user_id).await?)
    }

    async fn list_confirmed_in_range(
        &mut self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Booking>> {
        to_bookings(booking::list_confirmed_in_range(&mut *self.tx, user_id, from, to).await?)
    }

    async fn insert_booking(&mut self, new_booking: &NewBooking) -> CalResult<Booking> {
        match booking::insert_booking(&mut *self.tx, new_booking).await {
            Ok(row) => Ok(Booking::try_from(row)?),
            Err(err) if booking::is_unique_violation(&err) => {
                Err(CalError::Conflict("slot already booked".to_string()))
            }
            Err(err) => Err(CalError::Database(err)),
        }
    }

    async fn commit(self: Box<Self>) -> CalResult<()> {
        self.tx.commit().await.map_err(eyre::Report::from)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CalResult<()> {
        self.tx.rollback().await.map_err(eyre::Report::from)?;
        Ok(())
    }
}
