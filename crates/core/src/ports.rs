//! Storage contracts consumed by the slot engine and the booking services.
//!
//! Implementations live in `slotbook-db`; the core never talks to a database
//! directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::CalResult;
use crate::models::{
    availability::{AvailabilityRule, RuleDraft},
    booking::{Booking, BookingStatus, NewBooking, TimeRange},
};

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn insert_rule(&self, user_id: &str, draft: &RuleDraft) -> CalResult<AvailabilityRule>;

    async fn get_rule(&self, user_id: &str, rule_id: Uuid) -> CalResult<Option<AvailabilityRule>>;

    async fn list_rules(&self, user_id: &str) -> CalResult<Vec<AvailabilityRule>>;

    /// Returns `None` when no rule with that id belongs to the user.
    async fn update_rule(
        &self,
        user_id: &str,
        rule_id: Uuid,
        draft: &RuleDraft,
    ) -> CalResult<Option<AvailabilityRule>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Non-cancelled bookings ordered by start, optionally limited to starts in `range`.
    async fn list_bookings(&self, user_id: &str, range: Option<TimeRange>) -> CalResult<Vec<Booking>>;

    /// Confirmed bookings with `from <= start_at < to`.
    async fn list_confirmed_in_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Booking>>;

    async fn booking_status(&self, booking_id: Uuid) -> CalResult<Option<BookingStatus>>;

    /// Flips a non-cancelled booking to cancelled. Returns the number of rows changed.
    async fn cancel_booking(&self, booking_id: Uuid) -> CalResult<u64>;

    /// Opens a transaction owned by a single booking attempt.
    async fn begin(&self) -> CalResult<Box<dyn BookingTransaction>>;
}

/// A scoped unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait BookingTransaction: Send {
    /// Blocks other transactions on the same `(user_id, start)` key until this
    /// one finishes, then reports any confirmed booking already holding it.
    async fn lock_slot(&mut self, user_id: &str, start: DateTime<Utc>) -> CalResult<Option<Uuid>>;

    async fn list_rules(&mut self, user_id: &str) -> CalResult<Vec<AvailabilityRule>>;

    async fn list_confirmed_in_range(
        &mut self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Booking>>;

    async fn insert_booking(&mut self, booking: &NewBooking) -> CalResult<Booking>;

    async fn commit(self: Box<Self>) -> CalResult<()>;

    async fn rollback(self: Box<Self>) -> CalResult<()>;
}
