//! `mockall` doubles of the storage ports, for exercising services without a store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use slotbook_core::{
    errors::CalResult,
    models::{
        availability::{AvailabilityRule, RuleDraft},
        booking::{Booking, BookingStatus, TimeRange},
    },
    ports::{BookingStore, BookingTransaction, RuleStore},
};
use uuid::Uuid;

mock! {
    pub RuleRepo {}

    #[async_trait]
    impl RuleStore for RuleRepo {
        async fn insert_rule(&self, user_id: &str, draft: &RuleDraft) -> CalResult<AvailabilityRule>;

        async fn get_rule(&self, user_id: &str, rule_id: Uuid) -> CalResult<Option<AvailabilityRule>>;

        async fn list_rules(&self, user_id: &str) -> CalResult<Vec<AvailabilityRule>>;

        async fn update_rule(
            &self,
            user_id: &str,
            rule_id: Uuid,
            draft: &RuleDraft,
        ) -> CalResult<Option<AvailabilityRule>>;
    }
}

mock! {
    pub BookingRepo {}

    #[async_trait]
    impl BookingStore for BookingRepo {
        async fn list_bookings(&self, user_id: &str, range: Option<TimeRange>) -> CalResult<Vec<Booking>>;

        async fn list_confirmed_in_range(
            &self,
            user_id: &str,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> CalResult<Vec<Booking>>;

        async fn booking_status(&self, booking_id: Uuid) -> CalResult<Option<BookingStatus>>;

        async fn cancel_booking(&self, booking_id: Uuid) -> CalResult<u64>;

        async fn begin(&self) -> CalResult<Box<dyn BookingTransaction>>;
    }
}
