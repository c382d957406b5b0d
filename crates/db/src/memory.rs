//! In-process implementation of the storage ports.
//!
//! Mirrors the PostgreSQL adapter's locking: a transaction holds a per
//! `(user, start)` mutex from `lock_slot` until it is committed or dropped, and
//! its writes stay invisible to other callers until commit. Lock table entries
//! are pruned once no transaction holds or waits on them.

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
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

type SlotKey = (String, DateTime<Utc>);

#[derive(Default)]
struct Tables {
    rules: Vec<AvailabilityRule>,
    bookings: Vec<Booking>,
}

impl Tables {
    fn confirmed_in_range(&self, user_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| {
                b.user_id == user_id
                    && b.status == BookingStatus::Confirmed
                    && b.start_at >= from
                    && b.start_at < to
            })
            .cloned()
            .collect();
        found.sort_by_key(|b| b.start_at);
        found
    }

    fn confirmed_at(&self, user_id: &str, start: DateTime<Utc>) -> Option<Uuid> {
        self.bookings
            .iter()
            .find(|b| b.user_id == user_id && b.status == BookingStatus::Confirmed && b.start_at == start)
            .map(|b| b.id)
    }

    fn rules_for(&self, user_id: &str) -> Vec<AvailabilityRule> {
        self.rules.iter().filter(|r| r.user_id == user_id).cloned().collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    slot_locks: Arc<Mutex<HashMap<SlotKey, Arc<AsyncMutex<()>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a rule as-is, bypassing validation. Useful for data that reached
    /// storage through another path.
    pub async fn put_raw_rule(&self, rule: AvailabilityRule) {
        self.tables.write().await.rules.push(rule);
    }

    fn slot_mutex(&self, key: SlotKey) -> CalResult<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .slot_locks
            .lock()
            .map_err(|_| CalError::Internal("slot lock table poisoned".into()))?;
        Ok(locks.entry(key).or_default().clone())
    }

    /// Drops lock table entries that only the table itself still references.
    fn prune_slot_locks<'a>(&self, keys: impl Iterator<Item = &'a SlotKey>) {
        let Ok(mut locks) = self.slot_locks.lock() else {
            return;
        };
        for key in keys {
            if locks.get(key).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
                locks.remove(key);
            }
        }
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn insert_rule(&self, user_id: &str, draft: &RuleDraft) -> CalResult<AvailabilityRule> {
        let now = Utc::now();
        let rule = AvailabilityRule {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            day_of_week: draft.day_of_week,
            start_time: draft.start_time,
            end_time: draft.end_time,
            slot_length_minutes: draft.slot_length_minutes,
            title: draft.title.clone(),
            available: draft.available,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.rules.push(rule.clone());
        Ok(rule)
    }

    async fn get_rule(&self, user_id: &str, rule_id: Uuid) -> CalResult<Option<AvailabilityRule>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rules
            .iter()
            .find(|r| r.id == rule_id && r.user_id == user_id)
            .cloned())
    }

    async fn list_rules(&self, user_id: &str) -> CalResult<Vec<AvailabilityRule>> {
        Ok(self.tables.read().await.rules_for(user_id))
    }

    async fn update_rule(
        &self,
        user_id: &str,
        rule_id: Uuid,
        draft: &RuleDraft,
    ) -> CalResult<Option<AvailabilityRule>> {
        let mut tables = self.tables.write().await;
        let Some(rule) = tables
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id && r.user_id == user_id)
        else {
            return Ok(None);
        };

        rule.day_of_week = draft.day_of_week;
        rule.start_time = draft.start_time;
        rule.end_time = draft.end_time;
        rule.slot_length_minutes = draft.slot_length_minutes;
        rule.title = draft.title.clone();
        rule.available = draft.available;
        rule.updated_at = Utc::now();
        Ok(Some(rule.clone()))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn list_bookings(&self, user_id: &str, range: Option<TimeRange>) -> CalResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.status != BookingStatus::Cancelled)
            .filter(|b| range.is_none_or(|r| r.contains(b.start_at)))
            .cloned()
            .collect();
        found.sort_by_key(|b| b.start_at);
        Ok(found)
    }

    async fn list_confirmed_in_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Booking>> {
        Ok(self.tables.read().await.confirmed_in_range(user_id, from, to))
    }

    async fn booking_status(&self, booking_id: Uuid) -> CalResult<Option<BookingStatus>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| b.id == booking_id).map(|b| b.status))
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> CalResult<u64> {
        let mut tables = self.tables.write().await;
        match tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.status != BookingStatus::Cancelled)
        {
            Some(booking) => {
                booking.status = BookingStatus::Cancelled;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn begin(&self) -> CalResult<Box<dyn BookingTransaction>> {
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            held: Vec::new(),
            pending: Vec::new(),
        }))
    }
}

pub struct MemoryTransaction {
    store: MemoryStore,
    held: Vec<(SlotKey, OwnedMutexGuard<()>)>,
    pending: Vec<Booking>,
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        let keys: Vec<SlotKey> = self.held.drain(..).map(|(key, _guard)| key).collect();
        self.store.prune_slot_locks(keys.iter());
    }
}

#[async_trait]
impl BookingTransaction for MemoryTransaction {
    async fn lock_slot(&mut self, user_id: &str, start: DateTime<Utc>) -> CalResult<Option<Uuid>> {
        let key = (user_id.to_string(), start);
        let mutex = self.store.slot_mutex(key.clone())?;
        let guard = mutex.lock_owned().await;
        self.held.push((key, guard));

        if let Some(id) = self
            .pending
            .iter()
            .find(|b| b.user_id == user_id && b.start_at == start)
            .map(|b| b.id)
        {
            return Ok(Some(id));
        }
        Ok(self.store.tables.read().await.confirmed_at(user_id, start))
    }

    async fn list_rules(&mut self, user_id: &str) -> CalResult<Vec<AvailabilityRule>> {
        Ok(self.store.tables.read().await.rules_for(user_id))
    }

    async fn list_confirmed_in_range(
        &mut self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Booking>> {
        let mut found = self.store.tables.read().await.confirmed_in_range(user_id, from, to);
        found.extend(
            self.pending
                .iter()
                .filter(|b| b.user_id == user_id && b.start_at >= from && b.start_at < to)
                .cloned(),
        );
        found.sort_by_key(|b| b.start_at);
        Ok(found)
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> CalResult<Booking> {
        let taken = self.pending.iter().any(|b| b.user_id == booking.user_id && b.start_at == booking.start_at)
            || self
                .store
                .tables
                .read()
                .await
                .confirmed_at(&booking.user_id, booking.start_at)
                .is_some();
        if taken {
            return Err(CalError::Conflict("slot already booked".to_string()));
        }

        let created = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id.clone(),
            candidate_email: booking.candidate_email.clone(),
            start_at: booking.start_at,
            end_at: booking.end_at,
            status: BookingStatus::Confirmed,
            source: booking.source.clone(),
            booking_type: booking.booking_type.clone(),
            description: booking.description.clone(),
            title: booking.title.clone(),
            created_at: Utc::now(),
        };
        self.pending.push(created.clone());
        Ok(created)
    }

    async fn commit(mut self: Box<Self>) -> CalResult<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut tables = self.store.tables.write().await;
        for booking in &pending {
            if tables.confirmed_at(&booking.user_id, booking.start_at).is_some() {
                return Err(CalError::Conflict("slot already booked".to_string()));
            }
        }
        tables.bookings.extend(pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CalResult<()> {
        Ok(())
    }
}
