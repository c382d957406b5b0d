use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{CalError, CalResult};
use crate::models::{
    availability::{AvailabilityRule, CreateRuleRequest, UpdateRuleRequest},
    slot::Slot,
};
use crate::ports::{BookingStore, RuleStore};
use crate::slots;

/// Rule management and free-slot listing.
///
/// Reads here take no locks; a slot listed as free may be gone by the time the
/// caller tries to book it, which `BookingService` detects.
#[derive(Clone)]
pub struct AvailabilityService {
    rules: Arc<dyn RuleStore>,
    bookings: Arc<dyn BookingStore>,
}

impl AvailabilityService {
    pub fn new(rules: Arc<dyn RuleStore>, bookings: Arc<dyn BookingStore>) -> Self {
        Self { rules, bookings }
    }

    /// Validates and stores each rule in order.
    ///
    /// Rules are not written as one transaction: if a later rule fails
    /// validation, the earlier ones stay stored.
    pub async fn set_availability(
        &self,
        user_id: &str,
        requests: Vec<CreateRuleRequest>,
    ) -> CalResult<Vec<AvailabilityRule>> {
        check_user(user_id)?;
        let mut saved = Vec::with_capacity(requests.len());
        for request in &requests {
            let draft = request.validate()?;
            let rule = self.rules.insert_rule(user_id, &draft).await?;
            debug!("Stored availability rule: id={}, user_id={}", rule.id, user_id);
            saved.push(rule);
        }
        info!("Stored {} availability rules for user {}", saved.len(), user_id);
        Ok(saved)
    }

    pub async fn update_availability(
        &self,
        user_id: &str,
        rule_id: Uuid,
        request: UpdateRuleRequest,
    ) -> CalResult<AvailabilityRule> {
        check_user(user_id)?;
        let existing = self
            .rules
            .get_rule(user_id, rule_id)
            .await?
            .ok_or_else(|| rule_not_found(rule_id))?;

        let draft = request.merge_onto(&existing)?;
        let updated = self
            .rules
            .update_rule(user_id, rule_id, &draft)
            .await?
            .ok_or_else(|| rule_not_found(rule_id))?;

        debug!("Updated availability rule: id={}, user_id={}", rule_id, user_id);
        Ok(updated)
    }

    pub async fn list_availability(&self, user_id: &str) -> CalResult<Vec<AvailabilityRule>> {
        check_user(user_id)?;
        self.rules.list_rules(user_id).await
    }

    /// Free slots for `user_id` inside `[from, to]`. Windows longer than
    /// [`slots::max_window`] are rejected.
    pub async fn get_slots(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalResult<Vec<Slot>> {
        check_user(user_id)?;
        if from >= to {
            return Err(CalError::InvalidRange("from must be before to".to_string()));
        }
        if to - from > slots::max_window() {
            return Err(CalError::InvalidRange(format!(
                "window must not exceed {} days",
                slots::max_window().num_days()
            )));
        }

        let rules = self.rules.list_rules(user_id).await?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let (lo, hi) = slots::booking_lookup_window(&rules, from, to);
        let booked = self.bookings.list_confirmed_in_range(user_id, lo, hi).await?;
        slots::derive_slots(&rules, &booked, from, to)
    }
}

pub(crate) fn check_user(user_id: &str) -> CalResult<()> {
    if user_id.trim().is_empty() {
        return Err(CalError::Validation("user id must not be empty".to_string()));
    }
    Ok(())
}

fn rule_not_found(rule_id: Uuid) -> CalError {
    CalError::NotFound(format!("Availability rule with ID {} not found", rule_id))
}
