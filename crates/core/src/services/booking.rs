use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{CalError, CalResult};
use crate::models::booking::{
    Booking, BookingStatus, CreateBookingRequest, NewBooking, TimeRange,
};
use crate::ports::{BookingStore, BookingTransaction};
use crate::services::availability::check_user;
use crate::slots;

/// Creates and cancels bookings.
///
/// Every `create_booking` call owns one transaction from start to finish. The
/// slot lock taken first inside it is the only point where concurrent attempts
/// on the same `(user, start)` are ordered.
#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
}

impl BookingService {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    pub async fn create_booking(
        &self,
        user_id: &str,
        request: CreateBookingRequest,
    ) -> CalResult<Booking> {
        check_user(user_id)?;
        let booking = request.into_new_booking(user_id)?;
        if booking.start_at >= booking.end_at {
            return Err(CalError::Validation("start must be before end".to_string()));
        }

        let mut tx = self.bookings.begin().await?;
        match reserve(tx.as_mut(), &booking).await {
            Ok(created) => {
                tx.commit().await?;
                info!(
                    "Booking confirmed: id={}, user_id={}, start={}",
                    created.id, created.user_id, created.start_at
                );
                Ok(created)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed after booking error: {}", rollback_err);
                }
                warn!(
                    "Booking rejected: user_id={}, start={}: {}",
                    user_id, booking.start_at, err
                );
                Err(err)
            }
        }
    }

    /// Non-cancelled bookings for the user, optionally limited to starts in `range`.
    pub async fn list_bookings(
        &self,
        user_id: &str,
        range: Option<TimeRange>,
    ) -> CalResult<Vec<Booking>> {
        check_user(user_id)?;
        if let Some(range) = range {
            if range.from >= range.to {
                return Err(CalError::InvalidRange("from must be before to".to_string()));
            }
        }
        self.bookings.list_bookings(user_id, range).await
    }

    /// Cancels a booking once. A second call reports `AlreadyCancelled`.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> CalResult<()> {
        let status = self
            .bookings
            .booking_status(booking_id)
            .await?
            .ok_or_else(|| booking_not_found(booking_id))?;

        if status == BookingStatus::Cancelled {
            return Err(CalError::AlreadyCancelled(format!(
                "booking {} is already cancelled",
                booking_id
            )));
        }

        let rows = self.bookings.cancel_booking(booking_id).await?;
        if rows == 0 {
            // lost a race with another cancel
            return Err(booking_not_found(booking_id));
        }

        info!("Booking cancelled: id={}", booking_id);
        Ok(())
    }
}

async fn reserve(tx: &mut dyn BookingTransaction, booking: &NewBooking) -> CalResult<Booking> {
    let user_id = booking.user_id.as_str();

    if let Some(existing) = tx.lock_slot(user_id, booking.start_at).await? {
        debug!("Slot already held by booking {}", existing);
        return Err(CalError::Conflict("slot already booked".to_string()));
    }

    let from = booking.start_at - Duration::seconds(1);
    let to = booking.end_at + Duration::seconds(1);
    let rules = tx.list_rules(user_id).await?;
    let (lo, hi) = slots::booking_lookup_window(&rules, from, to);
    let booked = tx.list_confirmed_in_range(user_id, lo, hi).await?;
    let free = slots::derive_slots(&rules, &booked, from, to)?;

    let matches_slot = free
        .iter()
        .any(|slot| slot.start == booking.start_at && slot.end == booking.end_at);
    if !matches_slot {
        return Err(CalError::Validation("slot not available".to_string()));
    }

    tx.insert_booking(booking).await
}

fn booking_not_found(booking_id: Uuid) -> CalError {
    CalError::NotFound(format!("Booking with ID {} not found", booking_id))
}
