use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use slotbook_core::{
    errors::CalError,
    models::{
        booking::{Booking, CancelBookingResponse, CreateBookingRequest, TimeRange},
        slot::WindowQuery,
    },
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

/// `POST /api/users/:id/bookings`
///
/// 409 when the slot is already taken, 400 when the requested interval is not
/// one of the user's free slots.
#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings.create_booking(&user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let range = match (query.from, query.to) {
        (Some(from), Some(to)) => Some(TimeRange {
            from: from.with_timezone(&Utc),
            to: to.with_timezone(&Utc),
        }),
        (None, None) => None,
        _ => {
            return Err(CalError::Validation(
                "from and to must be given together".to_string(),
            )
            .into());
        }
    };

    let bookings = state.bookings.list_bookings(&user_id, range).await?;
    Ok(Json(bookings))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    state.bookings.cancel_booking(booking_id).await?;
    Ok(Json(CancelBookingResponse { ok: true }))
}
