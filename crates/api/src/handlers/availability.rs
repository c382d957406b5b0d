//! # Availability Handlers
//!
//! Weekly rule management and free-slot listing for a user. The slot listing is
//! a read-only projection; a slot shown here may still be lost to a concurrent
//! booking, which the booking endpoint reports as a conflict.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use slotbook_core::{
    errors::CalError,
    models::{
        availability::{AvailabilityRule, CreateRuleRequest, UpdateRuleRequest},
        slot::{Slot, WindowQuery},
    },
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

/// `POST /api/users/:id/availability`
///
/// Stores each rule in request order. A rule failing validation stops the batch;
/// rules stored before it are kept.
#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<Vec<CreateRuleRequest>>,
) -> Result<(StatusCode, Json<Vec<AvailabilityRule>>), AppError> {
    let saved = state.availability.set_availability(&user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// `PUT /api/users/:id/availability/:rule_id`
///
/// Omitting `day_of_week` keeps the stored weekday.
#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<ApiState>>,
    Path((user_id, rule_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateRuleRequest>,
) -> Result<Json<AvailabilityRule>, AppError> {
    let updated = state
        .availability
        .update_availability(&user_id, rule_id, payload)
        .await?;
    Ok(Json(updated))
}

#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AvailabilityRule>>, AppError> {
    let rules = state.availability.list_availability(&user_id).await?;
    Ok(Json(rules))
}

/// `GET /api/users/:id/slots?from=&to=`
///
/// Both bounds are required RFC 3339 timestamps; offsets are normalized to UTC.
#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let (Some(from), Some(to)) = (query.from, query.to) else {
        return Err(CalError::Validation("both from and to are required".to_string()).into());
    };

    let slots = state
        .availability
        .get_slots(&user_id, from.with_timezone(&Utc), to.with_timezone(&Utc))
        .await?;
    Ok(Json(slots))
}
