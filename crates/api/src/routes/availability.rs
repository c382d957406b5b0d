use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/users/:id/availability",
            get(handlers::availability::list_availability)
                .post(handlers::availability::set_availability),
        )
        .route(
            "/api/users/:id/availability/:rule_id",
            put(handlers::availability::update_availability),
        )
        .route("/api/users/:id/slots", get(handlers::availability::get_slots))
}
