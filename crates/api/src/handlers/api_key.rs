use axum::{extract::State, Json};
use slotbook_core::{
    errors::CalError,
    models::api_key::{ApiKey, GenerateApiKeyRequest, GenerateApiKeyResponse},
};
use std::sync::Arc;
use tracing::info;

use crate::{
    middleware::{auth, error_handling::AppError},
    ApiState,
};

/// `POST /api/auth/key`
///
/// Issues a new key for `email`, replacing any earlier one. The plaintext key
/// appears only in this response.
#[axum::debug_handler]
pub async fn generate_api_key(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<GenerateApiKeyRequest>,
) -> Result<Json<GenerateApiKeyResponse>, AppError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(CalError::Validation("email and password are required".to_string()).into());
    }

    let issued = auth::issue_key()?;
    let stored: ApiKey = slotbook_db::repositories::api_key::upsert_api_key(
        &state.db_pool,
        issued.id,
        email,
        &issued.secret_hash,
    )
    .await
    .map_err(CalError::Database)?
    .into();

    info!("Issued API key {} for {}", stored.id, stored.email);

    Ok(Json(GenerateApiKeyResponse {
        api_key: issued.plaintext,
        email: stored.email,
        created_at: stored.created_at,
        uuid: stored.id,
    }))
}
