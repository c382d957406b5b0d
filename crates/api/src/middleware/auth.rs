//! # Authentication Module
//!
//! API keys have the shape `sk_<key-uuid>_<secret>`. Only an Argon2 hash of the
//! secret is stored, keyed by the uuid, so a presented key is checked with a
//! single row lookup followed by a hash verification.
//!
//! Protected routes accept a key in `X-API-Key` or as `Authorization: Bearer`.
//! A credential that is not shaped like an API key is then tried as an
//! HMAC-signed JWT (when a JWT secret is configured) and finally against the
//! configured static tokens, neither of which touches the database.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use eyre::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rand::{distributions::Alphanumeric, Rng};
use slotbook_core::errors::CalError;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

const KEY_PREFIX: &str = "sk_";
const SECRET_LEN: usize = 40;
/// Clock skew tolerated on `exp`/`nbf`, in seconds.
const JWT_LEEWAY_SECS: u64 = 5;

/// A freshly minted key. `plaintext` is shown to the caller once and never stored.
pub struct IssuedKey {
    pub id: Uuid,
    pub plaintext: String,
    pub secret_hash: String,
}

/// Hashes a secret using the Argon2 algorithm with a random salt.
///
/// Returns the PHC string (algorithm, parameters, salt and hash).
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| eyre::eyre!("Error hashing secret: {}", e))?
        .to_string();

    Ok(hash)
}

pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored API key hash is malformed: {}", e);
            false
        }
    }
}

pub fn issue_key() -> Result<IssuedKey> {
    let id = Uuid::new_v4();
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect();
    let secret_hash = hash_secret(&secret)?;

    Ok(IssuedKey {
        id,
        plaintext: format!("{KEY_PREFIX}{id}_{secret}"),
        secret_hash,
    })
}

/// Splits a presented key into its id and secret. `None` for anything that is
/// not shaped like an issued key.
pub fn parse_key(presented: &str) -> Option<(Uuid, &str)> {
    let rest = presented.strip_prefix(KEY_PREFIX)?;
    let (id, secret) = rest.split_once('_')?;
    if secret.is_empty() {
        return None;
    }
    Some((Uuid::parse_str(id).ok()?, secret))
}

/// `X-API-Key` wins over `Authorization: Bearer` when both are present.
pub fn presented_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }

    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Checks the signature and time claims of an HS256/HS384/HS512 token.
///
/// No claim is required; `exp` and `nbf` are enforced when present.
pub fn verify_jwt(secret: &str, token: &str) -> bool {
    let header = match jsonwebtoken::decode_header(token) {
        Ok(header) => header,
        Err(_) => return false,
    };
    if !matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
        debug!("Rejecting JWT signed with {:?}", header.alg);
        return false;
    }

    let mut validation = Validation::new(header.alg);
    validation.leeway = JWT_LEEWAY_SECS;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<serde_json::Value>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(_) => true,
        Err(e) => {
            debug!("JWT rejected: {}", e);
            false
        }
    }
}

async fn validate_api_key(state: &ApiState, presented: &str) -> Result<bool> {
    let Some((id, secret)) = parse_key(presented) else {
        return Ok(false);
    };
    let Some(stored) = slotbook_db::repositories::api_key::get_api_key_by_id(&state.db_pool, id).await?
    else {
        return Ok(false);
    };
    if !verify_secret(secret, &stored.key_hash) {
        return Ok(false);
    }

    if let Err(e) = slotbook_db::repositories::api_key::touch_api_key(&state.db_pool, id).await {
        warn!("Failed to record API key use for {}: {}", id, e);
    }
    debug!("Authenticated request with API key {} ({})", id, stored.email);
    Ok(true)
}

/// Rejects requests without a valid API key, JWT or static token.
pub async fn require_auth(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = presented_credential(request.headers()).ok_or_else(|| {
        CalError::Authentication(
            "missing credentials: provide an API key in X-API-Key or an Authorization Bearer token"
                .to_string(),
        )
    })?;

    let accepted = if parse_key(&credential).is_some() {
        validate_api_key(&state, &credential).await?
    } else {
        let jwt_ok = state
            .config
            .jwt_secret
            .as_deref()
            .is_some_and(|secret| verify_jwt(secret, &credential));
        jwt_ok || state.config.accepts_static_token(&credential)
    };
    if !accepted {
        return Err(CalError::Authentication("invalid API key or token".to_string()).into());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn sign(alg: Algorithm, secret: &str, claims: serde_json::Value) -> String {
        encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn issued_key_parses_back_to_its_id() {
        let issued = issue_key().unwrap();
        let (id, secret) = parse_key(&issued.plaintext).unwrap();

        assert_eq!(id, issued.id);
        assert_eq!(secret.len(), SECRET_LEN);
        assert!(verify_secret(secret, &issued.secret_hash));
        assert!(!verify_secret("wrong", &issued.secret_hash));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(parse_key("").is_none());
        assert!(parse_key("sk_").is_none());
        assert!(parse_key("sk_not-a-uuid_secret").is_none());
        assert!(parse_key(&format!("sk_{}_", Uuid::new_v4())).is_none());
        assert!(parse_key(&format!("pk_{}_abc", Uuid::new_v4())).is_none());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_secret("anything", "not-a-phc-string"));
    }

    #[test]
    fn credential_prefers_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("sk_key"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer other"));

        assert_eq!(presented_credential(&headers).as_deref(), Some("sk_key"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer tok"));
        assert_eq!(presented_credential(&headers).as_deref(), Some("tok"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(presented_credential(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer a b"));
        assert_eq!(presented_credential(&headers), None);
    }

    #[test]
    fn hmac_jwts_verify_with_the_shared_secret() {
        let exp = Utc::now().timestamp() + 60;
        for alg in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            let token = sign(alg, "shh", json!({ "sub": "alice", "exp": exp }));
            assert!(verify_jwt("shh", &token), "{alg:?}");
            assert!(!verify_jwt("other", &token), "{alg:?}");
        }
    }

    #[test]
    fn jwt_without_claims_is_accepted() {
        let token = sign(Algorithm::HS256, "shh", json!({}));
        assert!(verify_jwt("shh", &token));
    }

    #[test]
    fn jwt_time_claims_allow_small_skew_only() {
        let now = Utc::now().timestamp();

        let just_expired = sign(Algorithm::HS256, "shh", json!({ "exp": now - 2 }));
        assert!(verify_jwt("shh", &just_expired));

        let expired = sign(Algorithm::HS256, "shh", json!({ "exp": now - 60 }));
        assert!(!verify_jwt("shh", &expired));

        let not_yet = sign(Algorithm::HS256, "shh", json!({ "nbf": now + 60 }));
        assert!(!verify_jwt("shh", &not_yet));
    }

    #[test]
    fn non_jwt_values_do_not_verify() {
        assert!(!verify_jwt("shh", "test-token"));
        assert!(!verify_jwt("shh", ""));
        assert!(!verify_jwt("shh", "a.b.c"));
    }
}
