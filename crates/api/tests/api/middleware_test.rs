use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use slotbook_api::middleware::error_handling::AppError;
use slotbook_core::errors::CalError;

use crate::test_utils::{test_server, JWT_SECRET};

fn jwt_bearer(alg: Algorithm, secret: &str, exp_offset_secs: i64) -> HeaderValue {
    let claims = json!({ "sub": "alice", "exp": Utc::now().timestamp() + exp_offset_secs });
    let token = encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

#[rstest]
#[case(CalError::NotFound("booking".into()), StatusCode::NOT_FOUND)]
#[case(CalError::Validation("bad time".into()), StatusCode::BAD_REQUEST)]
#[case(CalError::InvalidRange("from after to".into()), StatusCode::BAD_REQUEST)]
#[case(CalError::Conflict("slot already booked".into()), StatusCode::CONFLICT)]
#[case(CalError::AlreadyCancelled("booking".into()), StatusCode::CONFLICT)]
#[case(CalError::Authentication("no key".into()), StatusCode::UNAUTHORIZED)]
#[case(CalError::Database(eyre::eyre!("connection reset")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(CalError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
fn errors_map_to_status(#[case] error: CalError, #[case] expected: StatusCode) {
    assert_eq!(AppError(error).into_response().status(), expected);
}

#[tokio::test]
async fn health_and_version_are_public() {
    let server = test_server();

    server.get("/health").await.assert_json(&json!({ "status": "ok" }));
    let version: Value = server.get("/version").await.json();
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn protected_route_without_credentials_is_unauthorized() {
    let server = test_server();

    let response = server.get("/api/users/alice/availability").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Authentication error"));
}

#[tokio::test]
async fn unknown_static_token_is_unauthorized() {
    let server = test_server();

    server
        .get("/api/users/alice/availability")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn static_token_is_accepted_in_api_key_header() {
    let server = test_server();

    server
        .get("/api/users/alice/availability")
        .add_header(HeaderName::from_static("x-api-key"), HeaderValue::from_static("test-token"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn key_request_without_password_is_bad_request() {
    let server = test_server();

    server
        .post("/api/auth/key")
        .json(&json!({ "email": "alice@example.com", "password": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[rstest]
#[case::hs256(Algorithm::HS256, JWT_SECRET, 300, StatusCode::OK)]
#[case::hs384(Algorithm::HS384, JWT_SECRET, 300, StatusCode::OK)]
#[case::expired(Algorithm::HS256, JWT_SECRET, -300, StatusCode::UNAUTHORIZED)]
#[case::wrong_secret(Algorithm::HS256, "someone-else", 300, StatusCode::UNAUTHORIZED)]
#[tokio::test]
async fn bearer_jwt_is_verified(
    #[case] alg: Algorithm,
    #[case] secret: &str,
    #[case] exp_offset_secs: i64,
    #[case] expected: StatusCode,
) {
    let server = test_server();

    server
        .get("/api/users/alice/availability")
        .add_header(header::AUTHORIZATION, jwt_bearer(alg, secret, exp_offset_secs))
        .await
        .assert_status(expected);
}
