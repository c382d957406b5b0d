use axum::http::StatusCode;
use fake::{faker::internet::en::SafeEmail, Fake};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::test_utils::{bearer, monday, rfc3339, seed_monday_rule, test_server};
use axum_test::TestServer;
use chrono::{DateTime, Utc};

async fn book(server: &TestServer, start: DateTime<Utc>, end: DateTime<Utc>) -> axum_test::TestResponse {
    let (name, value) = bearer();
    let email: String = SafeEmail().fake();
    server
        .post("/api/users/alice/bookings")
        .add_header(name, value)
        .json(&json!({
            "candidate_email": email,
            "start_at_utc": rfc3339(start),
            "end_at_utc": rfc3339(end),
            "source": "careers-page",
            "type": "interview"
        }))
        .await
}

#[test_log::test(tokio::test)]
async fn booking_a_free_slot_is_created() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;

    let response = book(&server, monday(9, 0), monday(9, 30)).await;

    response.assert_status(StatusCode::CREATED);
    let booking: Value = response.json();
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["start_at_utc"], "2026-10-19T09:00:00Z");
    assert_eq!(booking["type"], "interview");
    assert!(booking.get("description").is_none());
}

#[tokio::test]
async fn booked_slot_leaves_the_listing() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    book(&server, monday(9, 0), monday(9, 30)).await.assert_status(StatusCode::CREATED);
    let (name, value) = bearer();

    let slots: Vec<Value> = server
        .get("/api/users/alice/slots")
        .add_query_param("from", rfc3339(monday(0, 0)))
        .add_query_param("to", rfc3339(monday(23, 59)))
        .add_header(name, value)
        .await
        .json();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["start_utc"], "2026-10-19T09:30:00Z");
}

#[tokio::test]
async fn double_booking_is_conflict() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    book(&server, monday(9, 0), monday(9, 30)).await.assert_status(StatusCode::CREATED);

    let response = book(&server, monday(9, 0), monday(9, 30)).await;

    response.assert_status(StatusCode::CONFLICT);
    response.assert_json(&json!({ "error": "Conflict: slot already booked" }));
}

#[tokio::test]
async fn misaligned_booking_is_bad_request() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;

    let response = book(&server, monday(9, 15), monday(9, 45)).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Validation error: slot not available" }));
}

#[tokio::test]
async fn listing_with_a_single_bound_is_rejected() {
    let server = test_server();
    let (name, value) = bearer();

    server
        .get("/api/users/alice/bookings")
        .add_query_param("to", rfc3339(monday(12, 0)))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_by_range() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "11:00", 30).await;
    book(&server, monday(9, 0), monday(9, 30)).await.assert_status(StatusCode::CREATED);
    book(&server, monday(10, 30), monday(11, 0)).await.assert_status(StatusCode::CREATED);
    let (name, value) = bearer();

    let all: Vec<Value> = server
        .get("/api/users/alice/bookings")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(all.len(), 2);

    let late: Vec<Value> = server
        .get("/api/users/alice/bookings")
        .add_query_param("from", rfc3339(monday(10, 0)))
        .add_query_param("to", rfc3339(monday(12, 0)))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0]["start_at_utc"], "2026-10-19T10:30:00Z");
}

#[test_log::test(tokio::test)]
async fn cancel_then_cancel_again_conflicts() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    let booking: Value = book(&server, monday(9, 0), monday(9, 30)).await.json();
    let path = format!("/api/bookings/{}", booking["id"].as_str().unwrap());
    let (name, value) = bearer();

    let first = server.delete(&path).add_header(name.clone(), value.clone()).await;
    first.assert_status_ok();
    first.assert_json(&json!({ "ok": true }));

    server
        .delete(&path)
        .add_header(name, value)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelling_unknown_booking_is_not_found() {
    let server = test_server();
    let (name, value) = bearer();

    server
        .delete(&format!("/api/bookings/{}", uuid::Uuid::new_v4()))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_without_candidate_email_is_bad_request() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    let (name, value) = bearer();

    let response = server
        .post("/api/users/alice/bookings")
        .add_header(name, value)
        .json(&json!({
            "candidate_email": "",
            "start_at_utc": rfc3339(monday(9, 0)),
            "end_at_utc": rfc3339(monday(9, 30))
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("candidate_email"));
}
