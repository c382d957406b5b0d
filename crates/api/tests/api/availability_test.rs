use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::test_utils::{bearer, monday, monday_rule, rfc3339, seed_monday_rule, test_server};

#[test_log::test(tokio::test)]
async fn set_availability_returns_stored_rules() {
    let server = test_server();
    let (name, value) = bearer();

    let response = server
        .post("/api/users/alice/availability")
        .add_header(name, value)
        .json(&json!([monday_rule("09:00", "10:00", 30)]))
        .await;

    response.assert_status(StatusCode::CREATED);
    let rules: Vec<Value> = response.json();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["day_of_week"], 1);
    assert_eq!(rules[0]["start_time"], "09:00");
    assert_eq!(rules[0]["end_time"], "10:00");
    assert_eq!(rules[0]["available"], true);
    assert!(rules[0]["created_at_utc"].is_string());
}

#[tokio::test]
async fn rule_with_end_before_start_is_bad_request() {
    let server = test_server();
    let (name, value) = bearer();

    let response = server
        .post("/api/users/alice/availability")
        .add_header(name, value)
        .json(&json!([monday_rule("10:00", "09:00", 30)]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
}

#[tokio::test]
async fn list_availability_returns_users_rules_only() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    seed_monday_rule(&server, "bob", "11:00", "12:00", 60).await;
    let (name, value) = bearer();

    let rules: Vec<Value> = server
        .get("/api/users/alice/availability")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["user_id"], "alice");
}

#[tokio::test]
async fn update_keeps_weekday_when_omitted() {
    let server = test_server();
    let (name, value) = bearer();
    let created: Vec<Value> = server
        .post("/api/users/alice/availability")
        .add_header(name.clone(), value.clone())
        .json(&json!([{
            "day_of_week": 4,
            "start_time": "09:00",
            "end_time": "10:00",
            "slot_length_minutes": 30
        }]))
        .await
        .json();
    let rule_id = created[0]["id"].as_str().unwrap();

    let response = server
        .put(&format!("/api/users/alice/availability/{rule_id}"))
        .add_header(name, value)
        .json(&json!({
            "start_time": "13:00:00",
            "end_time": "14:00",
            "slot_length_minutes": 20,
            "title": "Office hours"
        }))
        .await;

    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["day_of_week"], 4);
    assert_eq!(updated["start_time"], "13:00");
    assert_eq!(updated["title"], "Office hours");
}

#[tokio::test]
async fn updating_unknown_rule_is_not_found() {
    let server = test_server();
    let (name, value) = bearer();

    server
        .put(&format!("/api/users/alice/availability/{}", uuid::Uuid::new_v4()))
        .add_header(name, value)
        .json(&json!({
            "day_of_week": 1,
            "start_time": "09:00",
            "end_time": "10:00",
            "slot_length_minutes": 30
        }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn slots_are_listed_in_utc() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    let (name, value) = bearer();

    let response = server
        .get("/api/users/alice/slots")
        .add_query_param("from", rfc3339(monday(0, 0)))
        .add_query_param("to", rfc3339(monday(23, 59)))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    response.assert_json(&json!([
        { "start_utc": "2026-10-19T09:00:00Z", "end_utc": "2026-10-19T09:30:00Z" },
        { "start_utc": "2026-10-19T09:30:00Z", "end_utc": "2026-10-19T10:00:00Z" }
    ]));
}

#[tokio::test]
async fn slots_require_both_bounds() {
    let server = test_server();
    let (name, value) = bearer();

    server
        .get("/api/users/alice/slots")
        .add_query_param("from", rfc3339(monday(0, 0)))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inverted_slot_window_is_bad_request() {
    let server = test_server();
    seed_monday_rule(&server, "alice", "09:00", "10:00", 30).await;
    let (name, value) = bearer();

    let response = server
        .get("/api/users/alice/slots")
        .add_query_param("from", rfc3339(monday(12, 0)))
        .add_query_param("to", rfc3339(monday(8, 0)))
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid range"));
}
