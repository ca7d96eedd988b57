// SPDX-License-Identifier: MIT

//! API input validation tests.
//!
//! Each case must be rejected before any state mutation; the offline mock
//! database turns any accidental store access into a 500, so a 400 here
//! proves validation ran first.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn send_json(
    app: axum::Router,
    token: &str,
    method: &str,
    uri: &str,
    body: &str,
) -> StatusCode {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_payment_for_zero_sessions_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = send_json(
        app,
        &token,
        "POST",
        "/api/clients/77/payments",
        r#"{"sessions_paid": 0, "amount_cop": 100000}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_with_single_client_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = send_json(
        app,
        &token,
        "POST",
        "/api/sessions/groups",
        r#"{"client_ids": [7], "scheduled_at": "2025-06-01T10:00:00Z", "duration_minutes": 60}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_duration_out_of_range_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = send_json(
        app,
        &token,
        "POST",
        "/api/sessions",
        r#"{"client_id": 7, "scheduled_at": "2025-06-01T10:00:00Z", "duration_minutes": 5}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_without_session_or_clients_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = send_json(
        app,
        &token,
        "POST",
        "/api/sessions/active/start",
        r#"{"client_ids": []}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_current_session_tolerance_bounds() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/sessions/current?tolerance_minutes=0")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status();

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_list_rejects_malformed_dates() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/sessions?from=not-a-date")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status();

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exercise_reorder_requires_ids() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = send_json(
        app,
        &token,
        "PATCH",
        "/api/sessions/42/exercises/reorder",
        r#"{"exercise_ids": []}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lap_times_require_at_least_one_lap() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let status = send_json(
        app,
        &token,
        "POST",
        "/api/sessions/42/lap-times",
        r#"{"lap_times_ms": []}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
