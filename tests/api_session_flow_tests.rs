// SPDX-License-Identifier: MIT

//! End-to-end session flow tests against the Firestore emulator.
//!
//! These are skipped unless FIRESTORE_EMULATOR_HOST is set. Each test uses
//! its own trainer id so parallel runs do not see each other's data.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn request(
    app: &axum::Router,
    token: &str,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_client(app: &axum::Router, token: &str, name: &str) -> u64 {
    let (status, body) = request(
        app,
        token,
        "POST",
        "/api/clients",
        Some(json!({"name": name, "phone": "3001234567"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_u64().unwrap()
}

fn unique_trainer_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos() as u64
        + 1
}

#[tokio::test]
async fn test_single_client_start_never_creates_group() {
    require_emulator!();
    let (app, state) = common::create_test_app_online().await;
    let token = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);

    let client_id = create_client(&app, &token, "Solo Cliente").await;

    let (status, body) = request(
        &app,
        &token,
        "POST",
        "/api/sessions/active/start",
        Some(json!({"client_ids": [client_id]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    // Single-session shape: a session object, not a group wrapper
    assert!(body.get("group").is_none());
    assert_eq!(body["client_id"].as_u64(), Some(client_id));
    assert_eq!(body["status"], "in_progress");
    assert!(body["session_group_id"].is_null());
}

#[tokio::test]
async fn test_multi_client_start_creates_group() {
    require_emulator!();
    let (app, state) = common::create_test_app_online().await;
    let token = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);

    let a = create_client(&app, &token, "Cliente A").await;
    let b = create_client(&app, &token, "Cliente B").await;

    let (status, body) = request(
        &app,
        &token,
        "POST",
        "/api/sessions/active/start",
        Some(json!({"client_ids": [a, b]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["group"]["id"].as_u64().expect("group shape expected");
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    for session in sessions {
        assert_eq!(session["status"], "in_progress");
        assert_eq!(session["session_group_id"].as_u64(), Some(group_id));
    }

    // The group is now the active unit
    let (status, active) = request(&app, &token, "GET", "/api/sessions/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["group"]["id"].as_u64(), Some(group_id));
}

#[tokio::test]
async fn test_group_started_later_wins_active_resolution() {
    require_emulator!();
    let (app, state) = common::create_test_app_online().await;
    let token = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);

    let solo = create_client(&app, &token, "Solo").await;
    let a = create_client(&app, &token, "Grupo A").await;
    let b = create_client(&app, &token, "Grupo B").await;

    let (status, _) = request(
        &app,
        &token,
        "POST",
        "/api/sessions/active/start",
        Some(json!({"client_ids": [solo]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, group_body) = request(
        &app,
        &token,
        "POST",
        "/api/sessions/active/start",
        Some(json!({"client_ids": [a, b]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = group_body["group"]["id"].as_u64().unwrap();

    // The standalone session is still in progress, but the newer group is
    // what the trainer is doing now.
    let (status, active) = request(&app, &token, "GET", "/api/sessions/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["group"]["id"].as_u64(), Some(group_id));
}

#[tokio::test]
async fn test_starting_planned_session_returns_ok_not_created() {
    require_emulator!();
    let (app, state) = common::create_test_app_online().await;
    let token = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);

    let client_id = create_client(&app, &token, "Planificado").await;

    let (status, session) = request(
        &app,
        &token,
        "POST",
        "/api/sessions",
        Some(json!({
            "client_id": client_id,
            "scheduled_at": "2025-06-01T10:00:00Z",
            "duration_minutes": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = session["id"].as_u64().unwrap();

    let (status, body) = request(
        &app,
        &token,
        "POST",
        "/api/sessions/active/start",
        Some(json!({"session_id": session_id})),
    )
    .await;

    // The session already existed, so this is a state change, not a create
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_u64(), Some(session_id));
    assert_eq!(body["status"], "in_progress");
}

#[tokio::test]
async fn test_trainer_app_get_roundtrip_and_ownership() {
    require_emulator!();
    let (app, state) = common::create_test_app_online().await;
    let token = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);

    let (status, created) = request(
        &app,
        &token,
        "POST",
        "/api/apps",
        Some(json!({"name": "BMX Timing"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let app_id = created["id"].as_u64().unwrap();

    let uri = format!("/api/apps/{}", app_id);
    let (status, fetched) = request(&app, &token, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "BMX Timing");

    // Another trainer cannot read it
    let other = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);
    let (status, _) = request(&app, &other, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_is_idempotent_over_http() {
    require_emulator!();
    let (app, state) = common::create_test_app_online().await;
    let token = common::create_test_jwt(unique_trainer_id(), &state.config.jwt_signing_key);

    let client_id = create_client(&app, &token, "Cancelado").await;

    let (status, session) = request(
        &app,
        &token,
        "POST",
        "/api/sessions",
        Some(json!({
            "client_id": client_id,
            "scheduled_at": "2025-06-01T10:00:00Z",
            "duration_minutes": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = session["id"].as_u64().unwrap();

    let uri = format!("/api/sessions/{}", session_id);
    let (first, _) = request(&app, &token, "DELETE", &uri, None).await;
    let (second, _) = request(&app, &token, "DELETE", &uri, None).await;
    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);

    let (status, body) = request(&app, &token, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
}
