// SPDX-License-Identifier: MIT

//! Cookie handling tests for the auth routes.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_oauth_start_redirects_to_google() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/google")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .expect("redirect should carry a Location header");
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
    assert!(location.contains("state="));
    assert!(location.contains("redirect_uri="));
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/logout")
                .header(header::COOKIE, format!("trainer_session={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .expect("logout should emit a Set-Cookie removal");
    assert!(set_cookie.starts_with("trainer_session="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_callback_with_oauth_error_redirects_without_cookie() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/google/callback?code=x&state=bogus&error=access_denied")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .unwrap();
    assert!(location.contains("error=access_denied"));
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}
