// SPDX-License-Identifier: MIT

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::Trainer;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", get(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// If not provided, uses FRONTEND_URL env var.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Reconstruct this API's external URL from the Host header.
fn service_url(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}", scheme, host)
}

/// Start OAuth flow - redirect to Google authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    // Get the frontend URL from query param or fall back to config
    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    // Encode frontend URL + timestamp in state
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    // Create the data payload: "frontend_url|timestamp_hex"
    let state_payload = format!("{}|{:x}", frontend_url, timestamp);

    // Sign the payload
    let mut mac = HmacSha256::new_from_slice(&state.config.oauth_state_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    // Combine payload + signature: "payload|signature_hex", then base64
    // encode the whole thing for the URL
    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    let oauth_state = URL_SAFE_NO_PAD.encode(signed_state.as_bytes());

    let callback_url = format!("{}/auth/google/callback", service_url(&headers));
    let auth_url = state
        .google_auth
        .authorization_url(&callback_url, &oauth_state);

    tracing::info!(
        frontend_url = %frontend_url,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: String,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    // Decode and verify frontend URL from state parameter
    let frontend_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!("{}?error={}", frontend_url, error);
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    tracing::info!("Exchanging authorization code for tokens");

    let callback_url = format!("{}/auth/google/callback", service_url(&headers));
    let tokens = state
        .google_auth
        .exchange_code(&params.code, &callback_url)
        .await?;
    let identity = state.google_auth.verify_id_token(&tokens.id_token).await?;

    let now = chrono::Utc::now();

    // Find an existing trainer by email or create one on first sign-in
    let mut trainer = match state.db.find_trainer_by_email(&identity.email).await? {
        Some(trainer) => trainer,
        None => {
            let name = identity
                .name
                .clone()
                .unwrap_or_else(|| identity.email.clone());
            let trainer = Trainer::new(generate_id()?, name, identity.email.clone(), now);
            tracing::info!(trainer_id = trainer.id, "Creating trainer on first sign-in");
            trainer
        }
    };

    trainer.google_id = Some(identity.subject.clone());
    trainer.google_access_token = Some(tokens.access_token.clone());
    if tokens.refresh_token.is_some() {
        trainer.google_refresh_token = tokens.refresh_token.clone();
    }
    trainer.token_expiry = Some(now + chrono::Duration::seconds(tokens.expires_in as i64));
    if trainer.logo_url.is_none() {
        trainer.logo_url = identity.picture.clone();
    }
    trainer.updated_at = now;
    state.db.upsert_trainer(&trainer).await?;

    tracing::info!(
        trainer_id = trainer.id,
        email = %trainer.email,
        "OAuth successful, trainer stored"
    );

    // Create JWT session token, delivered both as cookie and in the redirect
    let jwt = create_jwt(trainer.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let redirect_url = format!("{}/callback?token={}", frontend_url, jwt);

    Ok((jar.add(cookie), Redirect::temporary(&redirect_url)))
}

/// Verify HMAC signature and decode the frontend URL from the OAuth state parameter.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let frontend_url = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    // Reconstruct payload and verify signature
    let payload = format!("{}|{}", frontend_url, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());

    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}

/// Logout - clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (
        jar.remove(cookie),
        Redirect::temporary(&state.config.frontend_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_state(secret: &[u8], frontend_url: &str) -> String {
        let payload = format!("{}|{:x}", frontend_url, 1234567890u128);
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature).as_bytes())
    }

    #[test]
    fn test_verify_and_decode_state_success() {
        let secret = b"secret_key";
        let encoded = signed_state(secret, "https://example.com");
        assert_eq!(
            verify_and_decode_state(&encoded, secret),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_verify_and_decode_state_wrong_secret() {
        let encoded = signed_state(b"secret_key", "https://example.com");
        assert_eq!(verify_and_decode_state(&encoded, b"wrong_key"), None);
    }

    #[test]
    fn test_verify_and_decode_state_tampered_url() {
        let secret = b"secret_key";
        let encoded = signed_state(secret, "https://example.com");
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(encoded).unwrap()).unwrap();
        let tampered = decoded.replacen("example.com", "attacker.com", 1);
        let reencoded = URL_SAFE_NO_PAD.encode(tampered.as_bytes());
        assert_eq!(verify_and_decode_state(&reencoded, secret), None);
    }

    #[test]
    fn test_verify_and_decode_state_malformed() {
        let secret = b"secret_key";
        let encoded = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_and_decode_state(&encoded, secret), None);
    }
}
