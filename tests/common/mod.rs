// SPDX-License-Identifier: MIT

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use trainer_pro::config::Config;
use trainer_pro::db::FirestoreDb;
use trainer_pro::routes::create_router;
use trainer_pro::services::GoogleAuthService;
use trainer_pro::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let google_auth = GoogleAuthService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    )
    .expect("Failed to build Google auth service");

    let state = Arc::new(AppState {
        config,
        db,
        google_auth,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator. Callers must guard
/// with `require_emulator!`.
#[allow(dead_code)]
pub async fn create_test_app_online() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db().await;
    let google_auth = GoogleAuthService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    )
    .expect("Failed to build Google auth service");

    let state = Arc::new(AppState {
        config,
        db,
        google_auth,
    });

    (create_router(state.clone()), state)
}

/// Create a test JWT token signed with the given key.
#[allow(dead_code)]
pub fn create_test_jwt(trainer_id: u64, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: trainer_id.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}
