// SPDX-License-Identifier: MIT

//! Trainer-Pro API Server
//!
//! Scheduling and record-keeping backend for independent trainers:
//! clients, sessions, group appointments, exercises and payments.

use std::sync::Arc;
use trainer_pro::{config::Config, db::FirestoreDb, services::GoogleAuthService, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Trainer-Pro API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize Google OAuth client
    let google_auth = GoogleAuthService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    )
    .expect("Failed to initialize Google auth service");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        google_auth,
    });

    // Build router
    let app = trainer_pro::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trainer_pro=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
