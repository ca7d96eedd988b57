// SPDX-License-Identifier: MIT

//! Trainer-Pro: scheduling and record-keeping backend for independent trainers.
//!
//! This crate provides the REST API for managing clients, locations, training
//! sessions (individual and grouped), exercises and bulk payments.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::GoogleAuthService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub google_auth: GoogleAuthService,
}
