// SPDX-License-Identifier: MIT

//! Trainer account and trainer app models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trainer account, created on first Google sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trainer {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Google account subject, set after OAuth sign-in
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<DateTime<Utc>>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trainer {
    pub fn new(id: u64, name: String, email: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            email,
            phone: None,
            google_id: None,
            google_refresh_token: None,
            google_access_token: None,
            token_expiry: None,
            logo_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A discipline workspace owned by a trainer ("BMX", "Fisioterapia", ...).
/// Exercise templates are scoped to an app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerApp {
    pub id: u64,
    pub trainer_id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainerApp {
    pub fn new(id: u64, trainer_id: u64, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            trainer_id,
            name,
            created_at: now,
            updated_at: now,
        }
    }
}
