// SPDX-License-Identifier: MIT

//! Client model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person trained by a trainer.
///
/// Clients are soft-deleted: `deleted_at` is a tombstone and historical
/// sessions/payments survive. Default listings exclude tombstoned rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    /// Owning trainer
    pub trainer_id: u64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    /// Default training venue
    pub default_location_id: Option<u64>,
    // Profile fields
    pub photo_url: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub gender: Option<String>,
    pub height_cm: Option<u32>,
    pub weight_kg: Option<f64>,
    /// Soft-delete tombstone
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
