// SPDX-License-Identifier: MIT

//! Location model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    TrainerBase,
    ClientHome,
    Gym,
    Track,
    Other,
}

/// A training venue or spot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    /// Owning trainer
    pub trainer_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    // Address fields
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    // Geo coordinates
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub google_place_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
