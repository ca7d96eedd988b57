// SPDX-License-Identifier: MIT

//! Session group model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A set of training sessions sharing one time slot and location, used for
/// multi-client appointments. Each child session references the group via
/// `session_group_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGroup {
    pub id: u64,
    /// Owning trainer
    pub trainer_id: u64,
    pub location_id: Option<u64>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionGroup {
    pub fn new(
        id: u64,
        trainer_id: u64,
        location_id: Option<u64>,
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            trainer_id,
            location_id,
            scheduled_at,
            duration_minutes,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}
