// SPDX-License-Identifier: MIT

//! Exercise templates, performed exercises and exercise sets.
//!
//! Session exercises and exercise sets attach to exactly one of a training
//! session or a session group, never both and never neither. The two
//! storage fields stay nullable for querying, but construction only goes
//! through [`ExerciseParent`], which makes the invariant unrepresentable at
//! the call sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discipline-specific open document (lap times, reps/series, ...).
///
/// The shape is described by the owning template's `field_schema` but is not
/// enforced by the storage layer.
pub type ExerciseData = serde_json::Map<String, serde_json::Value>;

/// The one parent an exercise or set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseParent {
    Session(u64),
    Group(u64),
}

impl ExerciseParent {
    fn split(self) -> (Option<u64>, Option<u64>) {
        match self {
            ExerciseParent::Session(id) => (Some(id), None),
            ExerciseParent::Group(id) => (None, Some(id)),
        }
    }

    fn from_fields(session_id: Option<u64>, session_group_id: Option<u64>) -> Option<Self> {
        match (session_id, session_group_id) {
            (Some(id), None) => Some(ExerciseParent::Session(id)),
            (None, Some(id)) => Some(ExerciseParent::Group(id)),
            _ => None,
        }
    }
}

/// Reusable exercise definition scoped to a trainer app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub id: u64,
    /// Owning trainer app
    pub trainer_app_id: u64,
    pub name: String,
    /// Discipline this template belongs to ("bmx", "physio", ...)
    pub discipline_type: String,
    /// Field definitions the discipline expects, e.g.
    /// `{"repeticiones": "int", "series": "int", "weight": "float"}`
    #[serde(default)]
    pub field_schema: ExerciseData,
    /// Incremented each time the template is attached to a performed exercise
    #[serde(default)]
    pub usage_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An exercise actually performed in a session or group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExercise {
    pub id: u64,
    /// Exactly one of `session_id`/`session_group_id` is set.
    pub session_id: Option<u64>,
    pub session_group_id: Option<u64>,
    /// Template this exercise was based on (None for ad-hoc exercises)
    pub exercise_template_id: Option<u64>,
    /// Owning exercise set, when part of a circuit
    pub exercise_set_id: Option<u64>,
    /// Name for ad-hoc exercises without a template
    pub custom_name: Option<String>,
    #[serde(default)]
    pub data: ExerciseData,
    /// Display order within the session/set
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
}

impl SessionExercise {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        parent: ExerciseParent,
        exercise_template_id: Option<u64>,
        exercise_set_id: Option<u64>,
        custom_name: Option<String>,
        data: ExerciseData,
        order_index: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let (session_id, session_group_id) = parent.split();
        Self {
            id,
            session_id,
            session_group_id,
            exercise_template_id,
            exercise_set_id,
            custom_name,
            data,
            order_index,
            created_at: now,
        }
    }

    /// The parent this exercise belongs to. `None` only for corrupt rows.
    pub fn parent(&self) -> Option<ExerciseParent> {
        ExerciseParent::from_fields(self.session_id, self.session_group_id)
    }
}

/// Groups exercises for circuit training; owns its exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: u64,
    /// Exactly one of `session_id`/`session_group_id` is set.
    pub session_id: Option<u64>,
    pub session_group_id: Option<u64>,
    pub name: String,
    /// Repeat count for the whole circuit
    pub series: u32,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExerciseSet {
    pub fn new(
        id: u64,
        parent: ExerciseParent,
        name: String,
        series: u32,
        order_index: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let (session_id, session_group_id) = parent.split();
        Self {
            id,
            session_id,
            session_group_id,
            name,
            series,
            order_index,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn parent(&self) -> Option<ExerciseParent> {
        ExerciseParent::from_fields(self.session_id, self.session_group_id)
    }
}
