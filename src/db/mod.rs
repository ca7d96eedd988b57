// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const TRAINERS: &str = "trainers";
    pub const TRAINER_APPS: &str = "trainer_apps";
    pub const CLIENTS: &str = "clients";
    pub const LOCATIONS: &str = "locations";
    pub const SESSIONS: &str = "training_sessions";
    pub const SESSION_GROUPS: &str = "session_groups";
    pub const EXERCISE_TEMPLATES: &str = "exercise_templates";
    pub const SESSION_EXERCISES: &str = "session_exercises";
    pub const EXERCISE_SETS: &str = "exercise_sets";
    pub const PAYMENTS: &str = "payments";
}
