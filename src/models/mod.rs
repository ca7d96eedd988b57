// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod client;
pub mod exercise;
pub mod location;
pub mod payment;
pub mod session;
pub mod session_group;
pub mod trainer;

pub use client::Client;
pub use exercise::{ExerciseParent, ExerciseSet, ExerciseTemplate, SessionExercise};
pub use location::{Location, LocationType};
pub use payment::Payment;
pub use session::{SessionStatus, TrainingSession};
pub use session_group::SessionGroup;
pub use trainer::{Trainer, TrainerApp};
