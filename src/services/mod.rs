// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod active_session;
pub mod aggregation;
pub mod google_auth;
pub mod payments;

pub use google_auth::GoogleAuthService;
