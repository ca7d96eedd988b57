// SPDX-License-Identifier: MIT

//! Payment ledger model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ledger entry: a client paid for a number of sessions.
///
/// The ledger is append-only. Payment application (which sessions a payment
/// covers) is recorded on the sessions themselves, so entries are never
/// edited after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    pub client_id: u64,
    pub trainer_id: u64,
    /// Number of sessions this payment covers
    pub sessions_paid: u32,
    /// Amount in Colombian pesos
    pub amount_cop: u64,
    /// When the money changed hands (defaults to recording time)
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        client_id: u64,
        trainer_id: u64,
        sessions_paid: u32,
        amount_cop: u64,
        payment_date: Option<DateTime<Utc>>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client_id,
            trainer_id,
            sessions_paid,
            amount_cop,
            payment_date: payment_date.unwrap_or(now),
            notes,
            created_at: now,
        }
    }
}
