// SPDX-License-Identifier: MIT

//! Payment reconciliation.
//!
//! Clients pay for blocks of sessions, often in advance and often late.
//! Recording a payment marks the oldest unpaid billable sessions as paid
//! (oldest first, by appointment time); anything the payment covers beyond
//! existing sessions stays as prepaid balance, derived on demand from the
//! ledger and the sessions on record rather than stored.

use crate::models::{Payment, TrainingSession};
use serde::Serialize;

/// A client's derived payment position.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentBalance {
    /// Billable (non-cancelled) sessions on record
    pub total_sessions: u32,
    pub paid_sessions: u32,
    pub unpaid_sessions: u32,
    /// Sessions paid for but not yet scheduled
    pub prepaid_sessions: u32,
    pub has_positive_balance: bool,
    /// Lifetime amount received, Colombian pesos
    pub total_amount_paid_cop: u64,
}

/// Select the sessions a new payment covers: the oldest unpaid billable
/// sessions, up to `count`. Returns indices into `sessions` so the caller
/// can mark and persist the originals.
pub fn select_unpaid_fifo(sessions: &[TrainingSession], count: u32) -> Vec<usize> {
    let mut unpaid: Vec<usize> = sessions
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_billable() && !s.is_paid)
        .map(|(i, _)| i)
        .collect();
    unpaid.sort_by_key(|&i| sessions[i].scheduled_at);
    unpaid.truncate(count as usize);
    unpaid
}

/// Derive a client's balance from their sessions and payment ledger.
///
/// `prepaid_sessions` is the ledger total minus every billable session on
/// record, paid or not: a newly scheduled session consumes credit the moment
/// it exists, even before the FIFO marking catches up. Clamped at zero so a
/// manual paid toggle without a ledger entry never underflows.
pub fn compute_balance(sessions: &[TrainingSession], payments: &[Payment]) -> PaymentBalance {
    let billable: Vec<&TrainingSession> = sessions.iter().filter(|s| s.is_billable()).collect();

    let total_sessions = billable.len() as u32;
    let paid_sessions = billable.iter().filter(|s| s.is_paid).count() as u32;
    let unpaid_sessions = total_sessions - paid_sessions;

    let sessions_paid_for: u32 = payments.iter().map(|p| p.sessions_paid).sum();
    let prepaid_sessions = sessions_paid_for.saturating_sub(total_sessions);
    let total_amount_paid_cop: u64 = payments.iter().map(|p| p.amount_cop).sum();

    PaymentBalance {
        total_sessions,
        paid_sessions,
        unpaid_sessions,
        prepaid_sessions,
        has_positive_balance: prepaid_sessions > 0,
        total_amount_paid_cop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap()
    }

    fn session(id: u64, day: u32) -> TrainingSession {
        TrainingSession::new_scheduled(id, 1, 7, None, None, at(day), 60, None, at(1))
    }

    fn paid_session(id: u64, day: u32) -> TrainingSession {
        let mut s = session(id, day);
        s.mark_paid(at(day));
        s
    }

    fn cancelled_session(id: u64, day: u32) -> TrainingSession {
        let mut s = session(id, day);
        s.cancel(at(day));
        s
    }

    fn payment(id: u64, sessions_paid: u32, amount_cop: u64) -> Payment {
        Payment::new(id, 7, 1, sessions_paid, amount_cop, None, None, at(1))
    }

    #[test]
    fn test_fifo_marks_oldest_first() {
        // Out of storage order on purpose
        let sessions = vec![session(3, 20), session(1, 5), session(2, 12)];
        let picked = select_unpaid_fifo(&sessions, 2);
        let ids: Vec<u64> = picked.iter().map(|&i| sessions[i].id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_fifo_skips_paid_and_cancelled() {
        let sessions = vec![
            paid_session(1, 5),
            cancelled_session(2, 8),
            session(3, 12),
            session(4, 20),
        ];
        let picked = select_unpaid_fifo(&sessions, 10);
        let ids: Vec<u64> = picked.iter().map(|&i| sessions[i].id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_fifo_truncates_to_count() {
        let sessions = vec![session(1, 5), session(2, 12), session(3, 20)];
        assert_eq!(select_unpaid_fifo(&sessions, 1).len(), 1);
    }

    #[test]
    fn test_overpayment_becomes_prepaid_balance() {
        // Pay for 5 with only 2 sessions on the books
        let mut sessions = vec![session(1, 5), session(2, 12)];
        for &i in &select_unpaid_fifo(&sessions, 5) {
            sessions[i].mark_paid(at(15));
        }
        let balance = compute_balance(&sessions, &[payment(1, 5, 500_000)]);

        assert_eq!(balance.paid_sessions, 2);
        assert_eq!(balance.unpaid_sessions, 0);
        assert_eq!(balance.prepaid_sessions, 3);
        assert!(balance.has_positive_balance);
        assert_eq!(balance.total_amount_paid_cop, 500_000);
    }

    #[test]
    fn test_new_sessions_consume_prepaid_balance() {
        // Pay for 5, two sessions marked paid, then a third gets scheduled.
        // The credit covers it already, so prepaid drops to 2 while the
        // session itself still shows as unpaid until the next FIFO marking.
        let mut sessions = vec![session(1, 5), session(2, 12)];
        for &i in &select_unpaid_fifo(&sessions, 5) {
            sessions[i].mark_paid(at(15));
        }
        sessions.push(session(3, 20));
        let balance = compute_balance(&sessions, &[payment(1, 5, 500_000)]);

        assert_eq!(balance.total_sessions, 3);
        assert_eq!(balance.paid_sessions, 2);
        assert_eq!(balance.unpaid_sessions, 1);
        assert_eq!(balance.prepaid_sessions, 2);
    }

    #[test]
    fn test_balance_conserved_across_payments() {
        // sessions_paid total == paid sessions + prepaid, regardless of how
        // payments are split up
        let mut sessions = vec![session(1, 5), session(2, 12), session(3, 20)];
        let ledger = vec![payment(1, 2, 200_000), payment(2, 3, 300_000)];
        for p in &ledger {
            for &i in &select_unpaid_fifo(&sessions, p.sessions_paid) {
                sessions[i].mark_paid(at(25));
            }
        }
        let balance = compute_balance(&sessions, &ledger);

        assert_eq!(balance.paid_sessions + balance.prepaid_sessions, 5);
        assert_eq!(balance.total_amount_paid_cop, 500_000);
    }

    #[test]
    fn test_cancelled_sessions_never_consume_payment() {
        let sessions = vec![cancelled_session(1, 5), cancelled_session(2, 8)];
        assert!(select_unpaid_fifo(&sessions, 3).is_empty());

        let balance = compute_balance(&sessions, &[payment(1, 3, 300_000)]);
        assert_eq!(balance.total_sessions, 0);
        assert_eq!(balance.prepaid_sessions, 3);
    }

    #[test]
    fn test_manual_toggle_does_not_underflow_balance() {
        // Session toggled paid by hand with no ledger entry
        let sessions = vec![paid_session(1, 5)];
        let balance = compute_balance(&sessions, &[]);
        assert_eq!(balance.prepaid_sessions, 0);
        assert!(!balance.has_positive_balance);
    }
}
