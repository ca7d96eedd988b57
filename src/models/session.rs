// SPDX-License-Identifier: MIT

//! Training session model and its status lifecycle.
//!
//! Status transitions are one-directional: `scheduled → in_progress →
//! completed`, with `cancelled` reachable from the two non-terminal states.
//! "Deleting" a session means cancelling it; rows are never removed so
//! payment and session-count history stays auditable. The paid flag is
//! independent of status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Training session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Whether sessions in this status count toward billing and can consume
    /// payments. Cancelled sessions never do.
    pub fn is_billable(self) -> bool {
        !matches!(self, SessionStatus::Cancelled)
    }

    /// Whether this status admits no further status transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

/// A scheduled training appointment for one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
    /// Document id
    pub id: u64,
    /// Owning trainer
    pub trainer_id: u64,
    /// Client being trained
    pub client_id: u64,
    /// Training venue (optional)
    pub location_id: Option<u64>,
    /// Set when this session belongs to a multi-client group
    pub session_group_id: Option<u64>,
    /// Appointment time
    pub scheduled_at: DateTime<Utc>,
    /// When the session actually started
    pub started_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub status: SessionStatus,
    /// Payment tracking (independent of status)
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    /// Free-text session documentation; may hold a JSON object with
    /// per-client notes (see [`TrainingSession::set_client_notes`])
    pub session_doc: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingSession {
    /// Create a session in `scheduled` state.
    #[allow(clippy::too_many_arguments)]
    pub fn new_scheduled(
        id: u64,
        trainer_id: u64,
        client_id: u64,
        location_id: Option<u64>,
        session_group_id: Option<u64>,
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            trainer_id,
            client_id,
            location_id,
            session_group_id,
            scheduled_at,
            started_at: None,
            duration_minutes,
            status: SessionStatus::Scheduled,
            is_paid: false,
            paid_at: None,
            session_doc: None,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_billable(&self) -> bool {
        self.status.is_billable()
    }

    /// Transition to `in_progress` and stamp `started_at`.
    ///
    /// Re-starting an already in-progress session is not guarded; callers
    /// that need exactly-once semantics must check the status first.
    /// Terminal sessions cannot be started.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        if self.status.is_terminal() {
            return Err(SessionStateError::Terminal(self.status));
        }
        self.status = SessionStatus::InProgress;
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Transition to `completed`. Terminal sessions cannot be completed
    /// again.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        if self.status.is_terminal() {
            return Err(SessionStateError::Terminal(self.status));
        }
        self.status = SessionStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Cancel the session (soft delete). Idempotent: cancelling an already
    /// cancelled session leaves it cancelled; a completed session keeps its
    /// status. Returns whether the status actually changed.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        match self.status {
            SessionStatus::Scheduled | SessionStatus::InProgress => {
                self.status = SessionStatus::Cancelled;
                self.updated_at = now;
                true
            }
            SessionStatus::Completed | SessionStatus::Cancelled => false,
        }
    }

    /// Flip the paid flag, stamping or clearing `paid_at`.
    pub fn toggle_paid(&mut self, now: DateTime<Utc>) {
        self.is_paid = !self.is_paid;
        self.paid_at = if self.is_paid { Some(now) } else { None };
        self.updated_at = now;
    }

    /// Mark the session paid (payment reconciliation path).
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.is_paid = true;
        self.paid_at = Some(now);
        self.updated_at = now;
    }

    /// Merge per-client notes into the JSON-encoded `session_doc`.
    ///
    /// A legacy free-text `session_doc` is preserved under `general_notes`.
    pub fn set_client_notes(
        &mut self,
        client_id: u64,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<(), serde_json::Error> {
        let mut doc: serde_json::Map<String, serde_json::Value> = match self.session_doc.as_deref()
        {
            Some(raw) => match serde_json::from_str(raw) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => {
                    let mut map = serde_json::Map::new();
                    map.insert("general_notes".to_string(), raw.into());
                    map
                }
            },
            None => serde_json::Map::new(),
        };

        let client_notes = doc
            .entry("client_notes".to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if !client_notes.is_object() {
            *client_notes = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = client_notes.as_object_mut() {
            map.insert(client_id.to_string(), notes.into());
        }

        self.session_doc = Some(serde_json::to_string(&doc)?);
        self.updated_at = now;
        Ok(())
    }
}

/// Rejected status transition.
#[derive(Debug, thiserror::Error)]
pub enum SessionStateError {
    #[error("session is already {0:?} and cannot change state")]
    Terminal(SessionStatus),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn scheduled_session() -> TrainingSession {
        TrainingSession::new_scheduled(1, 10, 100, None, None, now(), 60, None, now())
    }

    #[test]
    fn test_start_from_scheduled() {
        let mut session = scheduled_session();
        session.start(now()).unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.started_at, Some(now()));
    }

    #[test]
    fn test_start_rejected_after_cancel() {
        let mut session = scheduled_session();
        assert!(session.cancel(now()));
        assert!(session.start(now()).is_err());
        assert_eq!(session.status, SessionStatus::Cancelled);
    }

    #[test]
    fn test_complete_from_in_progress() {
        let mut session = scheduled_session();
        session.start(now()).unwrap();
        session.complete(now()).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[test]
    fn test_complete_rejected_after_cancel() {
        let mut session = scheduled_session();
        session.cancel(now());
        assert!(session.complete(now()).is_err());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut session = scheduled_session();
        assert!(session.cancel(now()));
        assert!(!session.cancel(now()));
        assert_eq!(session.status, SessionStatus::Cancelled);
    }

    #[test]
    fn test_cancel_leaves_completed_alone() {
        let mut session = scheduled_session();
        session.status = SessionStatus::Completed;
        assert!(!session.cancel(now()));
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[test]
    fn test_toggle_paid_round_trip() {
        let mut session = scheduled_session();
        session.toggle_paid(now());
        assert!(session.is_paid);
        assert_eq!(session.paid_at, Some(now()));

        session.toggle_paid(now());
        assert!(!session.is_paid);
        assert_eq!(session.paid_at, None);
    }

    #[test]
    fn test_paid_while_scheduled_is_allowed() {
        let mut session = scheduled_session();
        session.mark_paid(now());
        assert!(session.is_paid);
        assert_eq!(session.status, SessionStatus::Scheduled);
    }

    #[test]
    fn test_cancelled_is_not_billable() {
        let mut session = scheduled_session();
        session.cancel(now());
        assert!(!session.is_billable());
    }

    #[test]
    fn test_client_notes_merge_into_empty_doc() {
        let mut session = scheduled_session();
        session.set_client_notes(100, "good form today", now()).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(session.session_doc.as_deref().unwrap()).unwrap();
        assert_eq!(doc["client_notes"]["100"], "good form today");
    }

    #[test]
    fn test_client_notes_preserve_legacy_text() {
        let mut session = scheduled_session();
        session.session_doc = Some("plain old notes".to_string());
        session.set_client_notes(7, "stretching", now()).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(session.session_doc.as_deref().unwrap()).unwrap();
        assert_eq!(doc["general_notes"], "plain old notes");
        assert_eq!(doc["client_notes"]["7"], "stretching");
    }

    #[test]
    fn test_client_notes_overwrite_same_client() {
        let mut session = scheduled_session();
        session.set_client_notes(5, "first", now()).unwrap();
        session.set_client_notes(5, "second", now()).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(session.session_doc.as_deref().unwrap()).unwrap();
        assert_eq!(doc["client_notes"]["5"], "second");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
