// SPDX-License-Identifier: MIT

//! Active session resolution.
//!
//! A trainer works from their phone between clients, so "what am I training
//! right now" must be answerable without knowing session IDs. Two pure
//! functions implement the rules; the route handlers feed them rows loaded
//! from the database:
//!
//! - [`find_session_near`] matches a client's scheduled session against the
//!   current wall clock within a tolerance window, so starting a session
//!   reuses the planned appointment instead of creating a duplicate.
//! - [`resolve_active`] picks the one thing to show when several sessions
//!   are in progress at once (a stale forgotten session plus a fresh group,
//!   for example): whichever was entered most recently wins, and a group
//!   beats a standalone session on ties.

use crate::models::{SessionGroup, SessionStatus, TrainingSession};
use chrono::{DateTime, Duration, Utc};

/// Window for matching a scheduled session against "now".
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 15;

/// The resolved active appointment.
#[derive(Debug, Clone)]
pub enum ActiveSession {
    Single(TrainingSession),
    Group {
        group: SessionGroup,
        sessions: Vec<TrainingSession>,
    },
}

/// Find the scheduled session nearest `now`: within the tolerance window,
/// earliest appointment first. Sessions already started, completed or
/// cancelled never match.
pub fn nearest_scheduled<'a>(
    sessions: &'a [TrainingSession],
    now: DateTime<Utc>,
    tolerance: Duration,
) -> Option<&'a TrainingSession> {
    sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Scheduled)
        .filter(|s| (s.scheduled_at - now).abs() <= tolerance)
        .min_by_key(|s| s.scheduled_at)
}

/// Like [`nearest_scheduled`], restricted to one client's sessions. Used by
/// the start flow to reuse a planned appointment instead of creating a
/// duplicate.
pub fn find_session_near<'a>(
    sessions: &'a [TrainingSession],
    client_id: u64,
    now: DateTime<Utc>,
    tolerance: Duration,
) -> Option<&'a TrainingSession> {
    sessions
        .iter()
        .filter(|s| s.client_id == client_id && s.status == SessionStatus::Scheduled)
        .filter(|s| (s.scheduled_at - now).abs() <= tolerance)
        .min_by_key(|s| s.scheduled_at)
}

/// Pick the active appointment among in-progress work.
///
/// `standalone` holds in-progress sessions that do not belong to a group;
/// `groups` holds groups that have at least one in-progress child session.
/// The most recently entered one wins: standalone sessions compare by
/// `started_at`, groups by their slot time. A group beats a standalone
/// session when the comparison ties.
pub fn resolve_active(
    standalone: Vec<TrainingSession>,
    groups: Vec<(SessionGroup, Vec<TrainingSession>)>,
) -> Option<ActiveSession> {
    let newest_single = standalone
        .into_iter()
        .max_by_key(|s| s.started_at.unwrap_or(s.scheduled_at));
    let newest_group = groups.into_iter().max_by_key(|(g, _)| g.scheduled_at);

    match (newest_single, newest_group) {
        (None, None) => None,
        (Some(session), None) => Some(ActiveSession::Single(session)),
        (None, Some((group, sessions))) => Some(ActiveSession::Group { group, sessions }),
        (Some(session), Some((group, sessions))) => {
            let single_key = session.started_at.unwrap_or(session.scheduled_at);
            if group.scheduled_at >= single_key {
                Some(ActiveSession::Group { group, sessions })
            } else {
                Some(ActiveSession::Single(session))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    fn scheduled(id: u64, client_id: u64, scheduled_at: DateTime<Utc>) -> TrainingSession {
        TrainingSession::new_scheduled(id, 1, client_id, None, None, scheduled_at, 60, None, at(0, 0))
    }

    fn in_progress(id: u64, started_at: DateTime<Utc>) -> TrainingSession {
        let mut session = scheduled(id, 100, started_at);
        session.start(started_at).unwrap();
        session
    }

    fn group(id: u64, scheduled_at: DateTime<Utc>) -> SessionGroup {
        SessionGroup::new(id, 1, None, scheduled_at, 60, None, at(0, 0))
    }

    fn tolerance() -> Duration {
        Duration::minutes(DEFAULT_TOLERANCE_MINUTES)
    }

    #[test]
    fn test_near_match_within_tolerance() {
        let sessions = vec![scheduled(1, 7, at(10, 10))];
        let found = find_session_near(&sessions, 7, at(10, 0), tolerance());
        assert_eq!(found.map(|s| s.id), Some(1));
    }

    #[test]
    fn test_near_match_rejects_outside_tolerance() {
        let sessions = vec![scheduled(1, 7, at(10, 16))];
        assert!(find_session_near(&sessions, 7, at(10, 0), tolerance()).is_none());
    }

    #[test]
    fn test_near_match_picks_earliest_in_window() {
        let sessions = vec![scheduled(1, 7, at(9, 50)), scheduled(2, 7, at(10, 5))];
        let found = find_session_near(&sessions, 7, at(10, 0), tolerance());
        assert_eq!(found.map(|s| s.id), Some(1));
    }

    #[test]
    fn test_near_match_is_per_client() {
        let sessions = vec![scheduled(1, 7, at(10, 0))];
        assert!(find_session_near(&sessions, 8, at(10, 0), tolerance()).is_none());
    }

    #[test]
    fn test_near_match_ignores_started_sessions() {
        let sessions = vec![in_progress(1, at(10, 0))];
        assert!(find_session_near(&sessions, 100, at(10, 0), tolerance()).is_none());
    }

    #[test]
    fn test_nearest_scheduled_across_clients() {
        let sessions = vec![scheduled(1, 7, at(10, 2)), scheduled(2, 8, at(9, 50))];
        let found = nearest_scheduled(&sessions, at(10, 0), tolerance());
        assert_eq!(found.map(|s| s.id), Some(2));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve_active(vec![], vec![]).is_none());
    }

    #[test]
    fn test_resolve_single_only() {
        let resolved = resolve_active(vec![in_progress(1, at(10, 0))], vec![]);
        assert!(matches!(resolved, Some(ActiveSession::Single(s)) if s.id == 1));
    }

    #[test]
    fn test_newer_group_beats_stale_single() {
        // A session started in the morning was never completed; the group
        // that started later is what the trainer is actually running.
        let stale = in_progress(1, at(8, 0));
        let g = group(50, at(11, 0));
        let children = vec![in_progress(2, at(11, 0)), in_progress(3, at(11, 0))];

        let resolved = resolve_active(vec![stale], vec![(g, children)]);
        assert!(matches!(
            resolved,
            Some(ActiveSession::Group { group, .. }) if group.id == 50
        ));
    }

    #[test]
    fn test_newer_single_beats_stale_group() {
        let fresh = in_progress(1, at(15, 0));
        let g = group(50, at(9, 0));
        let children = vec![in_progress(2, at(9, 0))];

        let resolved = resolve_active(vec![fresh], vec![(g, children)]);
        assert!(matches!(resolved, Some(ActiveSession::Single(s)) if s.id == 1));
    }

    #[test]
    fn test_tie_prefers_group() {
        let single = in_progress(1, at(10, 0));
        let g = group(50, at(10, 0));
        let children = vec![in_progress(2, at(10, 0))];

        let resolved = resolve_active(vec![single], vec![(g, children)]);
        assert!(matches!(
            resolved,
            Some(ActiveSession::Group { group, .. }) if group.id == 50
        ));
    }

    #[test]
    fn test_newest_of_several_groups_wins() {
        let early = group(50, at(9, 0));
        let late = group(51, at(12, 0));
        let resolved = resolve_active(
            vec![],
            vec![
                (early, vec![in_progress(2, at(9, 0))]),
                (late, vec![in_progress(3, at(12, 0))]),
            ],
        );
        assert!(matches!(
            resolved,
            Some(ActiveSession::Group { group, .. }) if group.id == 51
        ));
    }
}
