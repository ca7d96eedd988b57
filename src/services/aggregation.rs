// SPDX-License-Identifier: MIT

//! Aggregation over recorded session exercises.
//!
//! Two read models are derived here:
//!
//! - **Lap times by location** (BMX): lap-time capture records are marked by
//!   the sentinel exercise name [`LAP_CAPTURE_NAME`] and carry a
//!   `lap_times_ms` array in their data payload. Stats are grouped by the
//!   session's location, with sessions that have no location collected
//!   under a placeholder bucket.
//! - **Exercise history** (physio): every named non-lap-capture exercise,
//!   newest session first, plus the distinct set of names seen so a client
//!   UI can build its filter from real data.
//!
//! Everything here is pure; route handlers load the rows and join them to
//! sessions/locations before calling in.

use crate::models::exercise::ExerciseData;
use crate::models::{SessionExercise, TrainingSession};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Sentinel exercise name marking a BMX lap-time capture record.
pub const LAP_CAPTURE_NAME: &str = "Toma de Tiempo BMX";

/// Bucket label for sessions without a location.
pub const NO_LOCATION_LABEL: &str = "Sin ubicación";

/// One lap-time capture joined to its session, input to the aggregation.
#[derive(Debug, Clone)]
pub struct LapCapture {
    pub session_id: u64,
    pub session_date: DateTime<Utc>,
    /// Session's location name; `None` lands in the placeholder bucket
    pub location_name: Option<String>,
    pub lap_times_ms: Vec<u64>,
}

/// Lap statistics for one session at a location.
#[derive(Debug, Clone, Serialize)]
pub struct SessionLapStats {
    pub session_id: u64,
    pub session_date: DateTime<Utc>,
    pub total_laps: u32,
    pub best_time_ms: u64,
    pub average_time_ms: u64,
    pub lap_times_ms: Vec<u64>,
}

/// Lap statistics for one location across all of a client's sessions.
#[derive(Debug, Clone, Serialize)]
pub struct LocationLapStats {
    pub location_name: String,
    pub total_laps: u32,
    pub best_time_ms: u64,
    pub average_time_ms: u64,
    /// Per-session breakdown, most recent session first
    pub sessions: Vec<SessionLapStats>,
}

/// Pull the `lap_times_ms` array out of a capture record's data payload.
/// Non-numeric entries are skipped rather than failing the whole record.
pub fn extract_lap_times(data: &ExerciseData) -> Vec<u64> {
    data.get("lap_times_ms")
        .and_then(|v| v.as_array())
        .map(|laps| laps.iter().filter_map(|v| v.as_u64()).collect())
        .unwrap_or_default()
}

fn lap_stats(laps: &[u64]) -> Option<(u32, u64, u64)> {
    if laps.is_empty() {
        return None;
    }
    let total = laps.len() as u32;
    let best = *laps.iter().min().unwrap_or(&0);
    let average = laps.iter().sum::<u64>() / laps.len() as u64;
    Some((total, best, average))
}

/// Aggregate lap captures into per-location statistics.
///
/// Captures with an empty lap array contribute nothing; a location whose
/// captures are all empty is omitted entirely, which also keeps the mean
/// well-defined. Locations are ordered by total lap count descending, ties
/// broken by name.
pub fn lap_times_by_location(captures: Vec<LapCapture>) -> Vec<LocationLapStats> {
    let mut by_location: BTreeMap<String, Vec<LapCapture>> = BTreeMap::new();
    for capture in captures {
        if capture.lap_times_ms.is_empty() {
            continue;
        }
        let bucket = capture
            .location_name
            .clone()
            .unwrap_or_else(|| NO_LOCATION_LABEL.to_string());
        by_location.entry(bucket).or_default().push(capture);
    }

    let mut locations: Vec<LocationLapStats> = by_location
        .into_iter()
        .filter_map(|(location_name, mut captures)| {
            captures.sort_by(|a, b| b.session_date.cmp(&a.session_date));

            let all_laps: Vec<u64> = captures
                .iter()
                .flat_map(|c| c.lap_times_ms.iter().copied())
                .collect();
            let (total_laps, best_time_ms, average_time_ms) = lap_stats(&all_laps)?;

            let sessions = captures
                .into_iter()
                .filter_map(|c| {
                    let (total, best, average) = lap_stats(&c.lap_times_ms)?;
                    Some(SessionLapStats {
                        session_id: c.session_id,
                        session_date: c.session_date,
                        total_laps: total,
                        best_time_ms: best,
                        average_time_ms: average,
                        lap_times_ms: c.lap_times_ms,
                    })
                })
                .collect();

            Some(LocationLapStats {
                location_name,
                total_laps,
                best_time_ms,
                average_time_ms,
                sessions,
            })
        })
        .collect();

    locations.sort_by(|a, b| {
        b.total_laps
            .cmp(&a.total_laps)
            .then_with(|| a.location_name.cmp(&b.location_name))
    });
    locations
}

/// One performed exercise joined to its session, input to history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub exercise_name: String,
    pub session_id: u64,
    pub session_date: DateTime<Utc>,
    pub data: ExerciseData,
}

/// Exercise history response: distinct names plus the filtered entries.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseHistory {
    pub exercises: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

/// Join recorded exercises to their sessions, keeping only rows the trainer
/// named by hand. Template-backed rows carry no `custom_name` and are a
/// different read model; they stay out of history entirely.
pub fn named_history_entries(
    sessions: &[TrainingSession],
    exercises: Vec<SessionExercise>,
) -> Vec<HistoryEntry> {
    let sessions_by_id: HashMap<u64, &TrainingSession> =
        sessions.iter().map(|s| (s.id, s)).collect();
    exercises
        .into_iter()
        .filter_map(|e| {
            let exercise_name = e.custom_name?;
            let session = sessions_by_id.get(&e.session_id?)?;
            Some(HistoryEntry {
                exercise_name,
                session_id: session.id,
                session_date: session.scheduled_at,
                data: e.data,
            })
        })
        .collect()
}

/// Build a client's exercise history from named non-lap-capture records.
///
/// `exercises` always lists every distinct name seen, even when `filter`
/// narrows `history` to one of them, so a caller can offer the full filter
/// choice alongside filtered results.
pub fn exercise_history(mut entries: Vec<HistoryEntry>, filter: Option<&str>) -> ExerciseHistory {
    entries.retain(|e| e.exercise_name != LAP_CAPTURE_NAME);

    let mut exercises: Vec<String> = entries.iter().map(|e| e.exercise_name.clone()).collect();
    exercises.sort();
    exercises.dedup();

    if let Some(name) = filter {
        entries.retain(|e| e.exercise_name == name);
    }
    entries.sort_by(|a, b| b.session_date.cmp(&a.session_date));

    ExerciseHistory {
        exercises,
        history: entries,
    }
}
