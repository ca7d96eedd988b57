// SPDX-License-Identifier: MIT

//! Training session routes: CRUD, lifecycle transitions, session groups and
//! the active-session flow.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::exercise::ExerciseData;
use crate::models::{
    ExerciseParent, SessionExercise, SessionGroup, SessionStatus, TrainingSession,
};
use crate::services::active_session::{
    find_session_near, nearest_scheduled, resolve_active, ActiveSession,
    DEFAULT_TOLERANCE_MINUTES,
};
use crate::services::aggregation::LAP_CAPTURE_NAME;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/stats", get(session_stats))
        .route("/api/sessions/current", get(current_session))
        .route("/api/sessions/active", get(get_active))
        .route("/api/sessions/active/start", post(start_active))
        .route("/api/sessions/groups", get(list_groups).post(create_group))
        .route(
            "/api/sessions/groups/{id}",
            get(get_group).delete(delete_group),
        )
        .route(
            "/api/sessions/{id}",
            get(get_session).put(update_session).delete(cancel_session),
        )
        .route("/api/sessions/{id}/start", post(start_session))
        .route("/api/sessions/{id}/complete", post(complete_session))
        .route("/api/sessions/{id}/payment", patch(toggle_payment))
        .route("/api/sessions/{id}/client-notes", patch(set_client_notes))
        .route("/api/sessions/{id}/lap-times", post(record_lap_times))
}

async fn session_owned_by(
    state: &AppState,
    session_id: u64,
    trainer_id: u64,
) -> Result<TrainingSession> {
    let session = state
        .db
        .get_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
    if session.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(session)
}

async fn group_owned_by(state: &AppState, group_id: u64, trainer_id: u64) -> Result<SessionGroup> {
    let group = state
        .db
        .get_group(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session group {} not found", group_id)))?;
    if group.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(group)
}

async fn client_owned_by(state: &AppState, client_id: u64, trainer_id: u64) -> Result<()> {
    let client = state
        .db
        .get_client(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", client_id)))?;
    if client.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn parse_rfc3339(raw: &str, param: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid '{}' parameter: must be RFC3339 datetime",
                param
            ))
        })
}

// ─── Listing and CRUD ────────────────────────────────────────

#[derive(Deserialize)]
struct ListSessionsQuery {
    /// Lower bound on scheduled_at (RFC3339)
    from: Option<String>,
    /// Upper bound on scheduled_at (RFC3339)
    to: Option<String>,
    /// Filter by status
    status: Option<SessionStatus>,
    /// Filter by client
    client_id: Option<u64>,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<TrainingSession>>> {
    let from = query.from.as_deref().map(|r| parse_rfc3339(r, "from")).transpose()?;
    let to = query.to.as_deref().map(|r| parse_rfc3339(r, "to")).transpose()?;

    let mut sessions = state.db.list_sessions_for_trainer(auth.trainer_id).await?;
    if let Some(from) = from {
        sessions.retain(|s| s.scheduled_at >= from);
    }
    if let Some(to) = to {
        sessions.retain(|s| s.scheduled_at <= to);
    }
    if let Some(status) = query.status {
        sessions.retain(|s| s.status == status);
    }
    if let Some(client_id) = query.client_id {
        sessions.retain(|s| s.client_id == client_id);
    }

    Ok(Json(sessions))
}

#[derive(Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub client_id: u64,
    pub location_id: Option<u64>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 10, max = 480))]
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<TrainingSession>)> {
    payload.validate()?;
    client_owned_by(&state, payload.client_id, auth.trainer_id).await?;

    let session = TrainingSession::new_scheduled(
        generate_id()?,
        auth.trainer_id,
        payload.client_id,
        payload.location_id,
        None,
        payload.scheduled_at,
        payload.duration_minutes,
        payload.notes,
        chrono::Utc::now(),
    );
    state.db.upsert_session(&session).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<Json<TrainingSession>> {
    let session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    Ok(Json(session))
}

#[derive(Deserialize, Validate)]
pub struct UpdateSessionRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 10, max = 480))]
    pub duration_minutes: Option<u32>,
    pub location_id: Option<u64>,
    pub notes: Option<String>,
}

async fn update_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<TrainingSession>> {
    payload.validate()?;

    let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    if let Some(scheduled_at) = payload.scheduled_at {
        session.scheduled_at = scheduled_at;
    }
    if let Some(duration_minutes) = payload.duration_minutes {
        session.duration_minutes = duration_minutes;
    }
    if let Some(location_id) = payload.location_id {
        session.location_id = Some(location_id);
    }
    if let Some(notes) = payload.notes {
        session.notes = Some(notes);
    }
    session.updated_at = chrono::Utc::now();
    state.db.upsert_session(&session).await?;

    Ok(Json(session))
}

/// "Delete" a session: cancel it, keep the row for billing history.
async fn cancel_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<StatusCode> {
    let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    if session.cancel(chrono::Utc::now()) {
        state.db.upsert_session(&session).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ─── Lifecycle Transitions ───────────────────────────────────

async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<Json<TrainingSession>> {
    let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    session
        .start(chrono::Utc::now())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.db.upsert_session(&session).await?;
    Ok(Json(session))
}

async fn complete_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<Json<TrainingSession>> {
    let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    session
        .complete(chrono::Utc::now())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.db.upsert_session(&session).await?;
    Ok(Json(session))
}

/// Toggle the paid flag (manual correction path; bulk payments go through
/// the client payments endpoint).
async fn toggle_payment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<Json<TrainingSession>> {
    let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    session.toggle_paid(chrono::Utc::now());
    state.db.upsert_session(&session).await?;
    Ok(Json(session))
}

#[derive(Deserialize, Validate)]
pub struct ClientNotesRequest {
    pub client_id: u64,
    #[validate(length(max = 10000))]
    pub notes: String,
}

async fn set_client_notes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
    Json(payload): Json<ClientNotesRequest>,
) -> Result<Json<TrainingSession>> {
    payload.validate()?;

    let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
    session
        .set_client_notes(payload.client_id, &payload.notes, chrono::Utc::now())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("session_doc encoding failed: {}", e)))?;
    state.db.upsert_session(&session).await?;
    Ok(Json(session))
}

#[derive(Deserialize, Validate)]
pub struct LapTimesRequest {
    #[validate(length(min = 1))]
    pub lap_times_ms: Vec<u64>,
}

/// Record a BMX lap-time capture as a session exercise.
async fn record_lap_times(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
    Json(payload): Json<LapTimesRequest>,
) -> Result<(StatusCode, Json<SessionExercise>)> {
    payload.validate()?;
    session_owned_by(&state, session_id, auth.trainer_id).await?;

    let existing = state.db.list_exercises_for_session(session_id).await?;
    let next_index = existing.iter().map(|e| e.order_index + 1).max().unwrap_or(0);

    let mut data = ExerciseData::new();
    data.insert(
        "lap_times_ms".to_string(),
        serde_json::Value::from(payload.lap_times_ms),
    );

    let exercise = SessionExercise::new(
        generate_id()?,
        ExerciseParent::Session(session_id),
        None,
        None,
        Some(LAP_CAPTURE_NAME.to_string()),
        data,
        next_index,
        chrono::Utc::now(),
    );
    state.db.upsert_exercise(&exercise).await?;

    Ok((StatusCode::CREATED, Json(exercise)))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionStats {
    pub total: u32,
    pub scheduled: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub cancelled: u32,
    pub paid: u32,
    pub unpaid: u32,
    /// Distinct clients with at least one non-cancelled session
    pub active_clients: u32,
}

async fn session_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
) -> Result<Json<SessionStats>> {
    let sessions = state.db.list_sessions_for_trainer(auth.trainer_id).await?;

    let count = |status: SessionStatus| sessions.iter().filter(|s| s.status == status).count() as u32;
    let billable = sessions.iter().filter(|s| s.is_billable());
    let active_clients: std::collections::HashSet<u64> = sessions
        .iter()
        .filter(|s| s.is_billable())
        .map(|s| s.client_id)
        .collect();

    Ok(Json(SessionStats {
        total: sessions.len() as u32,
        scheduled: count(SessionStatus::Scheduled),
        in_progress: count(SessionStatus::InProgress),
        completed: count(SessionStatus::Completed),
        cancelled: count(SessionStatus::Cancelled),
        paid: billable.clone().filter(|s| s.is_paid).count() as u32,
        unpaid: billable.filter(|s| !s.is_paid).count() as u32,
        active_clients: active_clients.len() as u32,
    }))
}

// ─── Current / Active Session ────────────────────────────────

#[derive(Deserialize)]
struct CurrentSessionQuery {
    tolerance_minutes: Option<i64>,
}

fn tolerance_from(minutes: Option<i64>) -> Result<Duration> {
    let minutes = minutes.unwrap_or(DEFAULT_TOLERANCE_MINUTES);
    if !(1..=24 * 60).contains(&minutes) {
        return Err(AppError::BadRequest(
            "tolerance_minutes must be between 1 and 1440".to_string(),
        ));
    }
    Ok(Duration::minutes(minutes))
}

/// The scheduled session closest to now, if any falls inside the window.
async fn current_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Query(query): Query<CurrentSessionQuery>,
) -> Result<Json<Option<TrainingSession>>> {
    let tolerance = tolerance_from(query.tolerance_minutes)?;
    let sessions = state.db.list_scheduled_sessions(auth.trainer_id).await?;
    let nearest = nearest_scheduled(&sessions, chrono::Utc::now(), tolerance);
    Ok(Json(nearest.cloned()))
}

/// Response shape for active-session endpoints: either a plain session or a
/// group with its sessions.
#[derive(Serialize)]
#[serde(untagged)]
pub enum ActiveResponse {
    Single(TrainingSession),
    Group {
        group: SessionGroup,
        sessions: Vec<TrainingSession>,
    },
}

/// What is this trainer doing right now?
async fn get_active(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
) -> Result<Json<Option<ActiveResponse>>> {
    let in_progress = state.db.list_in_progress_sessions(auth.trainer_id).await?;

    let mut standalone = Vec::new();
    let mut grouped: HashMap<u64, Vec<TrainingSession>> = HashMap::new();
    for session in in_progress {
        match session.session_group_id {
            Some(group_id) => grouped.entry(group_id).or_default().push(session),
            None => standalone.push(session),
        }
    }

    let mut groups = Vec::new();
    for (group_id, sessions) in grouped {
        // A dangling group id on an in-progress session is corrupt data;
        // skip it rather than failing the whole lookup.
        match state.db.get_group(group_id).await? {
            Some(group) => groups.push((group, sessions)),
            None => tracing::warn!(group_id, "In-progress session references missing group"),
        }
    }

    let response = match resolve_active(standalone, groups) {
        None => None,
        Some(ActiveSession::Single(session)) => Some(ActiveResponse::Single(session)),
        Some(ActiveSession::Group { group, .. }) => {
            // Return every child session, not just the in-progress ones
            let sessions = state.db.list_sessions_in_group(group.id).await?;
            Some(ActiveResponse::Group { group, sessions })
        }
    };

    Ok(Json(response))
}

#[derive(Deserialize, Validate)]
pub struct StartActiveRequest {
    /// Start this specific session
    pub session_id: Option<u64>,
    /// Or start ad-hoc work for these clients
    #[serde(default)]
    pub client_ids: Vec<u64>,
    #[validate(range(min = 10, max = 480))]
    pub duration_minutes: Option<u32>,
    pub location_id: Option<u64>,
    pub notes: Option<String>,
}

/// Start active work: an existing session, one ad-hoc session, or a
/// multi-client group.
async fn start_active(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<StartActiveRequest>,
) -> Result<(StatusCode, Json<ActiveResponse>)> {
    payload.validate()?;

    let now = chrono::Utc::now();
    let duration_minutes = payload.duration_minutes.unwrap_or(60);

    if let Some(session_id) = payload.session_id {
        let mut session = session_owned_by(&state, session_id, auth.trainer_id).await?;
        session
            .start(now)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        state.db.upsert_session(&session).await?;
        // Nothing was created, the planned session just changed state
        return Ok((StatusCode::OK, Json(ActiveResponse::Single(session))));
    }

    if payload.client_ids.is_empty() {
        return Err(AppError::BadRequest(
            "Either session_id or a non-empty client_ids is required".to_string(),
        ));
    }
    for &client_id in &payload.client_ids {
        client_owned_by(&state, client_id, auth.trainer_id).await?;
    }

    let scheduled = state.db.list_scheduled_sessions(auth.trainer_id).await?;
    let tolerance = Duration::minutes(DEFAULT_TOLERANCE_MINUTES);

    // Exactly one client: a plain session, never a degenerate group
    if let [client_id] = payload.client_ids[..] {
        let mut session = match find_session_near(&scheduled, client_id, now, tolerance) {
            Some(planned) => planned.clone(),
            None => TrainingSession::new_scheduled(
                generate_id()?,
                auth.trainer_id,
                client_id,
                payload.location_id,
                None,
                now,
                duration_minutes,
                payload.notes.clone(),
                now,
            ),
        };
        session
            .start(now)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        state.db.upsert_session(&session).await?;
        return Ok((StatusCode::CREATED, Json(ActiveResponse::Single(session))));
    }

    // Two or more clients: one group, one in-progress session per client.
    // A client's planned near-now session is absorbed into the group
    // instead of leaving a duplicate behind.
    let group = SessionGroup::new(
        generate_id()?,
        auth.trainer_id,
        payload.location_id,
        now,
        duration_minutes,
        payload.notes.clone(),
        now,
    );
    state.db.upsert_group(&group).await?;

    let mut sessions = Vec::with_capacity(payload.client_ids.len());
    for &client_id in &payload.client_ids {
        let mut session = match find_session_near(&scheduled, client_id, now, tolerance) {
            Some(planned) => planned.clone(),
            None => TrainingSession::new_scheduled(
                generate_id()?,
                auth.trainer_id,
                client_id,
                payload.location_id,
                None,
                now,
                duration_minutes,
                None,
                now,
            ),
        };
        session.session_group_id = Some(group.id);
        session
            .start(now)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        state.db.upsert_session(&session).await?;
        sessions.push(session);
    }

    tracing::info!(
        group_id = group.id,
        clients = sessions.len(),
        "Started group session"
    );

    Ok((
        StatusCode::CREATED,
        Json(ActiveResponse::Group { group, sessions }),
    ))
}

// ─── Session Groups ──────────────────────────────────────────

#[derive(Deserialize)]
struct ListGroupsQuery {
    from: Option<String>,
    to: Option<String>,
}

async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Query(query): Query<ListGroupsQuery>,
) -> Result<Json<Vec<SessionGroup>>> {
    let from = query.from.as_deref().map(|r| parse_rfc3339(r, "from")).transpose()?;
    let to = query.to.as_deref().map(|r| parse_rfc3339(r, "to")).transpose()?;

    let mut groups = state.db.list_groups_for_trainer(auth.trainer_id).await?;
    if let Some(from) = from {
        groups.retain(|g| g.scheduled_at >= from);
    }
    if let Some(to) = to {
        groups.retain(|g| g.scheduled_at <= to);
    }

    Ok(Json(groups))
}

#[derive(Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 2))]
    pub client_ids: Vec<u64>,
    pub location_id: Option<u64>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 10, max = 480))]
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

/// Schedule a multi-client appointment: one group plus one scheduled
/// session per client.
async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<ActiveResponse>)> {
    payload.validate()?;
    for &client_id in &payload.client_ids {
        client_owned_by(&state, client_id, auth.trainer_id).await?;
    }

    let now = chrono::Utc::now();
    let group = SessionGroup::new(
        generate_id()?,
        auth.trainer_id,
        payload.location_id,
        payload.scheduled_at,
        payload.duration_minutes,
        payload.notes.clone(),
        now,
    );
    state.db.upsert_group(&group).await?;

    let mut sessions = Vec::with_capacity(payload.client_ids.len());
    for &client_id in &payload.client_ids {
        let session = TrainingSession::new_scheduled(
            generate_id()?,
            auth.trainer_id,
            client_id,
            payload.location_id,
            Some(group.id),
            payload.scheduled_at,
            payload.duration_minutes,
            None,
            now,
        );
        state.db.upsert_session(&session).await?;
        sessions.push(session);
    }

    Ok((
        StatusCode::CREATED,
        Json(ActiveResponse::Group { group, sessions }),
    ))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
) -> Result<Json<ActiveResponse>> {
    let group = group_owned_by(&state, group_id, auth.trainer_id).await?;
    let sessions = state.db.list_sessions_in_group(group_id).await?;
    Ok(Json(ActiveResponse::Group { group, sessions }))
}

/// "Delete" a group: cancel every child session atomically. The group row
/// and the cancelled sessions stay for billing history.
async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
) -> Result<StatusCode> {
    group_owned_by(&state, group_id, auth.trainer_id).await?;

    let now = chrono::Utc::now();
    let mut sessions = state.db.list_sessions_in_group(group_id).await?;
    sessions.retain_mut(|s| s.cancel(now));

    if !sessions.is_empty() {
        state.db.update_sessions_atomic(&sessions).await?;
    }

    tracing::info!(group_id, cancelled = sessions.len(), "Session group cancelled");

    Ok(StatusCode::NO_CONTENT)
}
