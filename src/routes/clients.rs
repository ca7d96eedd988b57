// SPDX-License-Identifier: MIT

//! Client routes: CRUD, payments and per-client aggregations.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::{Client, Payment, TrainingSession};
use crate::services::aggregation::{
    self, exercise_history, lap_times_by_location, ExerciseHistory, LapCapture, LocationLapStats,
};
use crate::services::payments::{compute_balance, select_unpaid_fifo, PaymentBalance};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/clients/{id}/sessions", get(list_client_sessions))
        .route(
            "/api/clients/{id}/payments",
            get(list_payments).post(register_payment),
        )
        .route("/api/clients/{id}/payment-balance", get(payment_balance))
        .route(
            "/api/clients/{id}/lap-times-by-location",
            get(lap_times_for_client),
        )
        .route(
            "/api/clients/{id}/exercise-history",
            get(exercise_history_for_client),
        )
}

async fn client_owned_by(state: &AppState, client_id: u64, trainer_id: u64) -> Result<Client> {
    let client = state
        .db
        .get_client(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", client_id)))?;
    if client.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(client)
}

// ─── CRUD ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListClientsQuery {
    /// Include soft-deleted clients (audit views)
    #[serde(default)]
    include_deleted: bool,
}

async fn list_clients(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<Vec<Client>>> {
    let mut clients = state.db.list_clients_for_trainer(auth.trainer_id).await?;
    if !query.include_deleted {
        clients.retain(|c| !c.is_deleted());
    }
    Ok(Json(clients))
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
) -> Result<Json<Client>> {
    let client = client_owned_by(&state, client_id, auth.trainer_id).await?;
    Ok(Json(client))
}

#[derive(Deserialize, Validate)]
pub struct ClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub notes: Option<String>,
    pub default_location_id: Option<u64>,
    pub photo_url: Option<String>,
    pub birth_date: Option<chrono::DateTime<chrono::Utc>>,
    pub gender: Option<String>,
    #[validate(range(min = 30, max = 260))]
    pub height_cm: Option<u32>,
    #[validate(range(min = 1.0, max = 400.0))]
    pub weight_kg: Option<f64>,
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<ClientRequest>,
) -> Result<(StatusCode, Json<Client>)> {
    payload.validate()?;

    let now = chrono::Utc::now();
    let client = Client {
        id: generate_id()?,
        trainer_id: auth.trainer_id,
        name: payload.name,
        phone: payload.phone,
        email: payload.email,
        notes: payload.notes,
        default_location_id: payload.default_location_id,
        photo_url: payload.photo_url,
        birth_date: payload.birth_date,
        gender: payload.gender,
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    state.db.upsert_client(&client).await?;

    Ok((StatusCode::CREATED, Json(client)))
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
    Json(payload): Json<ClientRequest>,
) -> Result<Json<Client>> {
    payload.validate()?;

    let mut client = client_owned_by(&state, client_id, auth.trainer_id).await?;
    client.name = payload.name;
    client.phone = payload.phone;
    client.email = payload.email;
    client.notes = payload.notes;
    client.default_location_id = payload.default_location_id;
    client.photo_url = payload.photo_url;
    client.birth_date = payload.birth_date;
    client.gender = payload.gender;
    client.height_cm = payload.height_cm;
    client.weight_kg = payload.weight_kg;
    client.updated_at = chrono::Utc::now();
    state.db.upsert_client(&client).await?;

    Ok(Json(client))
}

/// Soft-delete: tombstone the client, keep sessions and payments intact.
async fn delete_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
) -> Result<StatusCode> {
    let mut client = client_owned_by(&state, client_id, auth.trainer_id).await?;
    if !client.is_deleted() {
        let now = chrono::Utc::now();
        client.deleted_at = Some(now);
        client.updated_at = now;
        state.db.upsert_client(&client).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// A client's session history, newest first.
async fn list_client_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
) -> Result<Json<Vec<TrainingSession>>> {
    client_owned_by(&state, client_id, auth.trainer_id).await?;
    Ok(Json(state.db.list_sessions_for_client(client_id).await?))
}

// ─── Payments ────────────────────────────────────────────────

async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
) -> Result<Json<Vec<Payment>>> {
    client_owned_by(&state, client_id, auth.trainer_id).await?;
    Ok(Json(state.db.list_payments_for_client(client_id).await?))
}

#[derive(Deserialize, Validate)]
pub struct CreatePaymentRequest {
    #[validate(range(min = 1))]
    pub sessions_paid: u32,
    pub amount_cop: u64,
    pub payment_date: Option<chrono::DateTime<chrono::Utc>>,
    pub notes: Option<String>,
}

/// Register a bulk payment: append a ledger entry and mark the oldest
/// unpaid sessions paid, atomically.
async fn register_payment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    payload.validate()?;

    client_owned_by(&state, client_id, auth.trainer_id).await?;

    let now = chrono::Utc::now();
    let payment = Payment::new(
        generate_id()?,
        client_id,
        auth.trainer_id,
        payload.sessions_paid,
        payload.amount_cop,
        payload.payment_date,
        payload.notes,
        now,
    );

    let mut sessions = state.db.list_sessions_for_client(client_id).await?;
    let mut marked = Vec::new();
    for index in select_unpaid_fifo(&sessions, payload.sessions_paid) {
        sessions[index].mark_paid(now);
        marked.push(sessions[index].clone());
    }

    state.db.record_payment_atomic(&payment, &marked).await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

async fn payment_balance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
) -> Result<Json<PaymentBalance>> {
    client_owned_by(&state, client_id, auth.trainer_id).await?;

    let sessions = state.db.list_sessions_for_client(client_id).await?;
    let payments = state.db.list_payments_for_client(client_id).await?;

    Ok(Json(compute_balance(&sessions, &payments)))
}

// ─── Aggregations ────────────────────────────────────────────

/// Load the client's sessions plus their recorded exercises, joined for the
/// aggregation services.
async fn load_client_exercise_rows(
    state: &AppState,
    client_id: u64,
) -> Result<(Vec<TrainingSession>, Vec<crate::models::SessionExercise>)> {
    let sessions = state.db.list_sessions_for_client(client_id).await?;
    let session_ids: Vec<u64> = sessions.iter().map(|s| s.id).collect();
    let exercises = state.db.list_exercises_for_sessions(&session_ids).await?;
    Ok((sessions, exercises))
}

async fn lap_times_for_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
) -> Result<Json<Vec<LocationLapStats>>> {
    client_owned_by(&state, client_id, auth.trainer_id).await?;

    let (sessions, exercises) = load_client_exercise_rows(&state, client_id).await?;
    let sessions_by_id: HashMap<u64, &TrainingSession> =
        sessions.iter().map(|s| (s.id, s)).collect();

    let locations = state.db.list_locations_for_trainer(auth.trainer_id).await?;
    let location_names: HashMap<u64, String> =
        locations.into_iter().map(|l| (l.id, l.name)).collect();

    let captures: Vec<LapCapture> = exercises
        .into_iter()
        .filter(|e| e.custom_name.as_deref() == Some(aggregation::LAP_CAPTURE_NAME))
        .filter_map(|e| {
            let session = sessions_by_id.get(&e.session_id?)?;
            Some(LapCapture {
                session_id: session.id,
                session_date: session.scheduled_at,
                location_name: session
                    .location_id
                    .and_then(|id| location_names.get(&id).cloned()),
                lap_times_ms: aggregation::extract_lap_times(&e.data),
            })
        })
        .collect();

    Ok(Json(lap_times_by_location(captures)))
}

#[derive(Deserialize)]
struct ExerciseHistoryQuery {
    /// Restrict history to one exact exercise name
    exercise_name: Option<String>,
}

async fn exercise_history_for_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(client_id): Path<u64>,
    Query(query): Query<ExerciseHistoryQuery>,
) -> Result<Json<ExerciseHistory>> {
    client_owned_by(&state, client_id, auth.trainer_id).await?;

    let (sessions, exercises) = load_client_exercise_rows(&state, client_id).await?;
    let entries = aggregation::named_history_entries(&sessions, exercises);

    Ok(Json(exercise_history(
        entries,
        query.exercise_name.as_deref(),
    )))
}
