// SPDX-License-Identifier: MIT

//! Trainer profile and trainer app routes.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::{Trainer, TrainerApp};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/apps", get(list_apps).post(create_app))
        .route(
            "/api/apps/{id}",
            get(get_app).put(update_app).delete(delete_app),
        )
}

/// Trainer profile response (OAuth tokens are never exposed).
#[derive(Serialize)]
pub struct TrainerResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
}

impl From<Trainer> for TrainerResponse {
    fn from(trainer: Trainer) -> Self {
        Self {
            id: trainer.id,
            name: trainer.name,
            email: trainer.email,
            phone: trainer.phone,
            logo_url: trainer.logo_url,
        }
    }
}

async fn load_trainer(state: &AppState, trainer_id: u64) -> Result<Trainer> {
    state
        .db
        .get_trainer(trainer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trainer {} not found", trainer_id)))
}

/// Get current trainer profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
) -> Result<Json<TrainerResponse>> {
    let trainer = load_trainer(&state, auth.trainer_id).await?;
    Ok(Json(trainer.into()))
}

#[derive(Deserialize, Validate)]
pub struct UpdateTrainerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
}

/// Update current trainer profile.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<UpdateTrainerRequest>,
) -> Result<Json<TrainerResponse>> {
    payload.validate()?;

    let mut trainer = load_trainer(&state, auth.trainer_id).await?;
    if let Some(name) = payload.name {
        trainer.name = name;
    }
    if let Some(phone) = payload.phone {
        trainer.phone = Some(phone);
    }
    if let Some(logo_url) = payload.logo_url {
        trainer.logo_url = Some(logo_url);
    }
    trainer.updated_at = chrono::Utc::now();
    state.db.upsert_trainer(&trainer).await?;

    Ok(Json(trainer.into()))
}

/// List the trainer's discipline apps.
async fn list_apps(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
) -> Result<Json<Vec<TrainerApp>>> {
    Ok(Json(state.db.list_apps_for_trainer(auth.trainer_id).await?))
}

#[derive(Deserialize, Validate)]
pub struct CreateAppRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

async fn app_owned_by(state: &AppState, app_id: u64, trainer_id: u64) -> Result<TrainerApp> {
    let app = state
        .db
        .get_trainer_app(app_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("App {} not found", app_id)))?;
    if app.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(app)
}

async fn get_app(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(app_id): Path<u64>,
) -> Result<Json<TrainerApp>> {
    let app = app_owned_by(&state, app_id, auth.trainer_id).await?;
    Ok(Json(app))
}

async fn create_app(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<TrainerApp>)> {
    payload.validate()?;

    let app = TrainerApp::new(
        generate_id()?,
        auth.trainer_id,
        payload.name,
        chrono::Utc::now(),
    );
    state.db.upsert_trainer_app(&app).await?;

    Ok((StatusCode::CREATED, Json(app)))
}

async fn update_app(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(app_id): Path<u64>,
    Json(payload): Json<CreateAppRequest>,
) -> Result<Json<TrainerApp>> {
    payload.validate()?;

    let mut app = app_owned_by(&state, app_id, auth.trainer_id).await?;
    app.name = payload.name;
    app.updated_at = chrono::Utc::now();
    state.db.upsert_trainer_app(&app).await?;

    Ok(Json(app))
}

/// Delete an app and its templates. Exercises that referenced those
/// templates are detached, not deleted.
async fn delete_app(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(app_id): Path<u64>,
) -> Result<StatusCode> {
    app_owned_by(&state, app_id, auth.trainer_id).await?;

    for template in state.db.list_templates_for_app(app_id).await? {
        for mut exercise in state.db.list_exercises_for_template(template.id).await? {
            exercise.exercise_template_id = None;
            state.db.upsert_exercise(&exercise).await?;
        }
        state.db.delete_template(template.id).await?;
    }
    state.db.delete_trainer_app(app_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
