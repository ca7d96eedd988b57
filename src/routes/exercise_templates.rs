// SPDX-License-Identifier: MIT

//! Exercise template routes, scoped to a trainer app.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::exercise::ExerciseData;
use crate::models::ExerciseTemplate;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const AUTOCOMPLETE_LIMIT: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/apps/{id}/exercise-templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/api/apps/{id}/exercise-templates/autocomplete",
            get(autocomplete_templates),
        )
        .route(
            "/api/exercise-templates/{id}",
            put(update_template).delete(delete_template),
        )
}

async fn app_owned_by(state: &AppState, app_id: u64, trainer_id: u64) -> Result<()> {
    let app = state
        .db
        .get_trainer_app(app_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("App {} not found", app_id)))?;
    if app.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn template_owned_by(
    state: &AppState,
    template_id: u64,
    trainer_id: u64,
) -> Result<ExerciseTemplate> {
    let template = state
        .db
        .get_template(template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template_id)))?;
    app_owned_by(state, template.trainer_app_id, trainer_id).await?;
    Ok(template)
}

#[derive(Deserialize)]
struct ListTemplatesQuery {
    discipline_type: Option<String>,
}

async fn list_templates(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(app_id): Path<u64>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<Vec<ExerciseTemplate>>> {
    app_owned_by(&state, app_id, auth.trainer_id).await?;

    let mut templates = state.db.list_templates_for_app(app_id).await?;
    if let Some(discipline_type) = query.discipline_type {
        templates.retain(|t| t.discipline_type == discipline_type);
    }
    Ok(Json(templates))
}

#[derive(Deserialize)]
struct AutocompleteQuery {
    q: String,
}

/// Name suggestions for the exercise entry form: prefix matches first,
/// then substring matches, case-insensitive.
async fn autocomplete_templates(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(app_id): Path<u64>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<Vec<ExerciseTemplate>>> {
    app_owned_by(&state, app_id, auth.trainer_id).await?;

    let needle = query.q.to_lowercase();
    let templates = state.db.list_templates_for_app(app_id).await?;

    let mut prefix = Vec::new();
    let mut substring = Vec::new();
    for template in templates {
        let name = template.name.to_lowercase();
        if name.starts_with(&needle) {
            prefix.push(template);
        } else if name.contains(&needle) {
            substring.push(template);
        }
    }

    prefix.extend(substring);
    prefix.truncate(AUTOCOMPLETE_LIMIT);
    Ok(Json(prefix))
}

#[derive(Deserialize, Validate)]
pub struct TemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub discipline_type: String,
    #[serde(default)]
    pub field_schema: ExerciseData,
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(app_id): Path<u64>,
    Json(payload): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<ExerciseTemplate>)> {
    payload.validate()?;
    app_owned_by(&state, app_id, auth.trainer_id).await?;

    let now = chrono::Utc::now();
    let template = ExerciseTemplate {
        id: generate_id()?,
        trainer_app_id: app_id,
        name: payload.name,
        discipline_type: payload.discipline_type,
        field_schema: payload.field_schema,
        usage_count: 0,
        created_at: now,
        updated_at: now,
    };
    state.db.upsert_template(&template).await?;

    Ok((StatusCode::CREATED, Json(template)))
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(template_id): Path<u64>,
    Json(payload): Json<TemplateRequest>,
) -> Result<Json<ExerciseTemplate>> {
    payload.validate()?;

    let mut template = template_owned_by(&state, template_id, auth.trainer_id).await?;
    template.name = payload.name;
    template.discipline_type = payload.discipline_type;
    template.field_schema = payload.field_schema;
    template.updated_at = chrono::Utc::now();
    state.db.upsert_template(&template).await?;

    Ok(Json(template))
}

/// Delete a template, detaching any exercises that reference it. The
/// exercises keep their recorded data, they just lose the template link.
async fn delete_template(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(template_id): Path<u64>,
) -> Result<StatusCode> {
    template_owned_by(&state, template_id, auth.trainer_id).await?;

    let dependents = state.db.list_exercises_for_template(template_id).await?;
    for mut exercise in dependents {
        exercise.exercise_template_id = None;
        state.db.upsert_exercise(&exercise).await?;
    }
    state.db.delete_template(template_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
