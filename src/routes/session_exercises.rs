// SPDX-License-Identifier: MIT

//! Session exercise routes.
//!
//! Exercises attach to exactly one parent; the two creation endpoints each
//! hardcode one side of that choice, so the exclusive-or can never be
//! violated through the API.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::exercise::ExerciseData;
use crate::models::{ExerciseParent, SessionExercise};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sessions/{id}/exercises",
            get(list_for_session).post(create_for_session),
        )
        .route(
            "/api/sessions/groups/{id}/exercises",
            get(list_for_group).post(create_for_group),
        )
        .route(
            "/api/sessions/{id}/exercises/reorder",
            patch(reorder_for_session),
        )
        .route(
            "/api/sessions/groups/{id}/exercises/reorder",
            patch(reorder_for_group),
        )
        .route(
            "/api/exercises/{id}",
            put(update_exercise).delete(delete_exercise),
        )
}

/// Verify the exercise's parent session or group belongs to the trainer.
async fn parent_owned_by(state: &AppState, parent: ExerciseParent, trainer_id: u64) -> Result<()> {
    let owner = match parent {
        ExerciseParent::Session(id) => state
            .db
            .get_session(id)
            .await?
            .map(|s| s.trainer_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?,
        ExerciseParent::Group(id) => state
            .db
            .get_group(id)
            .await?
            .map(|g| g.trainer_id)
            .ok_or_else(|| AppError::NotFound(format!("Session group {} not found", id)))?,
    };
    if owner != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn exercise_owned_by(
    state: &AppState,
    exercise_id: u64,
    trainer_id: u64,
) -> Result<SessionExercise> {
    let exercise = state
        .db
        .get_exercise(exercise_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Exercise {} not found", exercise_id)))?;
    let parent = exercise
        .parent()
        .ok_or_else(|| AppError::Database("Exercise row has no valid parent".to_string()))?;
    parent_owned_by(state, parent, trainer_id).await?;
    Ok(exercise)
}

#[derive(Deserialize, Validate)]
pub struct CreateExerciseRequest {
    pub exercise_template_id: Option<u64>,
    pub exercise_set_id: Option<u64>,
    #[validate(length(min = 1, max = 200))]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub data: ExerciseData,
    pub order_index: Option<u32>,
}

async fn create_exercise(
    state: &AppState,
    trainer_id: u64,
    parent: ExerciseParent,
    payload: CreateExerciseRequest,
) -> Result<SessionExercise> {
    payload.validate()?;
    parent_owned_by(state, parent, trainer_id).await?;

    if payload.exercise_template_id.is_none() && payload.custom_name.is_none() {
        return Err(AppError::BadRequest(
            "Either exercise_template_id or custom_name is required".to_string(),
        ));
    }

    // Attaching a template counts as one more use of it
    if let Some(template_id) = payload.exercise_template_id {
        let mut template = state
            .db
            .get_template(template_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template_id)))?;
        template.usage_count += 1;
        template.updated_at = chrono::Utc::now();
        state.db.upsert_template(&template).await?;
    }

    let order_index = match payload.order_index {
        Some(index) => index,
        None => {
            let siblings = match parent {
                ExerciseParent::Session(id) => state.db.list_exercises_for_session(id).await?,
                ExerciseParent::Group(id) => state.db.list_exercises_for_group(id).await?,
            };
            siblings.iter().map(|e| e.order_index + 1).max().unwrap_or(0)
        }
    };

    let exercise = SessionExercise::new(
        generate_id()?,
        parent,
        payload.exercise_template_id,
        payload.exercise_set_id,
        payload.custom_name,
        payload.data,
        order_index,
        chrono::Utc::now(),
    );
    state.db.upsert_exercise(&exercise).await?;
    Ok(exercise)
}

async fn list_for_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<Json<Vec<SessionExercise>>> {
    parent_owned_by(&state, ExerciseParent::Session(session_id), auth.trainer_id).await?;
    Ok(Json(state.db.list_exercises_for_session(session_id).await?))
}

async fn create_for_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
    Json(payload): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<SessionExercise>)> {
    let exercise = create_exercise(
        &state,
        auth.trainer_id,
        ExerciseParent::Session(session_id),
        payload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

async fn list_for_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
) -> Result<Json<Vec<SessionExercise>>> {
    parent_owned_by(&state, ExerciseParent::Group(group_id), auth.trainer_id).await?;
    Ok(Json(state.db.list_exercises_for_group(group_id).await?))
}

async fn create_for_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
    Json(payload): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<SessionExercise>)> {
    let exercise = create_exercise(
        &state,
        auth.trainer_id,
        ExerciseParent::Group(group_id),
        payload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[derive(Deserialize, Validate)]
pub struct ReorderRequest {
    /// New display order, every id must belong to the parent
    #[validate(length(min = 1))]
    pub exercise_ids: Vec<u64>,
}

/// Rewrite `order_index` for the parent's exercises to match the given
/// sequence. Ids outside the parent are rejected; sibling exercises not
/// listed keep their old index.
async fn reorder(
    state: &AppState,
    trainer_id: u64,
    parent: ExerciseParent,
    payload: ReorderRequest,
) -> Result<Vec<SessionExercise>> {
    payload.validate()?;
    parent_owned_by(state, parent, trainer_id).await?;

    let mut exercises = match parent {
        ExerciseParent::Session(id) => state.db.list_exercises_for_session(id).await?,
        ExerciseParent::Group(id) => state.db.list_exercises_for_group(id).await?,
    };

    for (index, exercise_id) in payload.exercise_ids.iter().enumerate() {
        let exercise = exercises
            .iter_mut()
            .find(|e| e.id == *exercise_id)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Exercise {} does not belong to this parent",
                    exercise_id
                ))
            })?;
        exercise.order_index = index as u32;
        state.db.upsert_exercise(exercise).await?;
    }

    exercises.sort_by_key(|e| e.order_index);
    Ok(exercises)
}

async fn reorder_for_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<Vec<SessionExercise>>> {
    let exercises = reorder(
        &state,
        auth.trainer_id,
        ExerciseParent::Session(session_id),
        payload,
    )
    .await?;
    Ok(Json(exercises))
}

async fn reorder_for_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<Vec<SessionExercise>>> {
    let exercises = reorder(
        &state,
        auth.trainer_id,
        ExerciseParent::Group(group_id),
        payload,
    )
    .await?;
    Ok(Json(exercises))
}

#[derive(Deserialize, Validate)]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 200))]
    pub custom_name: Option<String>,
    pub data: Option<ExerciseData>,
    pub order_index: Option<u32>,
}

async fn update_exercise(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(exercise_id): Path<u64>,
    Json(payload): Json<UpdateExerciseRequest>,
) -> Result<Json<SessionExercise>> {
    payload.validate()?;

    let mut exercise = exercise_owned_by(&state, exercise_id, auth.trainer_id).await?;
    if let Some(custom_name) = payload.custom_name {
        exercise.custom_name = Some(custom_name);
    }
    if let Some(data) = payload.data {
        exercise.data = data;
    }
    if let Some(order_index) = payload.order_index {
        exercise.order_index = order_index;
    }
    state.db.upsert_exercise(&exercise).await?;

    Ok(Json(exercise))
}

async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(exercise_id): Path<u64>,
) -> Result<StatusCode> {
    exercise_owned_by(&state, exercise_id, auth.trainer_id).await?;
    state.db.delete_exercise(exercise_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
