// SPDX-License-Identifier: MIT

//! Exercise set (circuit) routes. Sets follow the same exclusive-or parent
//! rule as exercises and own their member exercises.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::exercise::ExerciseData;
use crate::models::{ExerciseParent, ExerciseSet, SessionExercise};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sessions/{id}/exercise-sets",
            get(list_for_session).post(create_for_session),
        )
        .route(
            "/api/sessions/groups/{id}/exercise-sets",
            get(list_for_group).post(create_for_group),
        )
        .route(
            "/api/exercise-sets/{id}",
            get(get_set).put(update_set).delete(delete_set),
        )
}

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

async fn set_owned_by(state: &AppState, set_id: u64, trainer_id: u64) -> Result<ExerciseSet> {
    let set = state
        .db
        .get_set(set_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Exercise set {} not found", set_id)))?;
    let parent = set
        .parent()
        .ok_or_else(|| AppError::Database("Exercise set row has no valid parent".to_string()))?;
    parent_owned_by(state, parent, trainer_id).await?;
    Ok(set)
}

/// A set together with the exercises it owns.
#[derive(Serialize)]
pub struct SetWithExercises {
    #[serde(flatten)]
    pub set: ExerciseSet,
    pub exercises: Vec<SessionExercise>,
}

async fn with_exercises(state: &AppState, set: ExerciseSet) -> Result<SetWithExercises> {
    let exercises = state.db.list_exercises_in_set(set.id).await?;
    Ok(SetWithExercises { set, exercises })
}

#[derive(Deserialize, Validate)]
pub struct NestedExerciseRequest {
    pub exercise_template_id: Option<u64>,
    #[validate(length(min = 1, max = 200))]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub data: ExerciseData,
}

#[derive(Deserialize, Validate)]
pub struct CreateSetRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1, max = 50))]
    pub series: u32,
    pub order_index: Option<u32>,
    #[serde(default)]
    #[validate(nested)]
    pub exercises: Vec<NestedExerciseRequest>,
}

async fn create_set(
    state: &AppState,
    trainer_id: u64,
    parent: ExerciseParent,
    payload: CreateSetRequest,
) -> Result<SetWithExercises> {
    payload.validate()?;
    parent_owned_by(state, parent, trainer_id).await?;

    let now = chrono::Utc::now();

    let order_index = match payload.order_index {
        Some(index) => index,
        None => {
            let siblings = match parent {
                ExerciseParent::Session(id) => state.db.list_sets_for_session(id).await?,
                ExerciseParent::Group(id) => state.db.list_sets_for_group(id).await?,
            };
            siblings.iter().map(|s| s.order_index + 1).max().unwrap_or(0)
        }
    };

    let set = ExerciseSet::new(
        generate_id()?,
        parent,
        payload.name,
        payload.series,
        order_index,
        now,
    );
    state.db.upsert_set(&set).await?;

    let mut exercises = Vec::with_capacity(payload.exercises.len());
    for (index, nested) in payload.exercises.into_iter().enumerate() {
        if nested.exercise_template_id.is_none() && nested.custom_name.is_none() {
            return Err(AppError::BadRequest(
                "Each exercise needs exercise_template_id or custom_name".to_string(),
            ));
        }
        let exercise = SessionExercise::new(
            generate_id()?,
            parent,
            nested.exercise_template_id,
            Some(set.id),
            nested.custom_name,
            nested.data,
            index as u32,
            now,
        );
        state.db.upsert_exercise(&exercise).await?;
        exercises.push(exercise);
    }

    Ok(SetWithExercises { set, exercises })
}

async fn list_for_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
) -> Result<Json<Vec<ExerciseSet>>> {
    parent_owned_by(&state, ExerciseParent::Session(session_id), auth.trainer_id).await?;
    Ok(Json(state.db.list_sets_for_session(session_id).await?))
}

async fn create_for_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(session_id): Path<u64>,
    Json(payload): Json<CreateSetRequest>,
) -> Result<(StatusCode, Json<SetWithExercises>)> {
    let set = create_set(
        &state,
        auth.trainer_id,
        ExerciseParent::Session(session_id),
        payload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

async fn list_for_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
) -> Result<Json<Vec<ExerciseSet>>> {
    parent_owned_by(&state, ExerciseParent::Group(group_id), auth.trainer_id).await?;
    Ok(Json(state.db.list_sets_for_group(group_id).await?))
}

async fn create_for_group(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(group_id): Path<u64>,
    Json(payload): Json<CreateSetRequest>,
) -> Result<(StatusCode, Json<SetWithExercises>)> {
    let set = create_set(
        &state,
        auth.trainer_id,
        ExerciseParent::Group(group_id),
        payload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

async fn get_set(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(set_id): Path<u64>,
) -> Result<Json<SetWithExercises>> {
    let set = set_owned_by(&state, set_id, auth.trainer_id).await?;
    Ok(Json(with_exercises(&state, set).await?))
}

#[derive(Deserialize, Validate)]
pub struct UpdateSetRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub series: Option<u32>,
    pub order_index: Option<u32>,
    /// When present, replaces the set's exercise list wholesale
    #[validate(nested)]
    pub exercises: Option<Vec<NestedExerciseRequest>>,
}

async fn update_set(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(set_id): Path<u64>,
    Json(payload): Json<UpdateSetRequest>,
) -> Result<Json<SetWithExercises>> {
    payload.validate()?;

    let mut set = set_owned_by(&state, set_id, auth.trainer_id).await?;
    let parent = set
        .parent()
        .ok_or_else(|| AppError::Database("Exercise set row has no valid parent".to_string()))?;

    if let Some(name) = payload.name {
        set.name = name;
    }
    if let Some(series) = payload.series {
        set.series = series;
    }
    if let Some(order_index) = payload.order_index {
        set.order_index = order_index;
    }
    let now = chrono::Utc::now();
    set.updated_at = now;
    state.db.upsert_set(&set).await?;

    if let Some(nested_list) = payload.exercises {
        for existing in state.db.list_exercises_in_set(set.id).await? {
            state.db.delete_exercise(existing.id).await?;
        }
        for (index, nested) in nested_list.into_iter().enumerate() {
            if nested.exercise_template_id.is_none() && nested.custom_name.is_none() {
                return Err(AppError::BadRequest(
                    "Each exercise needs exercise_template_id or custom_name".to_string(),
                ));
            }
            let exercise = SessionExercise::new(
                generate_id()?,
                parent,
                nested.exercise_template_id,
                Some(set.id),
                nested.custom_name,
                nested.data,
                index as u32,
                now,
            );
            state.db.upsert_exercise(&exercise).await?;
        }
    }

    Ok(Json(with_exercises(&state, set).await?))
}

/// Hard-delete a set and every exercise it owns, in one transaction. This
/// is a true removal; sessions themselves are only ever cancelled.
async fn delete_set(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(set_id): Path<u64>,
) -> Result<StatusCode> {
    set_owned_by(&state, set_id, auth.trainer_id).await?;

    let exercise_ids: Vec<u64> = state
        .db
        .list_exercises_in_set(set_id)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();
    state.db.delete_set_cascade(set_id, &exercise_ids).await?;

    Ok(StatusCode::NO_CONTENT)
}
