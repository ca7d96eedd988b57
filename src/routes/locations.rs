// SPDX-License-Identifier: MIT

//! Location CRUD routes.

use crate::error::{AppError, Result};
use crate::ids::generate_id;
use crate::middleware::auth::AuthTrainer;
use crate::models::{Location, LocationType};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/locations", get(list_locations).post(create_location))
        .route(
            "/api/locations/{id}",
            get(get_location)
                .put(update_location)
                .delete(delete_location),
        )
}

async fn location_owned_by(state: &AppState, location_id: u64, trainer_id: u64) -> Result<Location> {
    let location = state
        .db
        .get_location(location_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {} not found", location_id)))?;
    if location.trainer_id != trainer_id {
        return Err(AppError::Forbidden);
    }
    Ok(location)
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
) -> Result<Json<Vec<Location>>> {
    Ok(Json(
        state.db.list_locations_for_trainer(auth.trainer_id).await?,
    ))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(location_id): Path<u64>,
) -> Result<Json<Location>> {
    let location = location_owned_by(&state, location_id, auth.trainer_id).await?;
    Ok(Json(location))
}

#[derive(Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub google_place_id: Option<String>,
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Json(payload): Json<LocationRequest>,
) -> Result<(StatusCode, Json<Location>)> {
    payload.validate()?;

    let now = chrono::Utc::now();
    let location = Location {
        id: generate_id()?,
        trainer_id: auth.trainer_id,
        name: payload.name,
        location_type: payload.location_type,
        address_line1: payload.address_line1,
        address_line2: payload.address_line2,
        city: payload.city,
        region: payload.region,
        postal_code: payload.postal_code,
        country: payload.country,
        latitude: payload.latitude,
        longitude: payload.longitude,
        google_place_id: payload.google_place_id,
        created_at: now,
        updated_at: now,
    };
    state.db.upsert_location(&location).await?;

    Ok((StatusCode::CREATED, Json(location)))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(location_id): Path<u64>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<Location>> {
    payload.validate()?;

    let mut location = location_owned_by(&state, location_id, auth.trainer_id).await?;
    location.name = payload.name;
    location.location_type = payload.location_type;
    location.address_line1 = payload.address_line1;
    location.address_line2 = payload.address_line2;
    location.city = payload.city;
    location.region = payload.region;
    location.postal_code = payload.postal_code;
    location.country = payload.country;
    location.latitude = payload.latitude;
    location.longitude = payload.longitude;
    location.google_place_id = payload.google_place_id;
    location.updated_at = chrono::Utc::now();
    state.db.upsert_location(&location).await?;

    Ok(Json(location))
}

async fn delete_location(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthTrainer>,
    Path(location_id): Path<u64>,
) -> Result<StatusCode> {
    location_owned_by(&state, location_id, auth.trainer_id).await?;
    state.db.delete_location(location_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
