//! Admin handlers over the barrel registry.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use models::{BarrelRecord, BlockPos};
use service::runtime::RegistryInfo;

use crate::errors::ApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct LockBody {
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct OwnerBody {
    pub owner: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityBody {
    pub max_capacity: u32,
}

pub async fn info(State(state): State<AppState>) -> Json<RegistryInfo> {
    Json(state.runtime.info())
}

pub async fn save(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let saved = state.runtime.save().await?;
    Ok(Json(serde_json::json!({"ok": true, "saved": saved})))
}

pub async fn list_barrels(State(state): State<AppState>) -> Json<Vec<BarrelRecord>> {
    Json(state.runtime.admin().list())
}

pub async fn get_barrel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BarrelRecord>, ApiError> {
    Ok(Json(state.runtime.admin().get(&id)?))
}

pub async fn get_barrel_at(
    State(state): State<AppState>,
    Path((world, x, y, z)): Path<(String, i32, i32, i32)>,
) -> Result<Json<BarrelRecord>, ApiError> {
    Ok(Json(state.runtime.admin().get_at(&world, BlockPos::new(x, y, z))?))
}

pub async fn set_lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LockBody>,
) -> Result<Json<BarrelRecord>, ApiError> {
    Ok(Json(state.runtime.admin().set_locked(&id, body.locked)?))
}

pub async fn set_owner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<OwnerBody>,
) -> Result<Json<BarrelRecord>, ApiError> {
    Ok(Json(state.runtime.admin().set_owner(&id, body.owner)?))
}

pub async fn set_capacity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CapacityBody>,
) -> Result<Json<BarrelRecord>, ApiError> {
    Ok(Json(state.runtime.admin().set_max_capacity(&id, body.max_capacity)?))
}

pub async fn clear_barrel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BarrelRecord>, ApiError> {
    Ok(Json(state.runtime.admin().clear(&id)?))
}

pub async fn delete_barrel(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.runtime.admin().remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
