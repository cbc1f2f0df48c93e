//! ============================================================================
//! Memory Routes - Thin CRUD passthrough to the profile store
//! ============================================================================
//! POST   /memory/create
//! PUT    /memory/update
//! DELETE /memory/delete/{id}
//! GET    /memory/healthcheck
//! GET    /memory/{id}
//! ============================================================================

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use jolie_core::{MemoryStore, ProfileUpdate, StoreError, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Body of `PUT /memory/update`: the row key plus the fields to change
#[derive(Debug, Deserialize)]
pub struct MemoryUpdateRequest {
    #[serde(rename = "email", alias = "identifier")]
    pub identifier: String,
    #[serde(flatten)]
    pub fields: ProfileUpdate,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/memory/create", post(create_memory))
        .route("/memory/update", put(update_memory))
        .route("/memory/delete/{id}", delete(delete_memory))
        .route("/memory/healthcheck", get(memory_healthcheck))
        .route("/memory/{id}", get(get_memory))
}

fn store(state: &AppState) -> Result<Arc<dyn MemoryStore>, ApiError> {
    state
        .store
        .clone()
        .ok_or_else(|| ApiError::Internal("Memory store not configured".to_string()))
}

async fn create_memory(
    State(state): State<AppState>,
    payload: Result<Json<UserProfile>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(profile) = payload?;
    if profile.identifier.trim().is_empty() {
        return Err(ApiError::Validation("email must not be empty".to_string()));
    }

    let rows = store(&state)?.create(&profile).await?;
    info!("Memory created for {}", profile.identifier);
    Ok(Json(json!({ "status": "Memory created ✅", "data": rows })))
}

async fn update_memory(
    State(state): State<AppState>,
    payload: Result<Json<MemoryUpdateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    if request.fields.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let rows = store(&state)?
        .update(&request.identifier, &request.fields)
        .await?;
    Ok(Json(json!({ "status": "Memory updated ✅", "data": rows })))
}

async fn delete_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    store(&state)?.delete(&id).await.map_err(|e| match e {
        StoreError::NotFound(_) => {
            ApiError::NotFound("Memory not found or already deleted".to_string())
        }
        other => other.into(),
    })?;

    info!("Memory deleted for {}", id);
    Ok(Json(json!({ "status": format!("Memory for {} deleted ✅", id) })))
}

async fn get_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = store(&state)?
        .fetch(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".to_string()))?;

    Ok(Json(json!({ "status": "Memory fetched ✅", "data": profile })))
}

async fn memory_healthcheck(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    store(&state)?.health_check().await?;
    Ok(Json(json!({ "status": "Supabase connection ✅" })))
}
