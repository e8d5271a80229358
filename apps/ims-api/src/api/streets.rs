//! Concentric street names per event.

use super::{cache_control, global_permissions, require_global, store_error};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::GlobalPermissions;
use serde::Deserialize;
use std::collections::HashMap;

pub fn router() -> Router<AppState> {
    Router::new().route("/streets", get(list).post(edit))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    event_id: String,
}

/// GET /ims/api/streets?event_id=Name — street id → name for one event.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::READ_STREETS)?;

    let event = state
        .store
        .event_by_name(&query.event_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| AppError::NotFound(format!("no such event: {}", query.event_id)))?;

    let streets: HashMap<String, String> = state
        .store
        .streets(event.id)
        .await
        .map_err(store_error)?
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();
    Ok((cache_control(state.cache_control_long), Json(streets)).into_response())
}

/// Event name → street id → street name.
type StreetsWire = HashMap<String, HashMap<String, String>>;

/// POST /ims/api/streets — add streets. Existing ids are left untouched;
/// streets are never renamed or removed through the API.
async fn edit(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<StreetsWire>,
) -> Result<StatusCode, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_STREETS)?;

    for (event_name, streets) in body {
        let event = state
            .store
            .event_by_name(&event_name)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::NotFound(format!("no such event: {}", event_name)))?;

        let existing: HashMap<String, String> = state
            .store
            .streets(event.id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect();
        for (id, name) in streets {
            if existing.contains_key(&id) {
                continue;
            }
            state
                .store
                .create_street(event.id, &id, &name)
                .await
                .map_err(store_error)?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
