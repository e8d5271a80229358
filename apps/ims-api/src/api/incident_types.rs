//! Incident type vocabulary.

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

pub fn router() -> Router<AppState> {
    Router::new().route("/incident_types", get(list).post(edit))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    hidden: bool,
}

/// GET /ims/api/incident_types — type names, hidden ones on request.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::READ_INCIDENT_TYPES)?;

    let names: Vec<String> = state
        .store
        .incident_types(query.hidden)
        .await
        .map_err(store_error)?
        .into_iter()
        .map(|row| row.name)
        .collect();
    Ok((cache_control(state.cache_control_long), Json(names)).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EditRequest {
    add: Vec<String>,
    hide: Vec<String>,
    show: Vec<String>,
}

/// POST /ims/api/incident_types — add new types, hide or show existing ones.
async fn edit(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<EditRequest>,
) -> Result<StatusCode, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_INCIDENT_TYPES)?;

    for name in &body.add {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "incident type name cannot be empty".to_string(),
            ));
        }
        state
            .store
            .create_incident_type(name)
            .await
            .map_err(store_error)?;
    }
    for name in &body.hide {
        state
            .store
            .set_incident_type_hidden(name, true)
            .await
            .map_err(store_error)?;
    }
    for name in &body.show {
        state
            .store
            .set_incident_type_hidden(name, false)
            .await
            .map_err(store_error)?;
    }
    Ok(StatusCode::NO_CONTENT)
}
