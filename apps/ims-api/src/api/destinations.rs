//! Transport destination lists per event.

use super::{cache_control, event_gate, global_permissions, require_global, store_error};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::{EventPermissions, GlobalPermissions};
use ims_store::NewDestination;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub fn router() -> Router<AppState> {
    Router::new().route("/events/{event}/destinations", get(list).post(replace))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DestinationWire {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_data: Option<serde_json::Value>,
}

/// Destination type → ordered entries.
type DestinationsWire = HashMap<String, Vec<DestinationWire>>;

/// GET /ims/api/events/{event}/destinations — lists grouped by type.
async fn list(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_DESTINATIONS).await?;

    let mut out: DestinationsWire = HashMap::new();
    for row in state
        .store
        .destinations(event.id)
        .await
        .map_err(store_error)?
    {
        out.entry(row.destination_type)
            .or_default()
            .push(DestinationWire {
                name: row.name,
                location_string: row.location_string,
                external_data: row.external_data,
            });
    }
    Ok((cache_control(state.cache_control_short), Json(out)).into_response())
}

/// POST /ims/api/events/{event}/destinations — replace the list for each
/// type present in the body. Types absent from the body are left alone.
async fn replace(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<DestinationsWire>,
) -> Result<StatusCode, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_DESTINATIONS)?;

    let event = state
        .store
        .event_by_name(&event)
        .await
        .map_err(store_error)?
        .ok_or_else(|| AppError::NotFound(format!("no such event: {}", event)))?;

    for (destination_type, entries) in body {
        let items: Vec<NewDestination> = entries
            .into_iter()
            .map(|entry| NewDestination {
                name: entry.name,
                location_string: entry.location_string,
                external_data: entry.external_data,
            })
            .collect();
        state
            .store
            .replace_destinations(event.id, &destination_type, &items)
            .await
            .map_err(store_error)?;
    }
    Ok(StatusCode::NO_CONTENT)
}
