//! Personnel directory listing.

use super::{cache_control, global_permissions, require_global};
use crate::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::GlobalPermissions;
use serde::Serialize;

pub fn router() -> Router<AppState> {
    Router::new().route("/personnel", get(list))
}

/// Directory record as exposed over the wire. Email and password material
/// never leave the server.
#[derive(Debug, Serialize)]
struct PersonWire {
    handle: String,
    status: String,
    on_site: bool,
    directory_id: i64,
}

/// GET /ims/api/personnel — the cached directory.
async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::READ_PERSONNEL)?;

    let snapshot = state
        .directory
        .personnel()
        .await
        .map_err(|e| AppError::internal("directory", e))?;
    let people: Vec<PersonWire> = snapshot
        .people
        .iter()
        .map(|person| PersonWire {
            handle: person.handle.clone(),
            status: person.status.clone(),
            on_site: person.on_site,
            directory_id: person.directory_id,
        })
        .collect();
    Ok((cache_control(state.cache_control_short), Json(people)).into_response())
}
