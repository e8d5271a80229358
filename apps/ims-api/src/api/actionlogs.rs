//! Action log readback for debugging.

use super::{global_permissions, require_global, store_error};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::GlobalPermissions;
use domain_incidents::time::seconds_to_rfc3339;
use ims_store::ActionLogFilter;
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new().route("/actionlogs", get(list))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    /// Unix milliseconds, inclusive.
    min_time: Option<i64>,
    /// Unix milliseconds, inclusive.
    max_time: Option<i64>,
    user_name: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct ActionLogWire {
    id: i32,
    created: String,
    action_type: String,
    method: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_address: Option<String>,
    http_status: i32,
    duration_micros: i64,
}

/// GET /ims/api/actionlogs — recorded interactions, newest last.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<ActionLogWire>>, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_DEBUGGING)?;

    let filter = ActionLogFilter {
        min_time: query.min_time.map(|ms| ms as f64 / 1000.0),
        max_time: query.max_time.map(|ms| ms as f64 / 1000.0),
        user_name: query.user_name,
        path: query.path,
    };
    let rows = state
        .store
        .action_logs(&filter)
        .await
        .map_err(store_error)?;
    let out = rows
        .into_iter()
        .map(|row| ActionLogWire {
            id: row.id,
            created: seconds_to_rfc3339(row.created_at),
            action_type: row.action_type,
            method: row.method,
            path: row.path,
            referrer: row.referrer,
            user_name: row.user_name,
            position_name: row.position_name,
            client_address: row.client_address,
            http_status: row.http_status,
            duration_micros: row.duration_micros,
        })
        .collect();
    Ok(Json(out))
}
