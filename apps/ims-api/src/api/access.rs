//! Bulk read/write of access rules.

use super::{global_permissions, require_global, store_error};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::{AccessExpression, AccessMode, GlobalPermissions, Validity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub fn router() -> Router<AppState> {
    Router::new().route("/access", get(read).post(write))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleWire {
    pub expression: String,
    pub validity: String,
}

/// Event name → mode → rules.
type AccessWire = HashMap<String, HashMap<String, Vec<RuleWire>>>;

/// GET /ims/api/access — every stored rule, grouped by event and mode.
async fn read(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<AccessWire>, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_EVENTS)?;

    let events = state.store.events().await.map_err(store_error)?;
    let names: HashMap<i32, String> = events.into_iter().map(|e| (e.id, e.name)).collect();

    let mut out: AccessWire = HashMap::new();
    for row in state.store.access_rules_all().await.map_err(store_error)? {
        let Some(event_name) = names.get(&row.event_id) else {
            continue;
        };
        out.entry(event_name.clone())
            .or_default()
            .entry(row.mode)
            .or_default()
            .push(RuleWire {
                expression: row.expression,
                validity: row.validity,
            });
    }
    Ok(Json(out))
}

/// POST /ims/api/access — replace rules per (event, mode). Modes absent from
/// the body are left alone.
async fn write(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<AccessWire>,
) -> Result<StatusCode, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_EVENTS)?;

    for (event_name, modes) in body {
        let event = state
            .store
            .event_by_name(&event_name)
            .await
            .map_err(store_error)?
            .ok_or_else(|| AppError::NotFound(format!("no such event: {}", event_name)))?;

        for (mode, rules) in modes {
            // Validate everything before touching the table.
            mode.parse::<AccessMode>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            let mut validated = Vec::with_capacity(rules.len());
            for rule in rules {
                rule.expression
                    .parse::<AccessExpression>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                rule.validity
                    .parse::<Validity>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                validated.push((rule.expression, rule.validity));
            }
            state
                .store
                .replace_access_rules(event.id, &mode, &validated)
                .await
                .map_err(store_error)?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
