//! Event listing and administration.

use super::{
    global_permissions, parse_rules, require_global, store_error, subject_for,
};
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::{evaluate_event, AccessRule, EventPermissions, GlobalPermissions};
use ims_store::rows::EventRow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static EVENT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(list).post(upsert))
}

#[derive(Debug, Serialize)]
struct EventWire {
    id: i32,
    name: String,
}

/// GET /ims/api/events — every event the caller may see the name of.
async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<EventWire>>, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::LIST_EVENTS)?;

    let events = state.store.events().await.map_err(store_error)?;
    let mut rules_by_event: HashMap<i32, Vec<AccessRule>> = HashMap::new();
    for row in state.store.access_rules_all().await.map_err(store_error)? {
        let event_id = row.event_id;
        for rule in parse_rules(vec![row]) {
            rules_by_event.entry(event_id).or_default().push(rule);
        }
    }

    let admin = global.contains(GlobalPermissions::READ_EVENT_NAME);
    let subject = subject_for(&state, &claims).await;
    let visible = events
        .into_iter()
        .filter(|event| {
            admin
                || rules_by_event
                    .get(&event.id)
                    .map(|rules| {
                        evaluate_event(&subject, rules)
                            .contains(EventPermissions::READ_EVENT_NAME)
                    })
                    .unwrap_or(false)
        })
        .map(|event| EventWire {
            id: event.id,
            name: event.name,
        })
        .collect();
    Ok(Json(visible))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventUpsert {
    name: String,
    is_group: bool,
    /// Parent group by name. Absent leaves/creates without a parent.
    parent_group: Option<String>,
}

/// POST /ims/api/events — create or update an event.
async fn upsert(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<EventUpsert>,
) -> Result<Response, AppError> {
    let global = global_permissions(&state, &claims);
    require_global(global, GlobalPermissions::ADMINISTRATE_EVENTS)?;

    if !EVENT_NAME.is_match(&body.name) {
        return Err(AppError::BadRequest(format!(
            "event name must match [A-Za-z0-9_-]+: '{}'",
            body.name
        )));
    }

    let parent = match &body.parent_group {
        Some(parent_name) => {
            if *parent_name == body.name {
                return Err(AppError::BadRequest(
                    "an event cannot be its own parent".to_string(),
                ));
            }
            if body.is_group {
                return Err(AppError::BadRequest(
                    "a group cannot have a parent".to_string(),
                ));
            }
            let parent = state
                .store
                .event_by_name(parent_name)
                .await
                .map_err(store_error)?
                .ok_or_else(|| {
                    AppError::BadRequest(format!("no such parent group: {}", parent_name))
                })?;
            if !parent.is_group {
                return Err(AppError::BadRequest(format!(
                    "parent event is not a group: {}",
                    parent_name
                )));
            }
            Some(parent.id)
        }
        None => None,
    };

    let existing = state
        .store
        .event_by_name(&body.name)
        .await
        .map_err(store_error)?;
    let id = match existing {
        Some(EventRow { id, .. }) => {
            state
                .store
                .update_event(id, body.is_group, parent)
                .await
                .map_err(store_error)?;
            id
        }
        None => state
            .store
            .create_event(&body.name, body.is_group, parent)
            .await
            .map_err(store_error)?,
    };

    Ok((
        StatusCode::NO_CONTENT,
        [(HeaderName::from_static("ims-event-id"), id.to_string())],
    )
        .into_response())
}
