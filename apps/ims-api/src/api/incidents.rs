//! Incident endpoints.

use super::{domain_error, event_gate};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::EventPermissions;
use domain_incidents::model::{Incident, IncidentUpdate, StrikeUpdate};
use domain_incidents::incident;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event}/incidents", get(list).post(create))
        .route("/events/{event}/incidents/{number}", get(read).post(update))
        .route(
            "/events/{event}/incidents/{number}/report_entries/{entry}",
            post(strike),
        )
}

async fn list(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<Incident>>, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_INCIDENTS).await?;
    let incidents = incident::read_incidents(&state.store, &event.name, event.id)
        .await
        .map_err(domain_error)?;
    Ok(Json(incidents))
}

async fn create(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
    Json(update): Json<IncidentUpdate>,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_INCIDENTS).await?;
    let (number, notifications) =
        incident::create_incident(&state.store, event.id, &claims.han, update)
            .await
            .map_err(domain_error)?;
    state.bus.publish(&event.name, &notifications);

    Ok((
        StatusCode::CREATED,
        [
            (
                header::LOCATION,
                format!("/ims/api/events/{}/incidents/{}", event.name, number),
            ),
            (
                HeaderName::from_static("ims-incident-number"),
                number.to_string(),
            ),
        ],
    )
        .into_response())
}

async fn read(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Incident>, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_INCIDENTS).await?;
    let incident = incident::read_incident(&state.store, &event.name, event.id, number)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| AppError::NotFound(format!("no such incident: {}", number)))?;
    Ok(Json(incident))
}

async fn update(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Extension(claims): Extension<AccessClaims>,
    Json(update): Json<IncidentUpdate>,
) -> Result<StatusCode, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_INCIDENTS).await?;
    let notifications = incident::update_incident(&state.store, event.id, number, &claims.han, update)
        .await
        .map_err(domain_error)?;
    state.bus.publish(&event.name, &notifications);
    Ok(StatusCode::NO_CONTENT)
}

async fn strike(
    State(state): State<AppState>,
    Path((event, number, entry)): Path<(String, i32, i32)>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<StrikeUpdate>,
) -> Result<StatusCode, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_INCIDENTS).await?;
    let notifications = incident::strike_incident_entry(
        &state.store,
        event.id,
        number,
        entry,
        body.stricken,
        &claims.han,
    )
    .await
    .map_err(domain_error)?;
    state.bus.publish(&event.name, &notifications);
    Ok(StatusCode::NO_CONTENT)
}
