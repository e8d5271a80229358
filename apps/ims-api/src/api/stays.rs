//! Stay endpoints.

use super::{domain_error, event_gate};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::EventPermissions;
use domain_incidents::model::{Stay, StayUpdate, StrikeUpdate};
use domain_incidents::stay;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event}/stays", get(list).post(create))
        .route("/events/{event}/stays/{number}", get(read).post(update))
        .route(
            "/events/{event}/stays/{number}/report_entries/{entry}",
            post(strike),
        )
}

async fn list(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<Stay>>, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_STAYS).await?;
    let stays = stay::read_stays(&state.store, &event.name, event.id)
        .await
        .map_err(domain_error)?;
    Ok(Json(stays))
}

async fn create(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
    Json(update): Json<StayUpdate>,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_STAYS).await?;
    let (number, notifications) = stay::create_stay(&state.store, event.id, &claims.han, update)
        .await
        .map_err(domain_error)?;
    state.bus.publish(&event.name, &notifications);

    Ok((
        StatusCode::CREATED,
        [
            (
                header::LOCATION,
                format!("/ims/api/events/{}/stays/{}", event.name, number),
            ),
            (
                HeaderName::from_static("ims-stay-number"),
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
) -> Result<Json<Stay>, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_STAYS).await?;
    let stay = stay::read_stay(&state.store, &event.name, event.id, number)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| AppError::NotFound(format!("no such stay: {}", number)))?;
    Ok(Json(stay))
}

async fn update(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Extension(claims): Extension<AccessClaims>,
    Json(update): Json<StayUpdate>,
) -> Result<StatusCode, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_STAYS).await?;
    let notifications = stay::update_stay(&state.store, event.id, number, &claims.han, update)
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
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_STAYS).await?;
    let notifications = stay::strike_stay_entry(
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
