//! Field report endpoints, including the "own" access gate.
//!
//! Rules grant either the all-reports bits or the own-reports bits. A caller
//! holding only the own bits reaches a report only when they authored at
//! least one human entry on it.

use super::{domain_error, event_mask};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::EventPermissions;
use domain_incidents::field_report;
use domain_incidents::model::{FieldReport, FieldReportUpdate, StrikeUpdate};
use ims_store::rows::EventRow;
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event}/field_reports", get(list).post(create))
        .route(
            "/events/{event}/field_reports/{number}",
            get(read).post(update),
        )
        .route(
            "/events/{event}/field_reports/{number}/report_entries/{entry}",
            post(strike),
        )
}

/// Gate for reads: the event row plus whether the caller may read every
/// report or only their own.
async fn read_gate(
    state: &AppState,
    claims: &AccessClaims,
    event_name: &str,
) -> Result<(EventRow, bool), AppError> {
    let (event, mask) = event_mask(state, claims, event_name).await?;
    let all = mask.contains(EventPermissions::READ_ALL_FIELD_REPORTS);
    if !all && !mask.contains(EventPermissions::READ_OWN_FIELD_REPORTS) {
        return Err(AppError::missing_permission(
            EventPermissions::READ_OWN_FIELD_REPORTS,
        ));
    }
    let event =
        event.ok_or_else(|| AppError::NotFound(format!("no such event: {}", event_name)))?;
    Ok((event, all))
}

async fn write_gate(
    state: &AppState,
    claims: &AccessClaims,
    event_name: &str,
) -> Result<(EventRow, EventPermissions), AppError> {
    let (event, mask) = event_mask(state, claims, event_name).await?;
    if !mask.contains(EventPermissions::WRITE_ALL_FIELD_REPORTS)
        && !mask.contains(EventPermissions::WRITE_OWN_FIELD_REPORTS)
    {
        return Err(AppError::missing_permission(
            EventPermissions::WRITE_OWN_FIELD_REPORTS,
        ));
    }
    let event =
        event.ok_or_else(|| AppError::NotFound(format!("no such event: {}", event_name)))?;
    Ok((event, mask))
}

/// Own-only callers must appear as the author of a human entry.
pub(crate) async fn require_authorship(
    state: &AppState,
    event_id: i32,
    number: i32,
    handle: &str,
    missing: EventPermissions,
) -> Result<(), AppError> {
    if field_report::is_author(&state.store, event_id, number, handle)
        .await
        .map_err(domain_error)?
    {
        Ok(())
    } else {
        Err(AppError::missing_permission(missing))
    }
}

fn authored(report: &FieldReport, handle: &str) -> bool {
    report
        .report_entries
        .iter()
        .any(|entry| !entry.generated && entry.author.eq_ignore_ascii_case(handle))
}

async fn list(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<FieldReport>>, AppError> {
    let (event, read_all) = read_gate(&state, &claims, &event).await?;
    let reports = field_report::read_field_reports(&state.store, &event.name, event.id)
        .await
        .map_err(domain_error)?;
    if read_all {
        return Ok(Json(reports));
    }
    let own = reports
        .into_iter()
        .filter(|report| authored(report, &claims.han))
        .collect();
    Ok(Json(own))
}

async fn create(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Extension(claims): Extension<AccessClaims>,
    Json(update): Json<FieldReportUpdate>,
) -> Result<Response, AppError> {
    let (event, _mask) = write_gate(&state, &claims, &event).await?;
    let (number, notifications) =
        field_report::create_field_report(&state.store, event.id, &claims.han, update)
            .await
            .map_err(domain_error)?;
    state.bus.publish(&event.name, &notifications);

    Ok((
        StatusCode::CREATED,
        [
            (
                header::LOCATION,
                format!("/ims/api/events/{}/field_reports/{}", event.name, number),
            ),
            (
                HeaderName::from_static("ims-field-report-number"),
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
) -> Result<Json<FieldReport>, AppError> {
    let (event, read_all) = read_gate(&state, &claims, &event).await?;
    let report = field_report::read_field_report(&state.store, &event.name, event.id, number)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| AppError::NotFound(format!("no such field report: {}", number)))?;
    if !read_all && !authored(&report, &claims.han) {
        return Err(AppError::missing_permission(
            EventPermissions::READ_ALL_FIELD_REPORTS,
        ));
    }
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateQuery {
    action: Option<String>,
    incident: Option<i32>,
}

/// POST on one field report: a plain diff update, or attach/detach when the
/// `action` query parameter is present.
async fn update(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Query(query): Query<UpdateQuery>,
    Extension(claims): Extension<AccessClaims>,
    body: Option<Json<FieldReportUpdate>>,
) -> Result<StatusCode, AppError> {
    let (event, mask) = write_gate(&state, &claims, &event).await?;
    if !mask.contains(EventPermissions::WRITE_ALL_FIELD_REPORTS) {
        require_authorship(
            &state,
            event.id,
            number,
            &claims.han,
            EventPermissions::WRITE_ALL_FIELD_REPORTS,
        )
        .await?;
    }

    let notifications = match query.action.as_deref() {
        None => {
            let update = body.map(|Json(update)| update).unwrap_or_default();
            field_report::update_field_report(&state.store, event.id, number, &claims.han, update)
                .await
                .map_err(domain_error)?
        }
        Some("attach") => {
            let incident = query.incident.ok_or_else(|| {
                AppError::BadRequest("attach requires an incident number".to_string())
            })?;
            // Attaching also edits the incident.
            if !mask.contains(EventPermissions::WRITE_INCIDENTS) {
                return Err(AppError::missing_permission(
                    EventPermissions::WRITE_INCIDENTS,
                ));
            }
            field_report::attach_field_report(
                &state.store,
                event.id,
                number,
                Some(incident),
                &claims.han,
            )
            .await
            .map_err(domain_error)?
        }
        Some("detach") => {
            if !mask.contains(EventPermissions::WRITE_INCIDENTS) {
                return Err(AppError::missing_permission(
                    EventPermissions::WRITE_INCIDENTS,
                ));
            }
            field_report::attach_field_report(&state.store, event.id, number, None, &claims.han)
                .await
                .map_err(domain_error)?
        }
        Some(other) => {
            return Err(AppError::BadRequest(format!("unknown action: {}", other)));
        }
    };
    state.bus.publish(&event.name, &notifications);
    Ok(StatusCode::NO_CONTENT)
}

async fn strike(
    State(state): State<AppState>,
    Path((event, number, entry)): Path<(String, i32, i32)>,
    Extension(claims): Extension<AccessClaims>,
    Json(body): Json<StrikeUpdate>,
) -> Result<StatusCode, AppError> {
    let (event, mask) = write_gate(&state, &claims, &event).await?;
    if !mask.contains(EventPermissions::WRITE_ALL_FIELD_REPORTS) {
        require_authorship(
            &state,
            event.id,
            number,
            &claims.han,
            EventPermissions::WRITE_ALL_FIELD_REPORTS,
        )
        .await?;
    }
    let notifications = field_report::strike_field_report_entry(
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
