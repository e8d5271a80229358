//! API routes and the shared permission plumbing.

pub mod access;
pub mod actionlogs;
pub mod attachments;
pub mod auth;
pub mod destinations;
pub mod events;
pub mod eventsource;
pub mod field_reports;
pub mod incident_types;
pub mod incidents;
pub mod personnel;
pub mod recording;
pub mod stays;
pub mod streets;

#[cfg(test)]
mod tests;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::routing::{get, post};
use axum::{middleware, Router};
use axum_helpers::{auth_middleware, AccessClaims, AppError};
use domain_access::{
    evaluate, evaluate_event, AccessRule, EventPermissions, GlobalPermissions, Subject,
};
use domain_incidents::DomainError;
use ims_store::rows::EventRow;
use ims_store::StoreError;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Read timeout for everything except the SSE stream.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create all API routes under `/ims/api`.
pub fn routes(state: &AppState) -> Router {
    let protected = Router::new()
        .merge(events::router())
        .merge(access::router())
        .merge(incidents::router())
        .merge(field_reports::router())
        .merge(stays::router())
        .merge(attachments::router())
        .merge(incident_types::router())
        .merge(streets::router())
        .merge(destinations::router())
        .merge(personnel::router())
        .merge(actionlogs::router())
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .route("/ping", get(ping))
        .route("/auth", post(auth::login).get(auth::auth_state))
        .route("/auth/refresh", post(auth::refresh))
        .merge(protected)
        .layer(TimeoutLayer::new(READ_TIMEOUT))
        // The SSE stream stays open for minutes; no read timeout.
        .route("/eventsource", get(eventsource::stream));

    Router::new()
        .nest("/ims/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            recording::record_interaction,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(DefaultBodyLimit::max(state.max_request_bytes))
        .with_state(state.clone())
}

async fn ping() -> &'static str {
    "ack"
}

/// `Cache-Control` header for a cacheable GET.
pub(crate) fn cache_control(max_age: u64) -> [(header::HeaderName, String); 1] {
    [(header::CACHE_CONTROL, format!("max-age={}", max_age))]
}

// ---------------------------------------------------------------------------
// Permission plumbing
// ---------------------------------------------------------------------------

/// Build the authorization subject from verified claims, enriched with the
/// on-duty position from the directory when it is reachable.
pub(crate) async fn subject_for(state: &AppState, claims: &AccessClaims) -> Subject {
    let on_duty_position = match state.directory.personnel().await {
        Ok(snapshot) => snapshot.on_duty_position(&claims.han).map(str::to_string),
        Err(e) => {
            warn!(error = %e, "directory unavailable, evaluating without on-duty position");
            None
        }
    };
    Subject {
        handle: claims.han.clone(),
        on_site: claims.ons,
        positions: claims.pos.clone(),
        teams: claims.tea.clone(),
        on_duty_position,
    }
}

pub(crate) fn global_permissions(state: &AppState, claims: &AccessClaims) -> GlobalPermissions {
    let subject = Subject {
        handle: claims.han.clone(),
        ..Subject::default()
    };
    let (global, _) = evaluate(&subject, &state.admins, &Default::default());
    global
}

pub(crate) fn require_global(
    mask: GlobalPermissions,
    bit: GlobalPermissions,
) -> Result<(), AppError> {
    if mask.contains(bit) {
        Ok(())
    } else {
        Err(AppError::missing_permission(bit))
    }
}

/// Parse stored rule rows, skipping rows that no longer parse.
pub(crate) fn parse_rules(rows: Vec<ims_store::rows::AccessRow>) -> Vec<AccessRule> {
    rows.into_iter()
        .filter_map(|row| {
            let parsed = (
                row.expression.parse(),
                row.mode.parse(),
                row.validity.parse(),
            );
            match parsed {
                (Ok(expression), Ok(mode), Ok(validity)) => Some(AccessRule {
                    expression,
                    mode,
                    validity,
                }),
                _ => {
                    warn!(rule = row.id, "skipping unparsable access rule");
                    None
                }
            }
        })
        .collect()
}

/// The caller's permission mask on one event, together with the event row.
///
/// An unknown event evaluates against an empty rule set, so callers see a
/// permission failure before any not-found: the check never depends on the
/// resource's existence beyond the event.
pub(crate) async fn event_mask(
    state: &AppState,
    claims: &AccessClaims,
    event_name: &str,
) -> Result<(Option<EventRow>, EventPermissions), AppError> {
    let event = state
        .store
        .event_by_name(event_name)
        .await
        .map_err(store_error)?;
    let rules = match &event {
        Some(event) => parse_rules(
            state
                .store
                .access_rules(event.id)
                .await
                .map_err(store_error)?,
        ),
        None => vec![],
    };
    let subject = subject_for(state, claims).await;
    Ok((event, evaluate_event(&subject, &rules)))
}

/// Permission gate for event-scoped routes: 403 naming the missing bit,
/// then 404 for an unknown event.
pub(crate) async fn event_gate(
    state: &AppState,
    claims: &AccessClaims,
    event_name: &str,
    bit: EventPermissions,
) -> Result<EventRow, AppError> {
    let (event, mask) = event_mask(state, claims, event_name).await?;
    if !mask.contains(bit) {
        return Err(AppError::missing_permission(bit));
    }
    event.ok_or_else(|| AppError::NotFound(format!("no such event: {}", event_name)))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub(crate) fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::NoSuchEvent(_)
        | StoreError::NoSuchIncident(_)
        | StoreError::NoSuchFieldReport(_)
        | StoreError::NoSuchStay(_)
        | StoreError::NoSuchReportEntry(_) => AppError::NotFound(err.to_string()),
        StoreError::DuplicateName(_) => AppError::Conflict(err.to_string()),
        StoreError::Db(_) | StoreError::SchemaAhead { .. } | StoreError::Timeout(_) => {
            AppError::internal("store", err)
        }
    }
}

pub(crate) fn domain_error(err: DomainError) -> AppError {
    match err {
        DomainError::InvalidValue(m) => AppError::BadRequest(m),
        DomainError::Store(e) => store_error(e),
        DomainError::Db(e) => AppError::internal("transaction", e),
    }
}
