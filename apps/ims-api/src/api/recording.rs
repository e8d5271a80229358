//! Action log middleware.
//!
//! Mutating requests are recorded off the response path; reads are not. The
//! layer sits outside the auth layer, so it decodes the bearer token itself
//! to attribute the interaction.

use crate::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use axum_helpers::bearer_claims;
use ims_store::ActionLogRecord;
use std::net::SocketAddr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub async fn record_interaction(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let recorded = matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::DELETE
    );
    if !recorded {
        return next.run(request).await;
    }

    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let referrer = header_string(&request, header::REFERER);
    let client_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let claims = bearer_claims(request.headers(), &state.jwt);

    let started = Instant::now();
    let response = next.run(request).await;

    let (user_id, user_name, position_name) = match claims {
        Some(claims) => (
            Some(claims.sub),
            Some(claims.han),
            claims.pos.into_iter().next(),
        ),
        None => (None, None, None),
    };
    state
        .action_log
        .record(ActionLogRecord {
            created_at,
            method,
            path,
            referrer,
            user_id,
            user_name,
            position_name,
            client_address,
            http_status: response.status().as_u16() as i32,
            duration_micros: started.elapsed().as_micros() as i64,
            ..ActionLogRecord::default()
        })
        .await;
    response
}

fn header_string(request: &Request, name: header::HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
