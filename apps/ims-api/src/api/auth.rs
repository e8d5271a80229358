//! Login, refresh and authentication state.

use super::{event_mask, global_permissions};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_helpers::auth::refresh_cookie_value;
use axum_helpers::{bearer_claims, AppError, REFRESH_COOKIE};
use domain_access::GlobalPermissions;
use ims_directory::Person;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Advisory margin subtracted from the token expiry so clients refresh
/// slightly before the token actually lapses.
const REFRESH_MARGIN_SECONDS: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identification: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Advisory refresh instant, unix milliseconds.
    pub expires_unix_ms: i64,
}

fn token_response(token: String, exp: i64) -> TokenResponse {
    TokenResponse {
        token,
        expires_unix_ms: (exp - REFRESH_MARGIN_SECONDS) * 1000,
    }
}

fn unix_now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

async fn issue_access(state: &AppState, person: &Person) -> Result<TokenResponse, AppError> {
    let (token, exp) = state
        .jwt
        .issue_access_token(
            &person.directory_id.to_string(),
            &person.handle,
            person.on_site,
            person.positions.clone(),
            person.teams.clone(),
        )
        .map_err(|e| AppError::internal("issue access token", e))?;
    Ok(token_response(token, exp))
}

/// POST /ims/api/auth — password login.
///
/// Failure reveals only "bad credentials", whether or not the user exists.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let snapshot = state
        .directory
        .personnel()
        .await
        .map_err(|e| AppError::internal("directory", e))?;

    let Some(person) = snapshot.person_by_identification(&request.identification) else {
        return Err(AppError::Unauthorized("bad credentials".to_string()));
    };
    if !person.verify_password(&request.password) {
        return Err(AppError::Unauthorized("bad credentials".to_string()));
    }

    let body = issue_access(&state, person).await?;
    let (refresh, refresh_exp) = state
        .jwt
        .issue_refresh_token(&person.directory_id.to_string(), &person.handle)
        .map_err(|e| AppError::internal("issue refresh token", e))?;
    let cookie = refresh_cookie_value(&refresh, refresh_exp - unix_now_seconds());

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /ims/api/auth/refresh — mint a new access token from the refresh
/// cookie. The person is re-read so positions, teams and on-site are fresh;
/// the refresh token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let Some(token) = refresh_cookie(&headers) else {
        return Err(AppError::Unauthorized("no refresh cookie".to_string()));
    };
    let claims = state
        .jwt
        .validate_refresh(&token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let snapshot = state
        .directory
        .personnel()
        .await
        .map_err(|e| AppError::internal("directory", e))?;
    let Some(person) = snapshot.person_by_handle(&claims.han) else {
        return Err(AppError::Unauthorized("bad credentials".to_string()));
    };

    Ok(Json(issue_access(&state, person).await?))
}

fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == REFRESH_COOKIE).then(|| value.to_string())
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthStateQuery {
    /// Event name to report per-event access flags for.
    pub event_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthState {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub admin: bool,
    pub event_access: HashMap<String, Vec<&'static str>>,
}

/// GET /ims/api/auth — authentication state. Token is optional; an invalid
/// one reads as anonymous.
pub async fn auth_state(
    State(state): State<AppState>,
    Query(query): Query<AuthStateQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<AuthState>), AppError> {
    let Some(claims) = bearer_claims(&headers, &state.jwt) else {
        return Ok((
            StatusCode::OK,
            Json(AuthState {
                authenticated: false,
                user: None,
                admin: false,
                event_access: HashMap::new(),
            }),
        ));
    };

    let global = global_permissions(&state, &claims);
    let mut event_access = HashMap::new();
    if let Some(event_name) = query.event_id {
        let (_, mask) = event_mask(&state, &claims, &event_name).await?;
        event_access.insert(event_name, mask.names());
    }

    Ok((
        StatusCode::OK,
        Json(AuthState {
            authenticated: true,
            user: Some(claims.han),
            admin: global.contains(GlobalPermissions::ADMINISTRATE_EVENTS),
            event_access,
        }),
    ))
}
