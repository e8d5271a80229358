use super::jwt::{AccessClaims, AuthError, JwtAuth};
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Extract a Bearer token from the Authorization header.
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.to_string()))
}

/// Validate the Bearer token in `headers`, if any. A missing or invalid
/// token reads as anonymous. For handlers and layers that sit outside
/// [`auth_middleware`] but still attribute the caller when they can.
pub fn bearer_claims(headers: &HeaderMap, auth: &JwtAuth) -> Option<AccessClaims> {
    let token = extract_bearer(headers)?;
    match auth.validate_access(&token) {
        Ok(claims) => Some(claims),
        Err(reason) => {
            tracing::debug!("ignoring invalid access token: {}", reason);
            None
        }
    }
}

/// Required-authentication middleware.
///
/// Validates the Bearer token and inserts [`super::AccessClaims`] into the
/// request extensions. Responds 401 when the token is missing or invalid.
pub async fn auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer(request.headers()) {
        Some(token) => token,
        None => {
            return AppError::Unauthorized(AuthError::MissingToken.to_string()).into_response();
        }
    };

    match auth.validate_access(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(reason) => {
            tracing::debug!("rejected access token: {}", reason);
            AppError::Unauthorized(reason.to_string()).into_response()
        }
    }
}
