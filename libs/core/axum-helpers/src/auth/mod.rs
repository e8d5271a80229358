//! Token-based authentication.
//!
//! Two token types share a signing key: short-lived access tokens carrying
//! the full claim set and long-lived refresh tokens carrying only subject +
//! handle. Both are HS256; no other algorithm is accepted.

mod config;
mod jwt;
mod middleware;

pub use config::JwtConfig;
pub use jwt::{refresh_cookie_value, AccessClaims, AuthError, JwtAuth, RefreshClaims};
pub use middleware::{auth_middleware, bearer_claims};

/// Name of the HTTP cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";
