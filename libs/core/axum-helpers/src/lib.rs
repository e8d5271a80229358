//! # Axum Helpers
//!
//! A collection of utilities, middleware, and helpers shared by IMS Axum
//! services.
//!
//! ## Modules
//!
//! - **[`auth`]**: HS256 access/refresh token issuance, validation and the
//!   authentication middleware pipeline
//! - **[`server`]**: server bootstrap with graceful shutdown
//! - **[`errors`]**: structured error responses

pub mod auth;
pub mod errors;
pub mod server;

pub use auth::{
    auth_middleware, bearer_claims, AccessClaims, AuthError, JwtAuth, JwtConfig, RefreshClaims,
    REFRESH_COOKIE,
};
pub use errors::{AppError, ErrorResponse};
pub use server::{create_app, shutdown_signal};
