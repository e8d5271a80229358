use super::config::JwtConfig;
use super::REFRESH_COOKIE;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token issuer claim value.
pub const ISSUER: &str = "ims";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer
    pub iss: String,
    /// Subject: directory id as decimal string
    pub sub: String,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Ranger handle
    pub han: String,
    /// On-site flag
    #[serde(default)]
    pub ons: bool,
    /// Position names
    #[serde(default)]
    pub pos: Vec<String>,
    /// Team names
    #[serde(default)]
    pub tea: Vec<String>,
}

/// Claims carried by a refresh token: subject + handle + validity only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub han: String,
}

/// Why token validation failed. Each reason is distinct so callers can log
/// precisely; all of them surface as 401 to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token presented")]
    MissingToken,
    #[error("token signed with an unsupported algorithm")]
    WrongAlgorithm,
    #[error("token signature verification failed")]
    BadSignature,
    #[error("token is expired")]
    Expired,
    #[error("token has no ranger handle")]
    MissingHandle,
    #[error("token is invalid: {0}")]
    Invalid(String),
}

/// HS256 token mint and validator.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
    access_lifetime: i64,
    refresh_lifetime: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_lifetime: config.access_token_lifetime as i64,
            refresh_lifetime: config.refresh_token_lifetime as i64,
        }
    }

    /// Access token validity in seconds.
    pub fn access_lifetime(&self) -> i64 {
        self.access_lifetime
    }

    /// Issue an access token. Returns the compact token and its expiry
    /// (unix seconds).
    pub fn issue_access_token(
        &self,
        subject: &str,
        handle: &str,
        on_site: bool,
        positions: Vec<String>,
        teams: Vec<String>,
    ) -> Result<(String, i64), AuthError> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(self.access_lifetime)).timestamp();
        let claims = AccessClaims {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            exp,
            iat: now.timestamp(),
            han: handle.to_string(),
            ons: on_site,
            pos: positions,
            tea: teams,
        };
        let token = self.sign(&claims)?;
        Ok((token, exp))
    }

    /// Issue a refresh token. Returns the compact token and its expiry
    /// (unix seconds).
    pub fn issue_refresh_token(
        &self,
        subject: &str,
        handle: &str,
    ) -> Result<(String, i64), AuthError> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(self.refresh_lifetime)).timestamp();
        let claims = RefreshClaims {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            exp,
            iat: now.timestamp(),
            han: handle.to_string(),
        };
        let token = self.sign(&claims)?;
        Ok((token, exp))
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AuthError> {
        let header = Header::new(Algorithm::HS256);
        encode(
            &header,
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Invalid(e.to_string()))
    }

    /// Validate an access token and return its claims.
    pub fn validate_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims: AccessClaims = self.verify(token)?;
        if claims.han.is_empty() {
            return Err(AuthError::MissingHandle);
        }
        Ok(claims)
    }

    /// Validate a refresh token and return its claims.
    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.han.is_empty() {
            return Err(AuthError::MissingHandle);
        }
        Ok(claims)
    }

    fn verify<C: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<C, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        // Only HS256 is accepted; reject anything else before verifying.
        let header = decode_header(token).map_err(|e| AuthError::Invalid(e.to_string()))?;
        if header.alg != Algorithm::HS256 {
            return Err(AuthError::WrongAlgorithm);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.leeway = 0;

        let data = decode::<C>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::BadSignature,
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => AuthError::WrongAlgorithm,
            _ => AuthError::Invalid(e.to_string()),
        })?;

        Ok(data.claims)
    }
}

/// Build the `Set-Cookie` value for the refresh cookie.
pub fn refresh_cookie_value(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        REFRESH_COOKIE, token, max_age_seconds
    )
}
