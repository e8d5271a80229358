//! Configuration for token issuance.

use core_config::{env_parse_or, env_required, ConfigError, FromEnv};

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: u64 = 900;
/// Default refresh token lifetime: 8 hours.
pub const DEFAULT_REFRESH_TOKEN_LIFETIME: u64 = 28_800;

/// JWT authentication configuration.
///
/// Loaded from environment variables:
/// - `IMS_JWT_SECRET` (required) - at least 32 characters
/// - `IMS_ACCESS_TOKEN_LIFETIME` - seconds, default 900
/// - `IMS_REFRESH_TOKEN_LIFETIME` - seconds, default 28800
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// JWT signing secret (minimum 32 characters)
    pub secret: String,
    /// Access token validity in seconds
    pub access_token_lifetime: u64,
    /// Refresh token validity in seconds
    pub refresh_token_lifetime: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig with default lifetimes.
    ///
    /// # Panics
    /// Panics if the secret is less than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= 32,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            access_token_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME,
        }
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("IMS_JWT_SECRET")?;

        if secret.len() < 32 {
            return Err(ConfigError::ParseError {
                key: "IMS_JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters for security (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        Ok(Self {
            secret,
            access_token_lifetime: env_parse_or(
                "IMS_ACCESS_TOKEN_LIFETIME",
                DEFAULT_ACCESS_TOKEN_LIFETIME,
            )?,
            refresh_token_lifetime: env_parse_or(
                "IMS_REFRESH_TOKEN_LIFETIME",
                DEFAULT_REFRESH_TOKEN_LIFETIME,
            )?,
        })
    }
}
