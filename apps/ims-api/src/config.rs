//! Configuration for the IMS API server.

use axum_helpers::JwtConfig;
use core_config::server::ServerConfig;
use core_config::{env_bool_or, env_list, env_or_default, env_parse_or, FromEnv};
use ims_attachments::AttachmentsConfig;
use ims_directory::DirectoryConfig;
use ims_store::StoreConfig;

pub use core_config::Environment;

/// Application configuration, aggregated from the component configs plus the
/// server-level knobs.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
    pub directory: DirectoryConfig,
    pub attachments: AttachmentsConfig,
    /// Ranger handles granted the administrator bundle (`IMS_ADMINS`).
    pub admins: Vec<String>,
    /// `Cache-Control` max-age, seconds, for fast-changing cacheable GETs.
    pub cache_control_short: u64,
    /// `Cache-Control` max-age, seconds, for slow-changing cacheable GETs.
    pub cache_control_long: u64,
    pub action_log_enabled: bool,
    /// Overall request body cap (`IMS_MAX_REQUEST_BYTES`).
    pub max_request_bytes: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            jwt: JwtConfig::from_env()?,
            store: StoreConfig::from_env()?,
            directory: DirectoryConfig::from_env()?,
            attachments: AttachmentsConfig::from_env()?,
            admins: env_list("IMS_ADMINS"),
            cache_control_short: env_parse_or("IMS_CACHE_CONTROL_SHORT", 20)?,
            cache_control_long: env_parse_or("IMS_CACHE_CONTROL_LONG", 1200)?,
            action_log_enabled: env_bool_or("IMS_ACTION_LOG_ENABLED", true)?,
            max_request_bytes: env_parse_or("IMS_MAX_REQUEST_BYTES", 102_400)?,
            log_level: env_or_default("IMS_LOG_LEVEL", "info"),
        })
    }
}
