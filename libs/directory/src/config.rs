//! Directory configuration from environment variables.

use core_config::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryType {
    ClubhouseDb,
    TestUsers,
    Noop,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub directory_type: DirectoryType,
    pub cache_ttl: Duration,
    /// Required when `directory_type` is `ClubhouseDb`.
    pub clubhouse_db_url: Option<String>,
}

impl FromEnv for DirectoryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let directory_type = match env_or_default("IMS_DIRECTORY", "testusers")
            .to_lowercase()
            .as_str()
        {
            "clubhousedb" => DirectoryType::ClubhouseDb,
            "testusers" => DirectoryType::TestUsers,
            "noop" => DirectoryType::Noop,
            other => {
                return Err(ConfigError::ParseError {
                    key: "IMS_DIRECTORY".to_string(),
                    details: format!(
                        "expected clubhousedb, testusers or noop, got '{}'",
                        other
                    ),
                })
            }
        };

        let cache_ttl = Duration::from_secs(env_parse_or("IMS_DIRECTORY_CACHE_TTL", 300u64)?);

        let clubhouse_db_url = match directory_type {
            DirectoryType::ClubhouseDb => Some(env_required("IMS_CLUBHOUSE_DB_URL")?),
            _ => None,
        };

        Ok(Self {
            directory_type,
            cache_ttl,
            clubhouse_db_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_test_users() {
        temp_env::with_vars_unset(["IMS_DIRECTORY", "IMS_DIRECTORY_CACHE_TTL"], || {
            let config = DirectoryConfig::from_env().unwrap();
            assert_eq!(config.directory_type, DirectoryType::TestUsers);
            assert_eq!(config.cache_ttl, Duration::from_secs(300));
            assert_eq!(config.clubhouse_db_url, None);
        });
    }

    #[test]
    fn clubhouse_requires_a_url() {
        temp_env::with_vars(
            [
                ("IMS_DIRECTORY", Some("clubhousedb")),
                ("IMS_CLUBHOUSE_DB_URL", None),
            ],
            || {
                assert!(DirectoryConfig::from_env().is_err());
            },
        );

        temp_env::with_vars(
            [
                ("IMS_DIRECTORY", Some("clubhousedb")),
                ("IMS_CLUBHOUSE_DB_URL", Some("mysql://clubhouse/rangers")),
                ("IMS_DIRECTORY_CACHE_TTL", Some("60")),
            ],
            || {
                let config = DirectoryConfig::from_env().unwrap();
                assert_eq!(config.directory_type, DirectoryType::ClubhouseDb);
                assert_eq!(config.cache_ttl, Duration::from_secs(60));
                assert!(config.clubhouse_db_url.is_some());
            },
        );
    }

    #[test]
    fn unknown_directory_type_is_an_error() {
        temp_env::with_var("IMS_DIRECTORY", Some("ldap"), || {
            assert!(DirectoryConfig::from_env().is_err());
        });
    }
}
