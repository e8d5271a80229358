//! Attachment store configuration from environment variables.

use core_config::{env_or_default, env_required, ConfigError, FromEnv};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentsStoreType {
    Local,
    S3,
    None,
}

#[derive(Debug, Clone)]
pub struct AttachmentsConfig {
    pub store_type: AttachmentsStoreType,
    /// Root directory for the local store.
    pub local_dir: Option<String>,
    /// Bucket name for the S3 store.
    pub s3_bucket: Option<String>,
}

impl AttachmentsConfig {
    /// The bucket (or local subdirectory) attachments are stored under.
    pub fn bucket(&self) -> &str {
        match self.store_type {
            AttachmentsStoreType::S3 => self.s3_bucket.as_deref().unwrap_or_default(),
            _ => "attachments",
        }
    }
}

impl FromEnv for AttachmentsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store_type = match env_or_default("IMS_ATTACHMENTS_STORE", "none")
            .to_lowercase()
            .as_str()
        {
            "local" => AttachmentsStoreType::Local,
            "s3" => AttachmentsStoreType::S3,
            "none" => AttachmentsStoreType::None,
            other => {
                return Err(ConfigError::ParseError {
                    key: "IMS_ATTACHMENTS_STORE".to_string(),
                    details: format!("expected local, s3 or none, got '{}'", other),
                })
            }
        };

        let local_dir = match store_type {
            AttachmentsStoreType::Local => Some(env_required("IMS_ATTACHMENTS_LOCAL_DIR")?),
            _ => None,
        };
        let s3_bucket = match store_type {
            AttachmentsStoreType::S3 => Some(env_required("IMS_ATTACHMENTS_S3_BUCKET")?),
            _ => None,
        };

        Ok(Self {
            store_type,
            local_dir,
            s3_bucket,
        })
    }
}
