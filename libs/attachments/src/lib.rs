//! Attachment object storage.
//!
//! Report entries may carry one attached file. The bytes live outside the
//! relational store, behind the [`AttachmentStore`] trait: a local directory
//! for development, S3 in production, or nothing at all when attachments are
//! disabled.

pub mod config;
pub mod error;
pub mod local;
pub mod s3;

pub use config::{AttachmentsConfig, AttachmentsStoreType};
pub use error::{AttachmentError, AttachmentResult};
pub use local::LocalStore;
pub use s3::S3Store;

use async_trait::async_trait;

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, content: Vec<u8>)
        -> AttachmentResult<()>;

    /// `None` when no object exists under the key.
    async fn get_object(&self, bucket: &str, key: &str) -> AttachmentResult<Option<Vec<u8>>>;
}

/// A fresh object key; attachments are stored under generated names, never
/// under the client-supplied filename.
pub fn new_object_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Store used when attachments are disabled: any use is an error.
pub struct NoStore;

#[async_trait]
impl AttachmentStore for NoStore {
    async fn put_object(
        &self,
        _bucket: &str,
        _key: &str,
        _content: Vec<u8>,
    ) -> AttachmentResult<()> {
        Err(AttachmentError::Disabled)
    }

    async fn get_object(&self, _bucket: &str, _key: &str) -> AttachmentResult<Option<Vec<u8>>> {
        Err(AttachmentError::Disabled)
    }
}
