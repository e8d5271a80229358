//! S3-backed attachment store.

use crate::error::{AttachmentError, AttachmentResult};
use crate::AttachmentStore;
use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;

pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Build a client from the ambient AWS configuration (environment,
    /// profile, or instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }

    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttachmentStore for S3Store {
    async fn put_object(&self, bucket: &str, key: &str, content: Vec<u8>)
        -> AttachmentResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(content))
            .content_type("application/octet-stream")
            .send()
            .await
            .map_err(|e| AttachmentError::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> AttachmentResult<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                // A missing key is not an error, it means no attachment.
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Ok(None);
                }
                return Err(AttachmentError::S3 {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    source: Box::new(err),
                });
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AttachmentError::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;
        Ok(Some(bytes.into_bytes().to_vec()))
    }
}
