use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachments are disabled")]
    Disabled,

    #[error("unsafe object name: {0}")]
    UnsafeName(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("s3 error on {bucket}/{key}: {source}")]
    S3 {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;
