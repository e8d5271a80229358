use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory database error: {0}")]
    Db(#[from] DbErr),

    #[error("password hashing error: {0}")]
    Hash(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
