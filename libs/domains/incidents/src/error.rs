use ims_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transaction begin/commit errors surface directly from sea-orm.
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
