use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),

    #[error("database schema version {db} is ahead of the code's version {code}")]
    SchemaAhead { db: i32, code: i32 },

    #[error("no such event: {0}")]
    NoSuchEvent(String),

    #[error("no such incident: {0}")]
    NoSuchIncident(i32),

    #[error("no such field report: {0}")]
    NoSuchFieldReport(i32),

    #[error("no such stay: {0}")]
    NoSuchStay(i32),

    #[error("no such report entry: {0}")]
    NoSuchReportEntry(i32),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;
