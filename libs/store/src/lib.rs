//! IMS data store.
//!
//! Durable relational storage for events, incidents, field reports, stays,
//! report entries, access rules, streets, destinations, incident types and
//! the action log. Every table access goes through a named statement so
//! query timing can be logged uniformly at debug level.
//!
//! Backends: MariaDB in production, in-memory SQLite for tests and local
//! development. All statements are written to run on both.

pub mod actionlog;
pub mod config;
pub mod error;
pub mod rows;

mod queries;

pub use actionlog::{ActionLogFilter, ActionLogRecord, ActionLogWriter};
pub use config::{StoreConfig, StoreType};
pub use error::{StoreError, StoreResult};
pub use queries::{NewDestination, StayValues};

use migration::{Migrator, MigratorTrait, SCHEMA_VERSION};
use rows::VersionRow;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction,
    ExecResult, FromQueryResult, Statement, TransactionTrait, Value,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Handle on the relational store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
    /// Serializes access-rule writes process-wide; REPLACE-style updates on
    /// the rule table deadlock under concurrent writers.
    access_writer: Arc<tokio::sync::Mutex<()>>,
}

impl Store {
    /// Connect according to configuration. Does not run migrations; call
    /// [`Store::check_schema`] before serving.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let (url, max_connections) = match config.store_type {
            StoreType::MariaDb => {
                let url = config.url.clone().ok_or_else(|| {
                    StoreError::Db(sea_orm::DbErr::Custom(
                        "mariadb store requires a URL".to_string(),
                    ))
                })?;
                (url, config.max_connections)
            }
            // In-memory SQLite: a pool of one, otherwise each pooled
            // connection would see its own empty database.
            StoreType::Fake | StoreType::Noop => ("sqlite::memory:".to_string(), 1),
        };

        let mut options = ConnectOptions::new(url);
        options.max_connections(max_connections);
        let db = Database::connect(options).await?;

        Ok(Self {
            db,
            access_writer: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// A connected in-memory store with the current schema, for tests.
    pub async fn connect_fake() -> StoreResult<Self> {
        let store = Self::connect(&StoreConfig::fake()).await?;
        store.check_schema().await?;
        Ok(store)
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compare the database schema version against the code's version.
    ///
    /// Fresh or behind: apply pending migrations forward. Ahead: refuse to
    /// start, the code is older than the data.
    pub async fn check_schema(&self) -> StoreResult<()> {
        match self.schema_version().await {
            Some(version) if version == SCHEMA_VERSION => Ok(()),
            Some(version) if version > SCHEMA_VERSION => Err(StoreError::SchemaAhead {
                db: version,
                code: SCHEMA_VERSION,
            }),
            Some(version) => {
                debug!(db = version, code = SCHEMA_VERSION, "migrating schema forward");
                Migrator::up(&self.db, None).await?;
                Ok(())
            }
            None => {
                debug!(code = SCHEMA_VERSION, "fresh database, applying schema");
                Migrator::up(&self.db, None).await?;
                Ok(())
            }
        }
    }

    async fn schema_version(&self) -> Option<i32> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            "SELECT version FROM schema_info",
        );
        VersionRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .ok()
            .flatten()
            .map(|row| row.version)
    }

    /// Open a transaction for a multi-statement mutation.
    pub async fn begin(&self) -> StoreResult<DatabaseTransaction> {
        Ok(self.db.begin().await?)
    }

    pub(crate) fn access_writer(&self) -> Arc<tokio::sync::Mutex<()>> {
        self.access_writer.clone()
    }
}

/// Run a named statement, logging name and elapsed wall time at debug.
pub(crate) async fn exec<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    sql: &str,
    values: Vec<Value>,
) -> StoreResult<ExecResult> {
    let start = Instant::now();
    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, values);
    let result = conn.execute_raw(stmt).await?;
    debug!(query = name, elapsed_micros = start.elapsed().as_micros() as u64, "exec");
    Ok(result)
}

/// Fetch all rows of a named statement.
pub(crate) async fn fetch_all<R: FromQueryResult, C: ConnectionTrait>(
    conn: &C,
    name: &str,
    sql: &str,
    values: Vec<Value>,
) -> StoreResult<Vec<R>> {
    let start = Instant::now();
    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, values);
    let rows = R::find_by_statement(stmt).all(conn).await?;
    debug!(query = name, elapsed_micros = start.elapsed().as_micros() as u64, "fetch_all");
    Ok(rows)
}

/// Fetch at most one row of a named statement.
pub(crate) async fn fetch_one<R: FromQueryResult, C: ConnectionTrait>(
    conn: &C,
    name: &str,
    sql: &str,
    values: Vec<Value>,
) -> StoreResult<Option<R>> {
    let start = Instant::now();
    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, values);
    let row = R::find_by_statement(stmt).one(conn).await?;
    debug!(query = name, elapsed_micros = start.elapsed().as_micros() as u64, "fetch_one");
    Ok(row)
}
