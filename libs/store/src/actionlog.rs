//! Asynchronous action log.
//!
//! Request handlers enqueue one record per API interaction; a single worker
//! task drains the queue and inserts rows off the request path. Logging must
//! never slow a response down: a full queue drops the record with a warning,
//! and an insert gets a hard deadline.

use crate::error::{StoreError, StoreResult};
use crate::rows::ActionLogRow;
use crate::{exec, fetch_all, Store};
use sea_orm::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const QUEUE_DEPTH: usize = 1000;
const INSERT_DEADLINE: Duration = Duration::from_secs(10);

/// One recorded API interaction.
#[derive(Debug, Clone)]
pub struct ActionLogRecord {
    pub created_at: f64,
    pub action_type: String,
    pub method: String,
    pub path: String,
    pub referrer: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub position_id: Option<String>,
    pub position_name: Option<String>,
    pub client_address: Option<String>,
    pub http_status: i32,
    pub duration_micros: i64,
}

/// Query filter for reading the log back.
#[derive(Debug, Clone, Default)]
pub struct ActionLogFilter {
    pub min_time: Option<f64>,
    pub max_time: Option<f64>,
    pub user_name: Option<String>,
    pub path: Option<String>,
}

/// Handle for enqueueing records. Cheap to clone.
#[derive(Clone)]
pub enum ActionLogWriter {
    /// Normal operation: queue to the background worker.
    Queued(mpsc::Sender<ActionLogRecord>),
    /// Tests: insert inline so assertions see the row immediately.
    Synchronous(Store),
    /// Logging disabled by configuration.
    Disabled,
}

impl ActionLogWriter {
    /// Spawn the worker task and return the queueing handle.
    pub fn spawn(store: Store) -> Self {
        let (tx, mut rx) = mpsc::channel::<ActionLogRecord>(QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let insert = store.insert_action_log(&record);
                match tokio::time::timeout(INSERT_DEADLINE, insert).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "action log insert failed"),
                    Err(_) => warn!("action log insert timed out"),
                }
            }
            debug!("action log worker stopped");
        });
        Self::Queued(tx)
    }

    pub fn synchronous(store: Store) -> Self {
        Self::Synchronous(store)
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Record one interaction. Never blocks and never fails the caller.
    pub async fn record(&self, record: ActionLogRecord) {
        match self {
            Self::Queued(tx) => {
                if tx.try_send(record).is_err() {
                    warn!("action log queue full, dropping record");
                }
            }
            Self::Synchronous(store) => {
                if let Err(e) = store.insert_action_log(&record).await {
                    warn!(error = %e, "action log insert failed");
                }
            }
            Self::Disabled => {}
        }
    }
}

impl Store {
    pub(crate) async fn insert_action_log(&self, record: &ActionLogRecord) -> StoreResult<()> {
        exec(
            self.connection(),
            "insert_action_log",
            "INSERT INTO action_log (created_at, action_type, method, path, referrer, \
             user_id, user_name, position_id, position_name, client_address, \
             http_status, duration_micros) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                record.created_at.into(),
                record.action_type.as_str().into(),
                record.method.as_str().into(),
                record.path.as_str().into(),
                record.referrer.clone().into(),
                record.user_id.clone().into(),
                record.user_name.clone().into(),
                record.position_id.clone().into(),
                record.position_name.clone().into(),
                record.client_address.clone().into(),
                record.http_status.into(),
                record.duration_micros.into(),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn action_logs(&self, filter: &ActionLogFilter) -> StoreResult<Vec<ActionLogRow>> {
        let mut sql = String::from(
            "SELECT id, created_at, action_type, method, path, referrer, user_id, \
             user_name, position_id, position_name, client_address, http_status, \
             duration_micros FROM action_log WHERE 1 = 1",
        );
        let mut values: Vec<Value> = Vec::new();
        if let Some(min) = filter.min_time {
            sql.push_str(" AND created_at >= ?");
            values.push(min.into());
        }
        if let Some(max) = filter.max_time {
            sql.push_str(" AND created_at <= ?");
            values.push(max.into());
        }
        if let Some(ref user) = filter.user_name {
            sql.push_str(" AND user_name = ?");
            values.push(user.as_str().into());
        }
        if let Some(ref path) = filter.path {
            sql.push_str(" AND path = ?");
            values.push(path.as_str().into());
        }
        sql.push_str(" ORDER BY id");
        fetch_all(self.connection(), "action_logs", &sql, values).await
    }
}

// Convenience used by tests and handlers that only vary a few fields.
impl Default for ActionLogRecord {
    fn default() -> Self {
        Self {
            created_at: 0.0,
            action_type: "api".to_string(),
            method: "GET".to_string(),
            path: "/".to_string(),
            referrer: None,
            user_id: None,
            user_name: None,
            position_id: None,
            position_name: None,
            client_address: None,
            http_status: 200,
            duration_micros: 0,
        }
    }
}
