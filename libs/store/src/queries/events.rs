//! Events, access rules and concentric streets.

use crate::error::{StoreError, StoreResult};
use crate::rows::{AccessRow, EventRow, StreetRow};
use crate::{exec, fetch_all, fetch_one, Store};
use sea_orm::TransactionTrait;
use std::time::Duration;

/// How long an access-rule write may hold the process-wide writer lock.
const ACCESS_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

impl Store {
    pub async fn events(&self) -> StoreResult<Vec<EventRow>> {
        fetch_all(
            self.connection(),
            "events",
            "SELECT id, name, is_group, parent_group FROM event ORDER BY name",
            vec![],
        )
        .await
    }

    pub async fn event_by_name(&self, name: &str) -> StoreResult<Option<EventRow>> {
        fetch_one(
            self.connection(),
            "event_by_name",
            "SELECT id, name, is_group, parent_group FROM event WHERE name = ?",
            vec![name.into()],
        )
        .await
    }

    pub async fn event_by_id(&self, id: i32) -> StoreResult<Option<EventRow>> {
        fetch_one(
            self.connection(),
            "event_by_id",
            "SELECT id, name, is_group, parent_group FROM event WHERE id = ?",
            vec![id.into()],
        )
        .await
    }

    /// Create an event, returning its id. Name uniqueness violations map to
    /// [`StoreError::DuplicateName`].
    pub async fn create_event(
        &self,
        name: &str,
        is_group: bool,
        parent_group: Option<i32>,
    ) -> StoreResult<i32> {
        let result = exec(
            self.connection(),
            "create_event",
            "INSERT INTO event (name, is_group, parent_group) VALUES (?, ?, ?)",
            vec![name.into(), is_group.into(), parent_group.into()],
        )
        .await;

        match result {
            Ok(_) => {}
            Err(StoreError::Db(e)) if e.to_string().to_lowercase().contains("unique") => {
                return Err(StoreError::DuplicateName(name.to_string()));
            }
            Err(e) => return Err(e),
        }

        let row = self
            .event_by_name(name)
            .await?
            .ok_or_else(|| StoreError::NoSuchEvent(name.to_string()))?;
        Ok(row.id)
    }

    pub async fn update_event(
        &self,
        id: i32,
        is_group: bool,
        parent_group: Option<i32>,
    ) -> StoreResult<()> {
        exec(
            self.connection(),
            "update_event",
            "UPDATE event SET is_group = ?, parent_group = ? WHERE id = ?",
            vec![is_group.into(), parent_group.into(), id.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn access_rules(&self, event_id: i32) -> StoreResult<Vec<AccessRow>> {
        fetch_all(
            self.connection(),
            "access_rules",
            "SELECT id, event_id, expression, mode, validity \
             FROM event_access WHERE event_id = ? ORDER BY id",
            vec![event_id.into()],
        )
        .await
    }

    pub async fn access_rules_all(&self) -> StoreResult<Vec<AccessRow>> {
        fetch_all(
            self.connection(),
            "access_rules_all",
            "SELECT id, event_id, expression, mode, validity FROM event_access ORDER BY id",
            vec![],
        )
        .await
    }

    /// Replace every rule of one mode on an event.
    ///
    /// Clear + insert inside one transaction, serialized process-wide: the
    /// rule table deadlocks under contending REPLACE-style writers.
    pub async fn replace_access_rules(
        &self,
        event_id: i32,
        mode: &str,
        rules: &[(String, String)],
    ) -> StoreResult<()> {
        let writer = self.access_writer();
        let guard = tokio::time::timeout(ACCESS_WRITE_TIMEOUT, writer.lock())
            .await
            .map_err(|_| StoreError::Timeout("access rule writer"))?;

        let txn = self.connection().begin().await?;
        exec(
            &txn,
            "clear_access_rules",
            "DELETE FROM event_access WHERE event_id = ? AND mode = ?",
            vec![event_id.into(), mode.into()],
        )
        .await?;
        for (expression, validity) in rules {
            exec(
                &txn,
                "insert_access_rule",
                "INSERT INTO event_access (event_id, expression, mode, validity) \
                 VALUES (?, ?, ?, ?)",
                vec![
                    event_id.into(),
                    expression.as_str().into(),
                    mode.into(),
                    validity.as_str().into(),
                ],
            )
            .await?;
        }
        txn.commit().await?;
        drop(guard);
        Ok(())
    }

    pub async fn streets(&self, event_id: i32) -> StoreResult<Vec<StreetRow>> {
        fetch_all(
            self.connection(),
            "streets",
            "SELECT event_id, id, name FROM concentric_street WHERE event_id = ? ORDER BY id",
            vec![event_id.into()],
        )
        .await
    }

    pub async fn create_street(&self, event_id: i32, id: &str, name: &str) -> StoreResult<()> {
        exec(
            self.connection(),
            "create_street",
            "INSERT INTO concentric_street (event_id, id, name) VALUES (?, ?, ?)",
            vec![event_id.into(), id.into(), name.into()],
        )
        .await?;
        Ok(())
    }
}
