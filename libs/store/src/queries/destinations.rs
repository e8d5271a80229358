//! Destination lists per (event, type).

use crate::error::StoreResult;
use crate::rows::DestinationRow;
use crate::{exec, fetch_all, Store};
use sea_orm::TransactionTrait;

/// One incoming destination entry; ordinals are assigned by list position.
#[derive(Debug, Clone)]
pub struct NewDestination {
    pub name: String,
    pub location_string: Option<String>,
    pub external_data: Option<serde_json::Value>,
}

impl Store {
    pub async fn destinations(&self, event_id: i32) -> StoreResult<Vec<DestinationRow>> {
        fetch_all(
            self.connection(),
            "destinations",
            "SELECT event_id, destination_type, ordinal, name, location_string, external_data \
             FROM destination WHERE event_id = ? ORDER BY destination_type, ordinal",
            vec![event_id.into()],
        )
        .await
    }

    /// Replace the full list for one (event, type).
    pub async fn replace_destinations(
        &self,
        event_id: i32,
        destination_type: &str,
        items: &[NewDestination],
    ) -> StoreResult<()> {
        let txn = self.connection().begin().await?;
        exec(
            &txn,
            "clear_destinations",
            "DELETE FROM destination WHERE event_id = ? AND destination_type = ?",
            vec![event_id.into(), destination_type.into()],
        )
        .await?;
        for (ordinal, item) in items.iter().enumerate() {
            exec(
                &txn,
                "insert_destination",
                "INSERT INTO destination \
                 (event_id, destination_type, ordinal, name, location_string, external_data) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                vec![
                    event_id.into(),
                    destination_type.into(),
                    (ordinal as i32).into(),
                    item.name.as_str().into(),
                    item.location_string.clone().into(),
                    item.external_data.clone().into(),
                ],
            )
            .await?;
        }
        txn.commit().await?;
        Ok(())
    }
}
