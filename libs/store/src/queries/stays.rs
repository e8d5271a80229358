//! Sanctuary stays: guest intake, arrival/departure profile, assigned rangers.

use crate::error::{StoreError, StoreResult};
use crate::rows::{ReportEntryRow, StayRangerRow, StayRow};
use crate::{exec, fetch_all, fetch_one, Store};
use sea_orm::{ConnectionTrait, FromQueryResult};

#[derive(Debug, FromQueryResult)]
struct MaxNumberRow {
    number: Option<i32>,
}

/// The full mutable column set of a stay, written as one UPDATE.
#[derive(Debug, Clone, Default)]
pub struct StayValues {
    pub incident_number: Option<i32>,
    pub preferred_name: Option<String>,
    pub legal_name: Option<String>,
    pub guest_description: Option<String>,
    pub camp_info: Option<String>,
    pub arrival_time: Option<f64>,
    pub arrival_method: Option<String>,
    pub arrival_state: Option<String>,
    pub arrival_reason: Option<String>,
    pub arrival_belongings: Option<String>,
    pub departure_time: Option<f64>,
    pub departure_method: Option<String>,
    pub departure_state: Option<String>,
    pub departure_reason: Option<String>,
    pub departure_belongings: Option<String>,
    pub resource_use: Option<serde_json::Value>,
}

impl Store {
    pub async fn stays(&self, event_id: i32) -> StoreResult<Vec<StayRow>> {
        fetch_all(
            self.connection(),
            "stays",
            "SELECT event_id, number, created, incident_number, preferred_name, legal_name, \
             guest_description, camp_info, arrival_time, arrival_method, arrival_state, \
             arrival_reason, arrival_belongings, departure_time, departure_method, \
             departure_state, departure_reason, departure_belongings, resource_use \
             FROM stay WHERE event_id = ? ORDER BY number",
            vec![event_id.into()],
        )
        .await
    }

    pub async fn stay<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Option<StayRow>> {
        fetch_one(
            conn,
            "stay",
            "SELECT event_id, number, created, incident_number, preferred_name, legal_name, \
             guest_description, camp_info, arrival_time, arrival_method, arrival_state, \
             arrival_reason, arrival_belongings, departure_time, departure_method, \
             departure_state, departure_reason, departure_belongings, resource_use \
             FROM stay WHERE event_id = ? AND number = ?",
            vec![event_id.into(), number.into()],
        )
        .await
    }

    /// Insert a new stay, assigning the next dense number inside the creating
    /// statement. Returns the number.
    pub async fn create_stay<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        created: f64,
    ) -> StoreResult<i32> {
        exec(
            conn,
            "create_stay",
            "INSERT INTO stay (event_id, number, created) \
             SELECT ?, COALESCE(MAX(number), 0) + 1, ? FROM stay WHERE event_id = ?",
            vec![event_id.into(), created.into(), event_id.into()],
        )
        .await?;

        let row: Option<MaxNumberRow> = fetch_one(
            conn,
            "max_stay_number",
            "SELECT MAX(number) AS number FROM stay WHERE event_id = ?",
            vec![event_id.into()],
        )
        .await?;
        row.and_then(|r| r.number).ok_or(StoreError::NoSuchStay(0))
    }

    pub async fn update_stay<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        values: &StayValues,
    ) -> StoreResult<()> {
        exec(
            conn,
            "update_stay",
            "UPDATE stay SET incident_number = ?, preferred_name = ?, legal_name = ?, \
             guest_description = ?, camp_info = ?, arrival_time = ?, arrival_method = ?, \
             arrival_state = ?, arrival_reason = ?, arrival_belongings = ?, \
             departure_time = ?, departure_method = ?, departure_state = ?, \
             departure_reason = ?, departure_belongings = ?, resource_use = ? \
             WHERE event_id = ? AND number = ?",
            vec![
                values.incident_number.into(),
                values.preferred_name.clone().into(),
                values.legal_name.clone().into(),
                values.guest_description.clone().into(),
                values.camp_info.clone().into(),
                values.arrival_time.into(),
                values.arrival_method.clone().into(),
                values.arrival_state.clone().into(),
                values.arrival_reason.clone().into(),
                values.arrival_belongings.clone().into(),
                values.departure_time.into(),
                values.departure_method.clone().into(),
                values.departure_state.clone().into(),
                values.departure_reason.clone().into(),
                values.departure_belongings.clone().into(),
                values.resource_use.clone().into(),
                event_id.into(),
                number.into(),
            ],
        )
        .await?;
        Ok(())
    }

    /// Attach to an incident (`Some`) or detach (`None`).
    pub async fn set_stay_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        incident_number: Option<i32>,
    ) -> StoreResult<()> {
        exec(
            conn,
            "set_stay_incident",
            "UPDATE stay SET incident_number = ? WHERE event_id = ? AND number = ?",
            vec![incident_number.into(), event_id.into(), number.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn stay_rangers<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<StayRangerRow>> {
        fetch_all(
            conn,
            "stay_rangers",
            "SELECT ranger_handle, role FROM stay__ranger \
             WHERE event_id = ? AND stay_number = ? ORDER BY ranger_handle",
            vec![event_id.into(), number.into()],
        )
        .await
    }

    pub async fn add_stay_ranger<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        handle: &str,
        role: Option<&str>,
    ) -> StoreResult<()> {
        exec(
            conn,
            "add_stay_ranger",
            "INSERT INTO stay__ranger (event_id, stay_number, ranger_handle, role) \
             VALUES (?, ?, ?, ?)",
            vec![event_id.into(), number.into(), handle.into(), role.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn remove_stay_ranger<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        handle: &str,
    ) -> StoreResult<()> {
        exec(
            conn,
            "remove_stay_ranger",
            "DELETE FROM stay__ranger \
             WHERE event_id = ? AND stay_number = ? AND ranger_handle = ?",
            vec![event_id.into(), number.into(), handle.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn attach_entry_to_stay<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        entry_id: i32,
    ) -> StoreResult<()> {
        exec(
            conn,
            "attach_entry_to_stay",
            "INSERT INTO stay__report_entry (event_id, stay_number, report_entry_id) \
             VALUES (?, ?, ?)",
            vec![event_id.into(), number.into(), entry_id.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn stay_entries<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<ReportEntryRow>> {
        fetch_all(
            conn,
            "stay_entries",
            "SELECT re.id, re.created, re.author, re.text, re.generated, re.stricken, \
             re.attached_file, re.attached_file_name, re.attached_file_media_type \
             FROM report_entry re \
             JOIN stay__report_entry j ON j.report_entry_id = re.id \
             WHERE j.event_id = ? AND j.stay_number = ? ORDER BY re.id",
            vec![event_id.into(), number.into()],
        )
        .await
    }
}
