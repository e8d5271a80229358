//! Incident rows, their set-valued associations and report entries.

use crate::error::{StoreError, StoreResult};
use crate::rows::{HandleRow, IncidentRow, NameRow, NumberRow, ReportEntryRow};
use crate::{exec, fetch_all, fetch_one, Store};
use sea_orm::{ConnectionTrait, FromQueryResult};

#[derive(Debug, FromQueryResult)]
struct MaxNumberRow {
    number: Option<i32>,
}

impl Store {
    pub async fn incidents(&self, event_id: i32) -> StoreResult<Vec<IncidentRow>> {
        fetch_all(
            self.connection(),
            "incidents",
            "SELECT event_id, number, created, state, priority, summary, \
             location_name, location_concentric, location_radial_hour, \
             location_radial_minute, location_description \
             FROM incident WHERE event_id = ? ORDER BY number",
            vec![event_id.into()],
        )
        .await
    }

    pub async fn incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Option<IncidentRow>> {
        fetch_one(
            conn,
            "incident",
            "SELECT event_id, number, created, state, priority, summary, \
             location_name, location_concentric, location_radial_hour, \
             location_radial_minute, location_description \
             FROM incident WHERE event_id = ? AND number = ?",
            vec![event_id.into(), number.into()],
        )
        .await
    }

    /// Insert a new incident with default state/priority, assigning the next
    /// dense number inside the creating statement. Returns the number.
    pub async fn create_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        created: f64,
        state: &str,
        priority: i32,
    ) -> StoreResult<i32> {
        exec(
            conn,
            "create_incident",
            "INSERT INTO incident (event_id, number, created, state, priority) \
             SELECT ?, COALESCE(MAX(number), 0) + 1, ?, ?, ? \
             FROM incident WHERE event_id = ?",
            vec![
                event_id.into(),
                created.into(),
                state.into(),
                priority.into(),
                event_id.into(),
            ],
        )
        .await?;

        let row: Option<MaxNumberRow> = fetch_one(
            conn,
            "max_incident_number",
            "SELECT MAX(number) AS number FROM incident WHERE event_id = ?",
            vec![event_id.into()],
        )
        .await?;
        row.and_then(|r| r.number)
            .ok_or(StoreError::NoSuchIncident(0))
    }

    /// Overwrite the scalar columns of an incident. The caller computed the
    /// diff; this statement persists the full new row.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        state: &str,
        priority: i32,
        summary: Option<&str>,
        location_name: Option<&str>,
        location_concentric: Option<&str>,
        location_radial_hour: Option<i32>,
        location_radial_minute: Option<i32>,
        location_description: Option<&str>,
    ) -> StoreResult<()> {
        exec(
            conn,
            "update_incident",
            "UPDATE incident SET state = ?, priority = ?, summary = ?, \
             location_name = ?, location_concentric = ?, location_radial_hour = ?, \
             location_radial_minute = ?, location_description = ? \
             WHERE event_id = ? AND number = ?",
            vec![
                state.into(),
                priority.into(),
                summary.into(),
                location_name.into(),
                location_concentric.into(),
                location_radial_hour.into(),
                location_radial_minute.into(),
                location_description.into(),
                event_id.into(),
                number.into(),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn incident_rangers<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<String>> {
        let rows: Vec<HandleRow> = fetch_all(
            conn,
            "incident_rangers",
            "SELECT ranger_handle FROM incident__ranger \
             WHERE event_id = ? AND incident_number = ? ORDER BY ranger_handle",
            vec![event_id.into(), number.into()],
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.ranger_handle).collect())
    }

    pub async fn add_incident_ranger<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        handle: &str,
    ) -> StoreResult<()> {
        exec(
            conn,
            "add_incident_ranger",
            "INSERT INTO incident__ranger (event_id, incident_number, ranger_handle) \
             VALUES (?, ?, ?)",
            vec![event_id.into(), number.into(), handle.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn remove_incident_ranger<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        handle: &str,
    ) -> StoreResult<()> {
        exec(
            conn,
            "remove_incident_ranger",
            "DELETE FROM incident__ranger \
             WHERE event_id = ? AND incident_number = ? AND ranger_handle = ?",
            vec![event_id.into(), number.into(), handle.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn incident_type_names<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<String>> {
        let rows: Vec<NameRow> = fetch_all(
            conn,
            "incident_type_names",
            "SELECT name FROM incident__incident_type \
             WHERE event_id = ? AND incident_number = ? ORDER BY name",
            vec![event_id.into(), number.into()],
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    pub async fn add_incident_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        name: &str,
    ) -> StoreResult<()> {
        exec(
            conn,
            "add_incident_type",
            "INSERT INTO incident__incident_type (event_id, incident_number, name) \
             VALUES (?, ?, ?)",
            vec![event_id.into(), number.into(), name.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn remove_incident_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        name: &str,
    ) -> StoreResult<()> {
        exec(
            conn,
            "remove_incident_type",
            "DELETE FROM incident__incident_type \
             WHERE event_id = ? AND incident_number = ? AND name = ?",
            vec![event_id.into(), number.into(), name.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn linked_incident_numbers<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<i32>> {
        let rows: Vec<NumberRow> = fetch_all(
            conn,
            "linked_incident_numbers",
            "SELECT linked_number AS number FROM incident__linked_incident \
             WHERE event_id = ? AND incident_number = ? ORDER BY linked_number",
            vec![event_id.into(), number.into()],
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.number).collect())
    }

    pub async fn link_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        linked: i32,
    ) -> StoreResult<()> {
        exec(
            conn,
            "link_incident",
            "INSERT INTO incident__linked_incident (event_id, incident_number, linked_number) \
             VALUES (?, ?, ?)",
            vec![event_id.into(), number.into(), linked.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn unlink_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        linked: i32,
    ) -> StoreResult<()> {
        exec(
            conn,
            "unlink_incident",
            "DELETE FROM incident__linked_incident \
             WHERE event_id = ? AND incident_number = ? AND linked_number = ?",
            vec![event_id.into(), number.into(), linked.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn attach_entry_to_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        entry_id: i32,
    ) -> StoreResult<()> {
        exec(
            conn,
            "attach_entry_to_incident",
            "INSERT INTO incident__report_entry (event_id, incident_number, report_entry_id) \
             VALUES (?, ?, ?)",
            vec![event_id.into(), number.into(), entry_id.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn incident_entries<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<ReportEntryRow>> {
        fetch_all(
            conn,
            "incident_entries",
            "SELECT re.id, re.created, re.author, re.text, re.generated, re.stricken, \
             re.attached_file, re.attached_file_name, re.attached_file_media_type \
             FROM report_entry re \
             JOIN incident__report_entry j ON j.report_entry_id = re.id \
             WHERE j.event_id = ? AND j.incident_number = ? ORDER BY re.id",
            vec![event_id.into(), number.into()],
        )
        .await
    }

    /// Numbers of field reports currently attached to an incident.
    pub async fn field_reports_attached<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        incident_number: i32,
    ) -> StoreResult<Vec<i32>> {
        let rows: Vec<NumberRow> = fetch_all(
            conn,
            "field_reports_attached",
            "SELECT number FROM field_report \
             WHERE event_id = ? AND incident_number = ? ORDER BY number",
            vec![event_id.into(), incident_number.into()],
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.number).collect())
    }

    /// Numbers of stays currently attached to an incident.
    pub async fn stays_attached<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        incident_number: i32,
    ) -> StoreResult<Vec<i32>> {
        let rows: Vec<NumberRow> = fetch_all(
            conn,
            "stays_attached",
            "SELECT number FROM stay \
             WHERE event_id = ? AND incident_number = ? ORDER BY number",
            vec![event_id.into(), incident_number.into()],
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.number).collect())
    }
}
