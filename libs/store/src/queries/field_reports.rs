//! Field reports and their incident attachment.

use crate::error::{StoreError, StoreResult};
use crate::rows::{AuthorRow, FieldReportRow, ReportEntryRow};
use crate::{exec, fetch_all, fetch_one, Store};
use sea_orm::{ConnectionTrait, FromQueryResult};

#[derive(Debug, FromQueryResult)]
struct MaxNumberRow {
    number: Option<i32>,
}

impl Store {
    pub async fn field_reports(&self, event_id: i32) -> StoreResult<Vec<FieldReportRow>> {
        fetch_all(
            self.connection(),
            "field_reports",
            "SELECT event_id, number, created, summary, incident_number \
             FROM field_report WHERE event_id = ? ORDER BY number",
            vec![event_id.into()],
        )
        .await
    }

    pub async fn field_report<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Option<FieldReportRow>> {
        fetch_one(
            conn,
            "field_report",
            "SELECT event_id, number, created, summary, incident_number \
             FROM field_report WHERE event_id = ? AND number = ?",
            vec![event_id.into(), number.into()],
        )
        .await
    }

    /// Insert a new field report, assigning the next dense number inside the
    /// creating statement. Returns the number.
    pub async fn create_field_report<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        created: f64,
    ) -> StoreResult<i32> {
        exec(
            conn,
            "create_field_report",
            "INSERT INTO field_report (event_id, number, created) \
             SELECT ?, COALESCE(MAX(number), 0) + 1, ? \
             FROM field_report WHERE event_id = ?",
            vec![event_id.into(), created.into(), event_id.into()],
        )
        .await?;

        let row: Option<MaxNumberRow> = fetch_one(
            conn,
            "max_field_report_number",
            "SELECT MAX(number) AS number FROM field_report WHERE event_id = ?",
            vec![event_id.into()],
        )
        .await?;
        row.and_then(|r| r.number)
            .ok_or(StoreError::NoSuchFieldReport(0))
    }

    pub async fn update_field_report_summary<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        summary: Option<&str>,
    ) -> StoreResult<()> {
        exec(
            conn,
            "update_field_report_summary",
            "UPDATE field_report SET summary = ? WHERE event_id = ? AND number = ?",
            vec![summary.into(), event_id.into(), number.into()],
        )
        .await?;
        Ok(())
    }

    /// Attach to an incident (`Some`) or detach (`None`).
    pub async fn set_field_report_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        incident_number: Option<i32>,
    ) -> StoreResult<()> {
        exec(
            conn,
            "set_field_report_incident",
            "UPDATE field_report SET incident_number = ? WHERE event_id = ? AND number = ?",
            vec![incident_number.into(), event_id.into(), number.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn attach_entry_to_field_report<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
        entry_id: i32,
    ) -> StoreResult<()> {
        exec(
            conn,
            "attach_entry_to_field_report",
            "INSERT INTO field_report__report_entry \
             (event_id, field_report_number, report_entry_id) VALUES (?, ?, ?)",
            vec![event_id.into(), number.into(), entry_id.into()],
        )
        .await?;
        Ok(())
    }

    pub async fn field_report_entries<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<ReportEntryRow>> {
        fetch_all(
            conn,
            "field_report_entries",
            "SELECT re.id, re.created, re.author, re.text, re.generated, re.stricken, \
             re.attached_file, re.attached_file_name, re.attached_file_media_type \
             FROM report_entry re \
             JOIN field_report__report_entry j ON j.report_entry_id = re.id \
             WHERE j.event_id = ? AND j.field_report_number = ? ORDER BY re.id",
            vec![event_id.into(), number.into()],
        )
        .await
    }

    /// Distinct authors of the human-written entries on a field report.
    /// Reporters may only see and edit reports they authored.
    pub async fn field_report_authors<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        number: i32,
    ) -> StoreResult<Vec<String>> {
        let rows: Vec<AuthorRow> = fetch_all(
            conn,
            "field_report_authors",
            "SELECT DISTINCT re.author FROM report_entry re \
             JOIN field_report__report_entry j ON j.report_entry_id = re.id \
             WHERE j.event_id = ? AND j.field_report_number = ? AND re.generated = ?",
            vec![event_id.into(), number.into(), false.into()],
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.author).collect())
    }
}
