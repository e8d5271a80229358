//! Report entries: the append-only journal rows shared by incidents, field
//! reports and stays.

use crate::error::{StoreError, StoreResult};
use crate::rows::ReportEntryRow;
use crate::{exec, fetch_one, Store};
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult};

#[derive(Debug, FromQueryResult)]
struct InsertIdRow {
    id: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    n: i64,
}

impl Store {
    /// Insert an entry and return its id, read back with the backend's
    /// last-insert-id function inside the same connection or transaction.
    pub async fn insert_report_entry<C: ConnectionTrait>(
        &self,
        conn: &C,
        created: f64,
        author: &str,
        text: &str,
        generated: bool,
    ) -> StoreResult<i32> {
        exec(
            conn,
            "insert_report_entry",
            "INSERT INTO report_entry (created, author, text, generated, stricken) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                created.into(),
                author.into(),
                text.into(),
                generated.into(),
                false.into(),
            ],
        )
        .await?;

        let sql = match conn.get_database_backend() {
            DatabaseBackend::MySql => "SELECT CAST(LAST_INSERT_ID() AS SIGNED) AS id",
            _ => "SELECT last_insert_rowid() AS id",
        };
        let row: Option<InsertIdRow> = fetch_one(conn, "report_entry_id", sql, vec![]).await?;
        row.map(|r| r.id as i32).ok_or(StoreError::NoSuchReportEntry(0))
    }

    pub async fn report_entry<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
    ) -> StoreResult<Option<ReportEntryRow>> {
        fetch_one(
            conn,
            "report_entry",
            "SELECT id, created, author, text, generated, stricken, \
             attached_file, attached_file_name, attached_file_media_type \
             FROM report_entry WHERE id = ?",
            vec![id.into()],
        )
        .await
    }

    pub async fn set_entry_stricken<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
        stricken: bool,
    ) -> StoreResult<()> {
        exec(
            conn,
            "set_entry_stricken",
            "UPDATE report_entry SET stricken = ? WHERE id = ?",
            vec![stricken.into(), id.into()],
        )
        .await?;
        Ok(())
    }

    /// Record the stored attachment on an entry.
    pub async fn set_entry_attachment<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
        file_id: &str,
        file_name: &str,
        media_type: Option<&str>,
    ) -> StoreResult<()> {
        exec(
            conn,
            "set_entry_attachment",
            "UPDATE report_entry SET attached_file = ?, attached_file_name = ?, \
             attached_file_media_type = ? WHERE id = ?",
            vec![file_id.into(), file_name.into(), media_type.into(), id.into()],
        )
        .await?;
        Ok(())
    }

    /// Whether an entry belongs to the named incident. Strike and attachment
    /// operations address entries by id but are scoped to a parent.
    pub async fn entry_attached_to_incident<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        incident_number: i32,
        entry_id: i32,
    ) -> StoreResult<bool> {
        let row: Option<CountRow> = fetch_one(
            conn,
            "entry_attached_to_incident",
            "SELECT COUNT(*) AS n FROM incident__report_entry \
             WHERE event_id = ? AND incident_number = ? AND report_entry_id = ?",
            vec![event_id.into(), incident_number.into(), entry_id.into()],
        )
        .await?;
        Ok(row.map(|r| r.n > 0).unwrap_or(false))
    }

    pub async fn entry_attached_to_field_report<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        field_report_number: i32,
        entry_id: i32,
    ) -> StoreResult<bool> {
        let row: Option<CountRow> = fetch_one(
            conn,
            "entry_attached_to_field_report",
            "SELECT COUNT(*) AS n FROM field_report__report_entry \
             WHERE event_id = ? AND field_report_number = ? AND report_entry_id = ?",
            vec![event_id.into(), field_report_number.into(), entry_id.into()],
        )
        .await?;
        Ok(row.map(|r| r.n > 0).unwrap_or(false))
    }

    pub async fn entry_attached_to_stay<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: i32,
        stay_number: i32,
        entry_id: i32,
    ) -> StoreResult<bool> {
        let row: Option<CountRow> = fetch_one(
            conn,
            "entry_attached_to_stay",
            "SELECT COUNT(*) AS n FROM stay__report_entry \
             WHERE event_id = ? AND stay_number = ? AND report_entry_id = ?",
            vec![event_id.into(), stay_number.into(), entry_id.into()],
        )
        .await?;
        Ok(row.map(|r| r.n > 0).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;

    #[tokio::test]
    async fn entry_ids_are_globally_monotone() {
        let store = Store::connect_fake().await.unwrap();
        let conn = store.connection();
        let a = store
            .insert_report_entry(conn, 1.0, "Hardware", "first", false)
            .await
            .unwrap();
        let b = store
            .insert_report_entry(conn, 2.0, "Hardware", "second", true)
            .await
            .unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn strike_toggles_without_deleting() {
        let store = Store::connect_fake().await.unwrap();
        let conn = store.connection();
        let id = store
            .insert_report_entry(conn, 1.0, "Tulsa", "wrong incident, ignore", false)
            .await
            .unwrap();

        store.set_entry_stricken(conn, id, true).await.unwrap();
        let row = store.report_entry(conn, id).await.unwrap().unwrap();
        assert!(row.stricken);
        assert_eq!(row.text, "wrong incident, ignore");

        store.set_entry_stricken(conn, id, false).await.unwrap();
        let row = store.report_entry(conn, id).await.unwrap().unwrap();
        assert!(!row.stricken);
    }

    #[tokio::test]
    async fn membership_is_scoped_to_the_parent() {
        let store = Store::connect_fake().await.unwrap();
        let event = store.create_event("Burn2025", false, None).await.unwrap();
        let conn = store.connection();
        let i1 = store.create_incident(conn, event, 1.0, "new", 3).await.unwrap();
        let i2 = store.create_incident(conn, event, 2.0, "new", 3).await.unwrap();

        let entry = store
            .insert_report_entry(conn, 3.0, "Tulsa", "note", false)
            .await
            .unwrap();
        store.attach_entry_to_incident(conn, event, i1, entry).await.unwrap();

        assert!(store
            .entry_attached_to_incident(conn, event, i1, entry)
            .await
            .unwrap());
        assert!(!store
            .entry_attached_to_incident(conn, event, i2, entry)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn attachment_metadata_round_trips() {
        let store = Store::connect_fake().await.unwrap();
        let conn = store.connection();
        let id = store
            .insert_report_entry(conn, 1.0, "Tulsa", "photo attached", false)
            .await
            .unwrap();
        store
            .set_entry_attachment(conn, id, "file-abc123", "scene.jpg", Some("image/jpeg"))
            .await
            .unwrap();

        let row = store.report_entry(conn, id).await.unwrap().unwrap();
        assert_eq!(row.attached_file.as_deref(), Some("file-abc123"));
        assert_eq!(row.attached_file_name.as_deref(), Some("scene.jpg"));
        assert_eq!(row.attached_file_media_type.as_deref(), Some("image/jpeg"));
    }
}
