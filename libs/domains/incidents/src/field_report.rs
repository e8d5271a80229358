//! Field report operations.

use crate::diff::{apply_text, ChangeLog};
use crate::error::DomainResult;
use crate::incident::{record_attachment_entry, AttachmentParent};
use crate::model::{FieldReport, FieldReportUpdate};
use crate::time::now_seconds;
use crate::Notification;
use ims_store::{Store, StoreError};
use sea_orm::ConnectionTrait;

pub async fn create_field_report(
    store: &Store,
    event_id: i32,
    author: &str,
    update: FieldReportUpdate,
) -> DomainResult<(i32, Vec<Notification>)> {
    let txn = store.begin().await?;
    let number = store.create_field_report(&txn, event_id, now_seconds()).await?;
    apply_update(store, &txn, event_id, number, author, update, false).await?;
    txn.commit().await?;
    Ok((
        number,
        vec![Notification::FieldReport { event_id, number }],
    ))
}

/// An update whose diff is empty is a full no-op: no generated entry and no
/// notification.
pub async fn update_field_report(
    store: &Store,
    event_id: i32,
    number: i32,
    author: &str,
    update: FieldReportUpdate,
) -> DomainResult<Vec<Notification>> {
    let txn = store.begin().await?;
    if store.field_report(&txn, event_id, number).await?.is_none() {
        return Err(StoreError::NoSuchFieldReport(number).into());
    }
    let changed = apply_update(store, &txn, event_id, number, author, update, true).await?;
    txn.commit().await?;
    if changed {
        Ok(vec![Notification::FieldReport { event_id, number }])
    } else {
        Ok(vec![])
    }
}

async fn apply_update<C: ConnectionTrait>(
    store: &Store,
    txn: &C,
    event_id: i32,
    number: i32,
    author: &str,
    update: FieldReportUpdate,
    record_diff: bool,
) -> DomainResult<bool> {
    let current = store
        .field_report(txn, event_id, number)
        .await?
        .ok_or(StoreError::NoSuchFieldReport(number))?;
    let now = now_seconds();
    let mut log = ChangeLog::new();

    let summary = apply_text(&mut log, "summary", &current.summary, &update.summary);
    store
        .update_field_report_summary(txn, event_id, number, summary.as_deref())
        .await?;

    let mut changed = !log.is_empty();
    if record_diff && changed {
        let entry = store
            .insert_report_entry(txn, now, author, &log.into_text(), true)
            .await?;
        store
            .attach_entry_to_field_report(txn, event_id, number, entry)
            .await?;
    }

    for new_entry in update.report_entries {
        if new_entry.text.is_empty() {
            continue;
        }
        let entry = store
            .insert_report_entry(txn, now, author, &new_entry.text, false)
            .await?;
        store
            .attach_entry_to_field_report(txn, event_id, number, entry)
            .await?;
        changed = true;
    }

    Ok(changed)
}

/// Attach a field report to an incident, or detach it. Records a generated
/// entry on the field report and returns notifications for the report and
/// for both incidents involved in a move.
pub async fn attach_field_report(
    store: &Store,
    event_id: i32,
    number: i32,
    incident_number: Option<i32>,
    author: &str,
) -> DomainResult<Vec<Notification>> {
    let txn = store.begin().await?;
    let current = store
        .field_report(&txn, event_id, number)
        .await?
        .ok_or(StoreError::NoSuchFieldReport(number))?;
    let previous = current.incident_number;

    let text = match incident_number {
        Some(incident) => {
            if store.incident(&txn, event_id, incident).await?.is_none() {
                return Err(StoreError::NoSuchIncident(incident).into());
            }
            format!("Attached to incident: {}", incident)
        }
        None => format!(
            "Detached from incident: {}",
            previous.map(|n| n.to_string()).unwrap_or_default()
        ),
    };

    store
        .set_field_report_incident(&txn, event_id, number, incident_number)
        .await?;
    record_attachment_entry(
        store,
        &txn,
        AttachmentParent::FieldReport(number),
        event_id,
        author,
        now_seconds(),
        &text,
    )
    .await?;
    txn.commit().await?;

    let mut notifications = vec![Notification::FieldReport { event_id, number }];
    for incident in [previous, incident_number].into_iter().flatten() {
        let notification = Notification::Incident { event_id, number: incident };
        if !notifications.contains(&notification) {
            notifications.push(notification);
        }
    }
    Ok(notifications)
}

/// Toggle the stricken flag on an entry attached to this field report.
pub async fn strike_field_report_entry(
    store: &Store,
    event_id: i32,
    number: i32,
    entry_id: i32,
    stricken: Option<bool>,
    author: &str,
) -> DomainResult<Vec<Notification>> {
    let Some(stricken) = stricken else {
        return Ok(vec![]);
    };
    let txn = store.begin().await?;
    if !store
        .entry_attached_to_field_report(&txn, event_id, number, entry_id)
        .await?
    {
        return Err(StoreError::NoSuchReportEntry(entry_id).into());
    }
    store.set_entry_stricken(&txn, entry_id, stricken).await?;
    let verb = if stricken { "Struck" } else { "Unstruck" };
    let entry = store
        .insert_report_entry(
            &txn,
            now_seconds(),
            author,
            &format!("{} reportEntry {}", verb, entry_id),
            true,
        )
        .await?;
    store
        .attach_entry_to_field_report(&txn, event_id, number, entry)
        .await?;
    txn.commit().await?;
    Ok(vec![Notification::FieldReport { event_id, number }])
}

pub async fn read_field_report(
    store: &Store,
    event_name: &str,
    event_id: i32,
    number: i32,
) -> DomainResult<Option<FieldReport>> {
    let conn = store.connection();
    let Some(row) = store.field_report(conn, event_id, number).await? else {
        return Ok(None);
    };
    let entries = store.field_report_entries(conn, event_id, number).await?;
    Ok(Some(FieldReport::assemble(event_name, row, entries)))
}

pub async fn read_field_reports(
    store: &Store,
    event_name: &str,
    event_id: i32,
) -> DomainResult<Vec<FieldReport>> {
    let rows = store.field_reports(event_id).await?;
    let mut reports = Vec::with_capacity(rows.len());
    for row in rows {
        let entries = store
            .field_report_entries(store.connection(), event_id, row.number)
            .await?;
        reports.push(FieldReport::assemble(event_name, row, entries));
    }
    Ok(reports)
}

/// Whether `handle` authored any human entry on the report. Gates access
/// for users holding only the "own field reports" permissions.
pub async fn is_author(
    store: &Store,
    event_id: i32,
    number: i32,
    handle: &str,
) -> DomainResult<bool> {
    let authors = store
        .field_report_authors(store.connection(), event_id, number)
        .await?;
    Ok(authors.iter().any(|a| a.eq_ignore_ascii_case(handle)))
}
