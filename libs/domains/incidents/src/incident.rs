//! Incident operations.

use crate::diff::{apply_text, set_diff, ChangeLog};
use crate::error::{DomainError, DomainResult};
use crate::model::{
    validate_priority, validate_state, Incident, IncidentUpdate, DEFAULT_PRIORITY, DEFAULT_STATE,
};
use crate::time::now_seconds;
use crate::Notification;
use ims_store::{Store, StoreError};
use sea_orm::ConnectionTrait;

/// Create an incident: insert defaults under the next dense number, then
/// route the request body through the update path. Creation records the
/// user-supplied entries but no diff entry; the audit trail starts with the
/// first edit.
pub async fn create_incident(
    store: &Store,
    event_id: i32,
    author: &str,
    update: IncidentUpdate,
) -> DomainResult<(i32, Vec<Notification>)> {
    let txn = store.begin().await?;
    let number = store
        .create_incident(&txn, event_id, now_seconds(), DEFAULT_STATE, DEFAULT_PRIORITY)
        .await?;
    let mut notifications = vec![Notification::Incident { event_id, number }];
    apply_update(store, &txn, event_id, number, author, update, false, &mut notifications)
        .await?;
    txn.commit().await?;
    Ok((number, notifications))
}

/// Apply a diff-shaped update to an existing incident. An update whose diff
/// is empty is a full no-op: no generated entry and no notifications.
pub async fn update_incident(
    store: &Store,
    event_id: i32,
    number: i32,
    author: &str,
    update: IncidentUpdate,
) -> DomainResult<Vec<Notification>> {
    let txn = store.begin().await?;
    if store.incident(&txn, event_id, number).await?.is_none() {
        return Err(StoreError::NoSuchIncident(number).into());
    }
    let mut notifications = Vec::new();
    let changed =
        apply_update(store, &txn, event_id, number, author, update, true, &mut notifications)
            .await?;
    txn.commit().await?;
    if changed {
        notifications.insert(0, Notification::Incident { event_id, number });
    }
    Ok(notifications)
}

#[allow(clippy::too_many_arguments)]
async fn apply_update<C: ConnectionTrait>(
    store: &Store,
    txn: &C,
    event_id: i32,
    number: i32,
    author: &str,
    update: IncidentUpdate,
    record_diff: bool,
    notifications: &mut Vec<Notification>,
) -> DomainResult<bool> {
    let current = store
        .incident(txn, event_id, number)
        .await?
        .ok_or(StoreError::NoSuchIncident(number))?;
    let now = now_seconds();
    let mut log = ChangeLog::new();

    // Scalars. The diff is against the row as seen at the start of the
    // transaction; last writer wins per field.
    let state = match update.state {
        Some(state) => {
            validate_state(&state)?;
            if state != current.state {
                log.changed("state", Some(&state));
            }
            state
        }
        None => current.state.clone(),
    };
    let priority = match update.priority {
        Some(priority) => {
            validate_priority(priority)?;
            if priority != current.priority {
                log.changed("priority", Some(&priority));
            }
            priority
        }
        None => current.priority,
    };
    let summary = apply_text(&mut log, "summary", &current.summary, &update.summary);

    let mut location_name = current.location_name.clone();
    let mut location_concentric = current.location_concentric.clone();
    let mut location_radial_hour = current.location_radial_hour;
    let mut location_radial_minute = current.location_radial_minute;
    let mut location_description = current.location_description.clone();
    if let Some(location) = update.location {
        location_name = apply_text(&mut log, "location name", &location_name, &location.name);
        location_concentric = apply_text(
            &mut log,
            "location concentric",
            &location_concentric,
            &location.concentric,
        );
        if let Some(hour) = location.radial_hour {
            let hour = hour.to_column()?;
            if let Some(h) = hour {
                if !(0..=12).contains(&h) {
                    return Err(DomainError::InvalidValue(format!("radial hour {}", h)));
                }
            }
            if hour != location_radial_hour {
                log.changed("location radial hour", hour.as_ref());
                location_radial_hour = hour;
            }
        }
        if let Some(minute) = location.radial_minute {
            let minute = minute.to_column()?;
            if let Some(m) = minute {
                if !(0..=59).contains(&m) {
                    return Err(DomainError::InvalidValue(format!("radial minute {}", m)));
                }
            }
            if minute != location_radial_minute {
                log.changed("location radial minute", minute.as_ref());
                location_radial_minute = minute;
            }
        }
        location_description = apply_text(
            &mut log,
            "location description",
            &location_description,
            &location.description,
        );
    }

    store
        .update_incident(
            txn,
            event_id,
            number,
            &state,
            priority,
            summary.as_deref(),
            location_name.as_deref(),
            location_concentric.as_deref(),
            location_radial_hour,
            location_radial_minute,
            location_description.as_deref(),
        )
        .await?;

    // Set-valued associations: desired state lists on the wire, add/remove
    // rows in the transaction.
    if let Some(desired) = update.ranger_handles {
        let current = store.incident_rangers(txn, event_id, number).await?;
        let (add, remove) = set_diff(&current, &desired);
        for handle in add {
            store.add_incident_ranger(txn, event_id, number, &handle).await?;
            log.push(format!("Added Ranger: {}", handle));
        }
        for handle in remove {
            store.remove_incident_ranger(txn, event_id, number, &handle).await?;
            log.push(format!("Removed Ranger: {}", handle));
        }
    }

    if let Some(desired) = update.incident_types {
        let current = store.incident_type_names(txn, event_id, number).await?;
        let (add, remove) = set_diff(&current, &desired);
        for name in add {
            store.add_incident_type(txn, event_id, number, &name).await?;
            log.push(format!("Added type: {}", name));
        }
        for name in remove {
            store.remove_incident_type(txn, event_id, number, &name).await?;
            log.push(format!("Removed type: {}", name));
        }
    }

    if let Some(desired) = update.linked_incidents {
        let current = store.linked_incident_numbers(txn, event_id, number).await?;
        let (add, remove) = set_diff(&current, &desired);
        for linked in add {
            if store.incident(txn, event_id, linked).await?.is_none() {
                return Err(StoreError::NoSuchIncident(linked).into());
            }
            store.link_incident(txn, event_id, number, linked).await?;
            log.push(format!("Added linked incident: {}", linked));
        }
        for linked in remove {
            store.unlink_incident(txn, event_id, number, linked).await?;
            log.push(format!("Removed linked incident: {}", linked));
        }
    }

    if let Some(desired) = update.field_reports {
        let current = store.field_reports_attached(txn, event_id, number).await?;
        let (add, remove) = set_diff(&current, &desired);
        for fr in add {
            if store.field_report(txn, event_id, fr).await?.is_none() {
                return Err(StoreError::NoSuchFieldReport(fr).into());
            }
            store.set_field_report_incident(txn, event_id, fr, Some(number)).await?;
            record_attachment_entry(
                store,
                txn,
                AttachmentParent::FieldReport(fr),
                event_id,
                author,
                now,
                &format!("Attached to incident: {}", number),
            )
            .await?;
            log.push(format!("Added field report: {}", fr));
            notifications.push(Notification::FieldReport { event_id, number: fr });
        }
        for fr in remove {
            store.set_field_report_incident(txn, event_id, fr, None).await?;
            record_attachment_entry(
                store,
                txn,
                AttachmentParent::FieldReport(fr),
                event_id,
                author,
                now,
                &format!("Detached from incident: {}", number),
            )
            .await?;
            log.push(format!("Removed field report: {}", fr));
            notifications.push(Notification::FieldReport { event_id, number: fr });
        }
    }

    if let Some(desired) = update.stays {
        let current = store.stays_attached(txn, event_id, number).await?;
        let (add, remove) = set_diff(&current, &desired);
        for stay in add {
            if store.stay(txn, event_id, stay).await?.is_none() {
                return Err(StoreError::NoSuchStay(stay).into());
            }
            store.set_stay_incident(txn, event_id, stay, Some(number)).await?;
            record_attachment_entry(
                store,
                txn,
                AttachmentParent::Stay(stay),
                event_id,
                author,
                now,
                &format!("Attached to incident: {}", number),
            )
            .await?;
            log.push(format!("Added stay: {}", stay));
            notifications.push(Notification::Stay { event_id, number: stay });
        }
        for stay in remove {
            store.set_stay_incident(txn, event_id, stay, None).await?;
            record_attachment_entry(
                store,
                txn,
                AttachmentParent::Stay(stay),
                event_id,
                author,
                now,
                &format!("Detached from incident: {}", number),
            )
            .await?;
            log.push(format!("Removed stay: {}", stay));
            notifications.push(Notification::Stay { event_id, number: stay });
        }
    }

    // One generated entry per non-empty diff.
    let mut changed = !log.is_empty();
    if record_diff && changed {
        let entry = store
            .insert_report_entry(txn, now, author, &log.into_text(), true)
            .await?;
        store.attach_entry_to_incident(txn, event_id, number, entry).await?;
    }

    for new_entry in update.report_entries {
        if new_entry.text.is_empty() {
            continue;
        }
        let entry = store
            .insert_report_entry(txn, now, author, &new_entry.text, false)
            .await?;
        store.attach_entry_to_incident(txn, event_id, number, entry).await?;
        changed = true;
    }

    Ok(changed)
}

pub(crate) enum AttachmentParent {
    FieldReport(i32),
    Stay(i32),
}

/// Insert the generated entry that records an attach/detach on the other
/// side of the relation.
pub(crate) async fn record_attachment_entry<C: ConnectionTrait>(
    store: &Store,
    txn: &C,
    parent: AttachmentParent,
    event_id: i32,
    author: &str,
    now: f64,
    text: &str,
) -> DomainResult<()> {
    let entry = store.insert_report_entry(txn, now, author, text, true).await?;
    match parent {
        AttachmentParent::FieldReport(number) => {
            store
                .attach_entry_to_field_report(txn, event_id, number, entry)
                .await?;
        }
        AttachmentParent::Stay(number) => {
            store.attach_entry_to_stay(txn, event_id, number, entry).await?;
        }
    }
    Ok(())
}

/// Toggle the stricken flag on an entry attached to this incident. A `None`
/// flag is a no-op.
pub async fn strike_incident_entry(
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
        .entry_attached_to_incident(&txn, event_id, number, entry_id)
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
    store.attach_entry_to_incident(&txn, event_id, number, entry).await?;
    txn.commit().await?;
    Ok(vec![Notification::Incident { event_id, number }])
}

/// Fetch and assemble one incident with all denormalized children.
pub async fn read_incident(
    store: &Store,
    event_name: &str,
    event_id: i32,
    number: i32,
) -> DomainResult<Option<Incident>> {
    let conn = store.connection();
    let Some(row) = store.incident(conn, event_id, number).await? else {
        return Ok(None);
    };
    let types = store.incident_type_names(conn, event_id, number).await?;
    let rangers = store.incident_rangers(conn, event_id, number).await?;
    let field_reports = store.field_reports_attached(conn, event_id, number).await?;
    let stays = store.stays_attached(conn, event_id, number).await?;
    let linked = store.linked_incident_numbers(conn, event_id, number).await?;
    let entries = store.incident_entries(conn, event_id, number).await?;
    Ok(Some(Incident::assemble(
        event_name,
        row,
        types,
        rangers,
        field_reports,
        stays,
        linked,
        entries,
    )))
}

pub async fn read_incidents(
    store: &Store,
    event_name: &str,
    event_id: i32,
) -> DomainResult<Vec<Incident>> {
    let rows = store.incidents(event_id).await?;
    let mut incidents = Vec::with_capacity(rows.len());
    for row in rows {
        let number = row.number;
        if let Some(incident) = read_incident(store, event_name, event_id, number).await? {
            incidents.push(incident);
        }
    }
    Ok(incidents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IncidentUpdate, LocationUpdate, NewReportEntry, NumberOrText};

    async fn setup() -> (Store, i32) {
        let store = Store::connect_fake().await.unwrap();
        let event_id = store.create_event("Burn2025", false, None).await.unwrap();
        (store, event_id)
    }

    #[tokio::test]
    async fn create_applies_the_body_without_a_diff_entry() {
        let (store, event_id) = setup().await;
        let update = IncidentUpdate {
            state: Some("new".to_string()),
            priority: Some(5),
            summary: Some("Fire at 6:00".to_string()),
            location: Some(LocationUpdate {
                radial_hour: Some(NumberOrText::Text("6".to_string())),
                radial_minute: Some(NumberOrText::Text("00".to_string())),
                ..LocationUpdate::default()
            }),
            report_entries: vec![NewReportEntry {
                text: "sparks".to_string(),
            }],
            ..IncidentUpdate::default()
        };

        let (number, notifications) =
            create_incident(&store, event_id, "Alice", update).await.unwrap();
        assert_eq!(number, 1);
        assert_eq!(
            notifications,
            vec![Notification::Incident { event_id, number: 1 }]
        );

        let incident = read_incident(&store, "Burn2025", event_id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(incident.priority, 5);
        assert_eq!(incident.summary.as_deref(), Some("Fire at 6:00"));
        assert_eq!(incident.location.radial_hour, Some(6));
        assert_eq!(incident.report_entries.len(), 1);
        assert_eq!(incident.report_entries[0].text, "sparks");
        assert!(!incident.report_entries[0].generated);
    }

    #[tokio::test]
    async fn update_emits_one_generated_entry_per_diff() {
        let (store, event_id) = setup().await;
        let (number, _) = create_incident(
            &store,
            event_id,
            "Alice",
            IncidentUpdate {
                priority: Some(5),
                report_entries: vec![NewReportEntry {
                    text: "sparks".to_string(),
                }],
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();

        update_incident(
            &store,
            event_id,
            number,
            "Alice",
            IncidentUpdate {
                priority: Some(3),
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();

        let incident = read_incident(&store, "Burn2025", event_id, number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(incident.report_entries.len(), 2);
        let system = &incident.report_entries[1];
        assert!(system.generated);
        assert_eq!(system.text, "Changed priority: 3");
    }

    #[tokio::test]
    async fn noop_update_emits_nothing() {
        let (store, event_id) = setup().await;
        let (number, _) =
            create_incident(&store, event_id, "Alice", IncidentUpdate::default())
                .await
                .unwrap();

        // Same priority as the default: no diff, no entry, no notification.
        let notifications = update_incident(
            &store,
            event_id,
            number,
            "Alice",
            IncidentUpdate {
                priority: Some(3),
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(notifications.is_empty());

        let notifications =
            update_incident(&store, event_id, number, "Alice", IncidentUpdate::default())
                .await
                .unwrap();
        assert!(notifications.is_empty());

        let incident = read_incident(&store, "Burn2025", event_id, number)
            .await
            .unwrap()
            .unwrap();
        assert!(incident.report_entries.is_empty());
    }

    #[tokio::test]
    async fn new_entries_alone_still_notify() {
        let (store, event_id) = setup().await;
        let (number, _) =
            create_incident(&store, event_id, "Alice", IncidentUpdate::default())
                .await
                .unwrap();

        let notifications = update_incident(
            &store,
            event_id,
            number,
            "Alice",
            IncidentUpdate {
                report_entries: vec![NewReportEntry {
                    text: "on scene".to_string(),
                }],
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(
            notifications,
            vec![Notification::Incident { event_id, number }]
        );
    }

    #[tokio::test]
    async fn ranger_set_diffs_to_add_and_remove_lines() {
        let (store, event_id) = setup().await;
        let (number, _) = create_incident(
            &store,
            event_id,
            "Alice",
            IncidentUpdate {
                ranger_handles: Some(vec!["Hardware".to_string(), "Tulsa".to_string()]),
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();

        update_incident(
            &store,
            event_id,
            number,
            "Alice",
            IncidentUpdate {
                ranger_handles: Some(vec!["Tulsa".to_string(), "Moonbeam".to_string()]),
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();

        let incident = read_incident(&store, "Burn2025", event_id, number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(incident.ranger_handles, vec!["Moonbeam", "Tulsa"]);
        let system = incident.report_entries.last().unwrap();
        assert!(system.text.contains("Added Ranger: Moonbeam"));
        assert!(system.text.contains("Removed Ranger: Hardware"));
    }

    #[tokio::test]
    async fn attaching_a_field_report_notifies_it_and_records_entries() {
        let (store, event_id) = setup().await;
        let (number, _) =
            create_incident(&store, event_id, "Alice", IncidentUpdate::default())
                .await
                .unwrap();
        let (fr, _) = crate::field_report::create_field_report(
            &store,
            event_id,
            "Alice",
            crate::model::FieldReportUpdate::default(),
        )
        .await
        .unwrap();

        let notifications = update_incident(
            &store,
            event_id,
            number,
            "Alice",
            IncidentUpdate {
                field_reports: Some(vec![fr]),
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();

        assert!(notifications.contains(&Notification::FieldReport { event_id, number: fr }));
        let report = crate::field_report::read_field_report(&store, "Burn2025", event_id, fr)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.incident_number, Some(number));
        let attach_entry = report.report_entries.last().unwrap();
        assert!(attach_entry.generated);
        assert_eq!(attach_entry.text, format!("Attached to incident: {}", number));
    }

    #[tokio::test]
    async fn unknown_state_is_rejected() {
        let (store, event_id) = setup().await;
        let result = create_incident(
            &store,
            event_id,
            "Alice",
            IncidentUpdate {
                state: Some("escalated".to_string()),
                ..IncidentUpdate::default()
            },
        )
        .await;
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[tokio::test]
    async fn strike_records_a_system_entry_on_the_parent() {
        let (store, event_id) = setup().await;
        let (number, _) = create_incident(
            &store,
            event_id,
            "Alice",
            IncidentUpdate {
                report_entries: vec![NewReportEntry {
                    text: "wrong incident".to_string(),
                }],
                ..IncidentUpdate::default()
            },
        )
        .await
        .unwrap();

        let incident = read_incident(&store, "Burn2025", event_id, number)
            .await
            .unwrap()
            .unwrap();
        let entry_id = incident.report_entries[0].id;

        strike_incident_entry(&store, event_id, number, entry_id, Some(true), "Alice")
            .await
            .unwrap();

        let incident = read_incident(&store, "Burn2025", event_id, number)
            .await
            .unwrap()
            .unwrap();
        assert!(incident.report_entries[0].stricken);
        assert_eq!(
            incident.report_entries[1].text,
            format!("Struck reportEntry {}", entry_id)
        );

        // None flag is a no-op.
        let none = strike_incident_entry(&store, event_id, number, entry_id, None, "Alice")
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
