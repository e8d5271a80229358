//! Stay operations.

use crate::diff::{apply_text, ChangeLog};
use crate::error::DomainResult;
use crate::model::{Stay, StayUpdate, TravelBlockUpdate};
use crate::time::{now_seconds, parse_instant, seconds_to_rfc3339};
use crate::Notification;
use ims_store::{StayValues, Store, StoreError};
use sea_orm::ConnectionTrait;

pub async fn create_stay(
    store: &Store,
    event_id: i32,
    author: &str,
    update: StayUpdate,
) -> DomainResult<(i32, Vec<Notification>)> {
    let txn = store.begin().await?;
    let number = store.create_stay(&txn, event_id, now_seconds()).await?;
    let mut notifications = vec![Notification::Stay { event_id, number }];
    apply_update(store, &txn, event_id, number, author, update, false, &mut notifications)
        .await?;
    txn.commit().await?;
    Ok((number, notifications))
}

/// An update whose diff is empty is a full no-op: no generated entry and no
/// notifications.
pub async fn update_stay(
    store: &Store,
    event_id: i32,
    number: i32,
    author: &str,
    update: StayUpdate,
) -> DomainResult<Vec<Notification>> {
    let txn = store.begin().await?;
    if store.stay(&txn, event_id, number).await?.is_none() {
        return Err(StoreError::NoSuchStay(number).into());
    }
    let mut notifications = Vec::new();
    let changed =
        apply_update(store, &txn, event_id, number, author, update, true, &mut notifications)
            .await?;
    txn.commit().await?;
    if changed {
        notifications.insert(0, Notification::Stay { event_id, number });
    }
    Ok(notifications)
}

/// Resolve one travel-block instant: absent leaves, empty text clears.
fn apply_instant(
    log: &mut ChangeLog,
    field: &str,
    current: Option<f64>,
    incoming: &Option<serde_json::Value>,
) -> DomainResult<Option<f64>> {
    match incoming {
        None => Ok(current),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
            if current.is_some() {
                log.changed::<String>(field, None);
            }
            Ok(None)
        }
        Some(value) => {
            let seconds = parse_instant(value)?;
            let changed = current.map_or(true, |c| (c - seconds).abs() > 1e-6);
            if changed {
                log.changed(field, Some(&seconds_to_rfc3339(seconds)));
            }
            Ok(Some(seconds))
        }
    }
}

fn apply_travel_block(
    log: &mut ChangeLog,
    prefix: &str,
    time: &mut Option<f64>,
    method: &mut Option<String>,
    state: &mut Option<String>,
    reason: &mut Option<String>,
    belongings: &mut Option<String>,
    update: &TravelBlockUpdate,
) -> DomainResult<()> {
    *time = apply_instant(log, &format!("{} time", prefix), *time, &update.time)?;
    *method = apply_text(log, &format!("{} method", prefix), method, &update.method);
    *state = apply_text(log, &format!("{} state", prefix), state, &update.state);
    *reason = apply_text(log, &format!("{} reason", prefix), reason, &update.reason);
    *belongings = apply_text(
        log,
        &format!("{} belongings", prefix),
        belongings,
        &update.belongings,
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn apply_update<C: ConnectionTrait>(
    store: &Store,
    txn: &C,
    event_id: i32,
    number: i32,
    author: &str,
    update: StayUpdate,
    record_diff: bool,
    notifications: &mut Vec<Notification>,
) -> DomainResult<bool> {
    let current = store
        .stay(txn, event_id, number)
        .await?
        .ok_or(StoreError::NoSuchStay(number))?;
    let now = now_seconds();
    let mut log = ChangeLog::new();

    let mut values = StayValues {
        incident_number: current.incident_number,
        preferred_name: current.preferred_name.clone(),
        legal_name: current.legal_name.clone(),
        guest_description: current.guest_description.clone(),
        camp_info: current.camp_info.clone(),
        arrival_time: current.arrival_time,
        arrival_method: current.arrival_method.clone(),
        arrival_state: current.arrival_state.clone(),
        arrival_reason: current.arrival_reason.clone(),
        arrival_belongings: current.arrival_belongings.clone(),
        departure_time: current.departure_time,
        departure_method: current.departure_method.clone(),
        departure_state: current.departure_state.clone(),
        departure_reason: current.departure_reason.clone(),
        departure_belongings: current.departure_belongings.clone(),
        resource_use: current.resource_use.clone(),
    };

    if let Some(ref incident) = update.incident_number {
        let incident = incident.to_column()?;
        if incident != current.incident_number {
            if let Some(n) = incident {
                if store.incident(txn, event_id, n).await?.is_none() {
                    return Err(StoreError::NoSuchIncident(n).into());
                }
            }
            log.changed("incident", incident.as_ref());
            for n in [current.incident_number, incident].into_iter().flatten() {
                let notification = Notification::Incident { event_id, number: n };
                if !notifications.contains(&notification) {
                    notifications.push(notification);
                }
            }
            values.incident_number = incident;
        }
    }

    values.preferred_name = apply_text(
        &mut log,
        "preferred name",
        &values.preferred_name,
        &update.preferred_name,
    );
    values.legal_name = apply_text(&mut log, "legal name", &values.legal_name, &update.legal_name);
    values.guest_description = apply_text(
        &mut log,
        "guest description",
        &values.guest_description,
        &update.guest_description,
    );
    values.camp_info = apply_text(&mut log, "camp info", &values.camp_info, &update.camp_info);

    if let Some(ref arrival) = update.arrival {
        apply_travel_block(
            &mut log,
            "arrival",
            &mut values.arrival_time,
            &mut values.arrival_method,
            &mut values.arrival_state,
            &mut values.arrival_reason,
            &mut values.arrival_belongings,
            arrival,
        )?;
    }
    if let Some(ref departure) = update.departure {
        apply_travel_block(
            &mut log,
            "departure",
            &mut values.departure_time,
            &mut values.departure_method,
            &mut values.departure_state,
            &mut values.departure_reason,
            &mut values.departure_belongings,
            departure,
        )?;
    }

    if let Some(resource_use) = update.resource_use {
        let incoming = match &resource_use {
            serde_json::Value::Object(map) if map.is_empty() => None,
            _ => Some(resource_use),
        };
        if incoming != values.resource_use {
            log.push("Changed resource use".to_string());
            values.resource_use = incoming;
        }
    }

    store.update_stay(txn, event_id, number, &values).await?;

    if let Some(desired) = update.ranger_assignments {
        let current_rangers = store.stay_rangers(txn, event_id, number).await?;
        for assignment in &desired {
            let existing = current_rangers
                .iter()
                .find(|r| r.ranger_handle == assignment.handle);
            match existing {
                None => {
                    store
                        .add_stay_ranger(
                            txn,
                            event_id,
                            number,
                            &assignment.handle,
                            assignment.role.as_deref(),
                        )
                        .await?;
                    log.push(format!("Added Ranger: {}", assignment.handle));
                }
                Some(row) if row.role != assignment.role => {
                    store
                        .remove_stay_ranger(txn, event_id, number, &assignment.handle)
                        .await?;
                    store
                        .add_stay_ranger(
                            txn,
                            event_id,
                            number,
                            &assignment.handle,
                            assignment.role.as_deref(),
                        )
                        .await?;
                    log.push(format!("Changed Ranger role: {}", assignment.handle));
                }
                Some(_) => {}
            }
        }
        for row in &current_rangers {
            if !desired.iter().any(|a| a.handle == row.ranger_handle) {
                store
                    .remove_stay_ranger(txn, event_id, number, &row.ranger_handle)
                    .await?;
                log.push(format!("Removed Ranger: {}", row.ranger_handle));
            }
        }
    }

    let mut changed = !log.is_empty();
    if record_diff && changed {
        let entry = store
            .insert_report_entry(txn, now, author, &log.into_text(), true)
            .await?;
        store.attach_entry_to_stay(txn, event_id, number, entry).await?;
    }

    for new_entry in update.report_entries {
        if new_entry.text.is_empty() {
            continue;
        }
        let entry = store
            .insert_report_entry(txn, now, author, &new_entry.text, false)
            .await?;
        store.attach_entry_to_stay(txn, event_id, number, entry).await?;
        changed = true;
    }

    Ok(changed)
}

/// Toggle the stricken flag on an entry attached to this stay.
pub async fn strike_stay_entry(
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
        .entry_attached_to_stay(&txn, event_id, number, entry_id)
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
    store.attach_entry_to_stay(&txn, event_id, number, entry).await?;
    txn.commit().await?;
    Ok(vec![Notification::Stay { event_id, number }])
}

pub async fn read_stay(
    store: &Store,
    event_name: &str,
    event_id: i32,
    number: i32,
) -> DomainResult<Option<Stay>> {
    let conn = store.connection();
    let Some(row) = store.stay(conn, event_id, number).await? else {
        return Ok(None);
    };
    let rangers = store.stay_rangers(conn, event_id, number).await?;
    let entries = store.stay_entries(conn, event_id, number).await?;
    Ok(Some(Stay::assemble(event_name, row, rangers, entries)))
}

pub async fn read_stays(
    store: &Store,
    event_name: &str,
    event_id: i32,
) -> DomainResult<Vec<Stay>> {
    let rows = store.stays(event_id).await?;
    let mut stays = Vec::with_capacity(rows.len());
    for row in rows {
        let number = row.number;
        if let Some(stay) = read_stay(store, event_name, event_id, number).await? {
            stays.push(stay);
        }
    }
    Ok(stays)
}
