//! File attachments on report entries.
//!
//! Uploads create a fresh user-authored entry, store the bytes under a
//! generated object key and record the original filename and media type on
//! the entry. Downloads stream the stored bytes back.

use super::{domain_error, event_gate, event_mask, store_error};
use crate::api::field_reports::require_authorship;
use crate::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use axum_helpers::{AccessClaims, AppError};
use domain_access::EventPermissions;
use domain_incidents::time::now_seconds;
use domain_incidents::Notification;
use ims_attachments::{new_object_key, AttachmentError};
use ims_store::rows::EventRow;
use sea_orm::DatabaseTransaction;
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event}/incidents/{number}/attachments",
            post(upload_incident),
        )
        .route(
            "/events/{event}/incidents/{number}/attachments/{entry}",
            get(download_incident),
        )
        .route(
            "/events/{event}/field_reports/{number}/attachments",
            post(upload_field_report),
        )
        .route(
            "/events/{event}/field_reports/{number}/attachments/{entry}",
            get(download_field_report),
        )
        .route(
            "/events/{event}/stays/{number}/attachments",
            post(upload_stay),
        )
        .route(
            "/events/{event}/stays/{number}/attachments/{entry}",
            get(download_stay),
        )
}

#[derive(Clone, Copy)]
enum Parent {
    Incident,
    FieldReport,
    Stay,
}

impl Parent {
    fn path_segment(self) -> &'static str {
        match self {
            Self::Incident => "incidents",
            Self::FieldReport => "field_reports",
            Self::Stay => "stays",
        }
    }

    fn notification(self, event_id: i32, number: i32) -> Notification {
        match self {
            Self::Incident => Notification::Incident { event_id, number },
            Self::FieldReport => Notification::FieldReport { event_id, number },
            Self::Stay => Notification::Stay { event_id, number },
        }
    }
}

fn attachment_error(err: AttachmentError) -> AppError {
    match err {
        AttachmentError::Disabled => {
            AppError::BadRequest("attachments are not enabled".to_string())
        }
        AttachmentError::UnsafeName(_) => AppError::BadRequest(err.to_string()),
        other => AppError::internal("attachment store", other),
    }
}

/// The first file part of the multipart body.
async fn read_upload(
    multipart: &mut Multipart,
) -> Result<(Vec<u8>, String, Option<String>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let media_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok((bytes.to_vec(), file_name, media_type));
    }
    Err(AppError::BadRequest(
        "multipart body contains no file".to_string(),
    ))
}

async fn parent_exists(
    state: &AppState,
    txn: &DatabaseTransaction,
    parent: Parent,
    event_id: i32,
    number: i32,
) -> Result<bool, AppError> {
    let found = match parent {
        Parent::Incident => state
            .store
            .incident(txn, event_id, number)
            .await
            .map_err(store_error)?
            .is_some(),
        Parent::FieldReport => state
            .store
            .field_report(txn, event_id, number)
            .await
            .map_err(store_error)?
            .is_some(),
        Parent::Stay => state
            .store
            .stay(txn, event_id, number)
            .await
            .map_err(store_error)?
            .is_some(),
    };
    Ok(found)
}

async fn upload(
    state: AppState,
    event: EventRow,
    parent: Parent,
    number: i32,
    author: &str,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (bytes, file_name, media_type) = read_upload(&mut multipart).await?;
    let size = bytes.len();
    let key = new_object_key();
    state
        .attachments
        .put_object(&state.attachments_bucket, &key, bytes)
        .await
        .map_err(attachment_error)?;

    let txn = state.store.begin().await.map_err(store_error)?;
    if !parent_exists(&state, &txn, parent, event.id, number).await? {
        return Err(AppError::NotFound(format!(
            "no such {}: {}",
            parent.path_segment(),
            number
        )));
    }
    let entry = state
        .store
        .insert_report_entry(&txn, now_seconds(), author, "", false)
        .await
        .map_err(store_error)?;
    match parent {
        Parent::Incident => state
            .store
            .attach_entry_to_incident(&txn, event.id, number, entry)
            .await
            .map_err(store_error)?,
        Parent::FieldReport => state
            .store
            .attach_entry_to_field_report(&txn, event.id, number, entry)
            .await
            .map_err(store_error)?,
        Parent::Stay => state
            .store
            .attach_entry_to_stay(&txn, event.id, number, entry)
            .await
            .map_err(store_error)?,
    }
    state
        .store
        .set_entry_attachment(&txn, entry, &key, &file_name, media_type.as_deref())
        .await
        .map_err(store_error)?;
    txn.commit()
        .await
        .map_err(|e| AppError::internal("commit attachment", e))?;

    info!(
        event = %event.name,
        entry,
        size,
        "stored attachment"
    );
    state
        .bus
        .publish(&event.name, &[parent.notification(event.id, number)]);

    Ok((
        StatusCode::CREATED,
        [(
            header::LOCATION,
            format!(
                "/ims/api/events/{}/{}/{}/attachments/{}",
                event.name,
                parent.path_segment(),
                number,
                entry
            ),
        )],
    )
        .into_response())
}

async fn download(
    state: AppState,
    event: EventRow,
    parent: Parent,
    number: i32,
    entry: i32,
) -> Result<Response, AppError> {
    let conn = state.store.connection();
    let attached = match parent {
        Parent::Incident => state
            .store
            .entry_attached_to_incident(conn, event.id, number, entry)
            .await
            .map_err(store_error)?,
        Parent::FieldReport => state
            .store
            .entry_attached_to_field_report(conn, event.id, number, entry)
            .await
            .map_err(store_error)?,
        Parent::Stay => state
            .store
            .entry_attached_to_stay(conn, event.id, number, entry)
            .await
            .map_err(store_error)?,
    };
    if !attached {
        return Err(AppError::NotFound(format!(
            "no such report entry: {}",
            entry
        )));
    }

    let row = state
        .store
        .report_entry(conn, entry)
        .await
        .map_err(store_error)?
        .ok_or_else(|| AppError::NotFound(format!("no such report entry: {}", entry)))?;
    let Some(key) = row.attached_file else {
        return Err(AppError::NotFound(format!(
            "report entry {} has no attachment",
            entry
        )));
    };
    let bytes = state
        .attachments
        .get_object(&state.attachments_bucket, &key)
        .await
        .map_err(attachment_error)?
        .ok_or_else(|| AppError::NotFound(format!("attachment object missing: {}", key)))?;

    let media_type = row
        .attached_file_media_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = match row.attached_file_name {
        Some(name) => format!("attachment; filename=\"{}\"", name.replace('"', "")),
        None => "attachment".to_string(),
    };
    Ok((
        [
            (header::CONTENT_TYPE, media_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn upload_incident(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Extension(claims): Extension<AccessClaims>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_INCIDENTS).await?;
    let author = claims.han.clone();
    upload(state, event, Parent::Incident, number, &author, multipart).await
}

async fn download_incident(
    State(state): State<AppState>,
    Path((event, number, entry)): Path<(String, i32, i32)>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_INCIDENTS).await?;
    download(state, event, Parent::Incident, number, entry).await
}

async fn upload_field_report(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Extension(claims): Extension<AccessClaims>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (event, mask) = event_mask(&state, &claims, &event).await?;
    let write_all = mask.contains(EventPermissions::WRITE_ALL_FIELD_REPORTS);
    if !write_all && !mask.contains(EventPermissions::WRITE_OWN_FIELD_REPORTS) {
        return Err(AppError::missing_permission(
            EventPermissions::WRITE_OWN_FIELD_REPORTS,
        ));
    }
    let event = event.ok_or_else(|| AppError::NotFound("no such event".to_string()))?;
    if !write_all {
        require_authorship(
            &state,
            event.id,
            number,
            &claims.han,
            EventPermissions::WRITE_ALL_FIELD_REPORTS,
        )
        .await?;
    }
    let author = claims.han.clone();
    upload(
        state,
        event,
        Parent::FieldReport,
        number,
        &author,
        multipart,
    )
    .await
}

async fn download_field_report(
    State(state): State<AppState>,
    Path((event, number, entry)): Path<(String, i32, i32)>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let (event, mask) = event_mask(&state, &claims, &event).await?;
    let read_all = mask.contains(EventPermissions::READ_ALL_FIELD_REPORTS);
    if !read_all && !mask.contains(EventPermissions::READ_OWN_FIELD_REPORTS) {
        return Err(AppError::missing_permission(
            EventPermissions::READ_OWN_FIELD_REPORTS,
        ));
    }
    let event = event.ok_or_else(|| AppError::NotFound("no such event".to_string()))?;
    if !read_all {
        let report =
            domain_incidents::field_report::read_field_report(&state.store, &event.name, event.id, number)
                .await
                .map_err(domain_error)?
                .ok_or_else(|| AppError::NotFound(format!("no such field report: {}", number)))?;
        let own = report
            .report_entries
            .iter()
            .any(|e| !e.generated && e.author.eq_ignore_ascii_case(&claims.han));
        if !own {
            return Err(AppError::missing_permission(
                EventPermissions::READ_ALL_FIELD_REPORTS,
            ));
        }
    }
    download(state, event, Parent::FieldReport, number, entry).await
}

async fn upload_stay(
    State(state): State<AppState>,
    Path((event, number)): Path<(String, i32)>,
    Extension(claims): Extension<AccessClaims>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::WRITE_STAYS).await?;
    let author = claims.han.clone();
    upload(state, event, Parent::Stay, number, &author, multipart).await
}

async fn download_stay(
    State(state): State<AppState>,
    Path((event, number, entry)): Path<(String, i32, i32)>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Response, AppError> {
    let event = event_gate(&state, &claims, &event, EventPermissions::READ_STAYS).await?;
    download(state, event, Parent::Stay, number, entry).await
}
