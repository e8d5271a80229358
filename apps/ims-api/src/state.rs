//! Shared application state.

use crate::bus::EventBus;
use axum_helpers::JwtAuth;
use ims_attachments::AttachmentStore;
use ims_directory::Directory;
use ims_store::{ActionLogWriter, Store};
use std::sync::Arc;

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub directory: Arc<dyn Directory>,
    pub jwt: JwtAuth,
    pub bus: EventBus,
    pub action_log: ActionLogWriter,
    pub attachments: Arc<dyn AttachmentStore>,
    /// Bucket (or local subdirectory) attachment objects live under.
    pub attachments_bucket: String,
    /// Handles granted the administrator bundle.
    pub admins: Arc<Vec<String>>,
    pub cache_control_short: u64,
    pub cache_control_long: u64,
    pub max_request_bytes: usize,
}
