//! IMS API server.

use axum_helpers::server::create_app;
use axum_helpers::JwtAuth;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::WrapErr;
use ims_attachments::{AttachmentStore, AttachmentsStoreType, LocalStore, NoStore, S3Store};
use ims_directory::{
    CachedDirectory, ClubhouseDirectory, Directory, DirectoryType, NoopDirectory,
    TestUsersDirectory,
};
use ims_store::{ActionLogWriter, Store};
use std::sync::Arc;
use tracing::info;

mod api;
mod bus;
mod config;
mod state;

use bus::EventBus;
use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment, &config.log_level);

    let store = Store::connect(&config.store)
        .await
        .wrap_err("connecting to the store")?;
    store.check_schema().await.wrap_err("checking the schema")?;

    let directory: Arc<dyn Directory> = match config.directory.directory_type {
        DirectoryType::ClubhouseDb => {
            let url = config
                .directory
                .clubhouse_db_url
                .as_deref()
                .ok_or_else(|| eyre::eyre!("clubhousedb directory requires a URL"))?;
            let inner = ClubhouseDirectory::connect(url)
                .await
                .wrap_err("connecting to the Clubhouse database")?;
            Arc::new(CachedDirectory::new(inner, config.directory.cache_ttl))
        }
        DirectoryType::TestUsers => Arc::new(TestUsersDirectory::with_default_users()?),
        DirectoryType::Noop => Arc::new(NoopDirectory),
    };

    let attachments: Arc<dyn AttachmentStore> = match config.attachments.store_type {
        AttachmentsStoreType::Local => {
            let dir = config
                .attachments
                .local_dir
                .as_deref()
                .ok_or_else(|| eyre::eyre!("local attachment store requires a directory"))?;
            Arc::new(LocalStore::new(dir))
        }
        AttachmentsStoreType::S3 => Arc::new(S3Store::from_env().await),
        AttachmentsStoreType::None => Arc::new(NoStore),
    };

    let action_log = if config.action_log_enabled {
        ActionLogWriter::spawn(store.clone())
    } else {
        ActionLogWriter::disabled()
    };

    let state = AppState {
        store,
        directory,
        jwt: JwtAuth::new(&config.jwt),
        bus: EventBus::new(),
        action_log,
        attachments,
        attachments_bucket: config.attachments.bucket().to_string(),
        admins: Arc::new(config.admins.clone()),
        cache_control_short: config.cache_control_short,
        cache_control_long: config.cache_control_long,
        max_request_bytes: config.max_request_bytes,
    };

    info!(admins = config.admins.len(), "starting IMS API");
    let router = api::routes(&state);
    create_app(router, &config.server).await?;
    Ok(())
}
