//! Postbox API Server
//!
//! Main entry point for the Postbox attachment service.

mod settings;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use postbox_api::{AppState, JwtSessions, create_router};
use postbox_core::attachment::{AttachmentPolicy, AttachmentService};
use postbox_core::fetch::HttpByteFetcher;
use postbox_core::storage::StorageService;
use postbox_core::thumbnail::ImageThumbnailer;
use postbox_shared::{JwtConfig, JwtService, LogFormat};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    init_tracing(settings.log.format);

    let policy = AttachmentPolicy::from(&settings.storage);
    let storage = Arc::new(StorageService::from_config(settings.storage.clone())?);
    info!(
        provider = storage.provider_name(),
        max_file_size = policy.max_file_size,
        "Storage configured"
    );

    let fetcher = Arc::new(HttpByteFetcher::new(&settings.fetch, policy.max_file_size)?);
    let thumbnails = Arc::new(ImageThumbnailer::new(
        storage.clone(),
        settings.thumbnails.clone(),
    ));
    let attachments = AttachmentService::new(storage, fetcher, thumbnails, policy);

    let jwt_service = JwtService::new(JwtConfig::from(&settings.jwt));

    let state = AppState {
        sessions: Arc::new(JwtSessions::new(jwt_service)),
        attachments: Arc::new(attachments),
    };

    let app = create_router(state);

    let addr = settings.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "postbox=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
