use std::sync::Arc;

use newsflix::{
    api::{create_router, AppState},
    services::{
        FeedController, FeedSettings, FileStorage, HttpRecommendationClient, InteractionLogger,
        PreferenceStore,
    },
    Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("newsflix=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let client = HttpRecommendationClient::new(&config.api_base_url)?;
    let storage = FileStorage::new(&config.prefs_dir);
    tracing::info!(
        api_base_url = %config.api_base_url,
        prefs = %storage.path().display(),
        layout = ?config.layout,
        "Starting dashboard"
    );

    let controller = FeedController::new(
        Arc::new(client),
        FeedSettings::new(config.layout, config.locale.clone()),
        PreferenceStore::load(Box::new(storage)),
        InteractionLogger::default(),
    );

    // Initial load; failures land in the view's error message
    controller.refresh().await;

    let app = create_router(AppState::new(controller));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Dashboard listening");
    axum::serve(listener, app).await?;

    Ok(())
}
