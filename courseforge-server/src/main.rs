use anyhow::Context;
use courseforge_client::LayoutClient;
use courseforge_poller::{LayoutPoller, PollerConfig};
use courseforge_server::api::{self, AppState};
use courseforge_server::config::ServerConfig;
use courseforge_server::db;
use courseforge_server::generator::GeminiGenerator;
use courseforge_server::repository::PgCourseStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "courseforge_server=info,courseforge_poller=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Courseforge server...");

    let config = ServerConfig::from_env().context("Failed to load server configuration")?;
    config.validate().context("Invalid server configuration")?;

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let store = Arc::new(PgCourseStore::new(pool));
    let generator = Arc::new(GeminiGenerator::new(config.gemini.clone()));

    if config.poller_enabled {
        let poller_config = PollerConfig::from_env();
        poller_config
            .validate()
            .context("Invalid poller configuration")?;

        let dispatcher = Arc::new(LayoutClient::new(poller_config.endpoint_url.clone()));
        let poller = LayoutPoller::new(poller_config, store.clone(), dispatcher);

        tokio::spawn(async move {
            if let Err(e) = poller.run().await {
                tracing::error!("Layout poller stopped: {:#}", e);
            }
        });
    } else {
        tracing::info!("Layout poller disabled");
    }

    let app = api::create_router(AppState::new(store, generator));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
