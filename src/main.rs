use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitlog::config::Config;
use fitlog::db;
use fitlog::llm::LlmClient;
use fitlog::migrations::run_migrations;
use fitlog::repositories::SessionRepository;
use fitlog::routes::{self, AppStates};
use fitlog::storage::Storage;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitlog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database: {}", config.database_url);

    // Create database pool
    let pool = db::create_pool(&config.database_url)?;

    // Run migrations
    run_migrations(&pool)?;

    // Object storage
    let storage = Storage::new(&config.storage_dir, &config.public_base_url);
    storage.ensure_buckets().await?;
    tracing::info!("Storing uploads under {}", config.storage_dir.display());

    // LLM providers
    let llm = LlmClient::new(config.llm.clone())?;
    tracing::info!(
        "Text parsing via {}, PDF parsing via {}",
        llm.text_provider().display_name(),
        llm.pdf_provider().display_name()
    );

    spawn_session_cleanup(SessionRepository::new(pool.clone()));

    // Build router
    let states = AppStates::new(pool, storage, llm, &config.public_base_url);
    let app = routes::create_router(states);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn spawn_session_cleanup(session_repo: SessionRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match session_repo.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!("Removed {} expired sessions", removed),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}
