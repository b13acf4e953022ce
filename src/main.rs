use axum::serve;
use bom_sync::api::routes::create_router;
use bom_sync::api::AppState;
use bom_sync::config::AppConfig;
use bom_sync::store::PostgresStore;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    info!("BOM sync service starting");

    let config = AppConfig::load()?;
    info!(
        "Configuration loaded: server={}:{}",
        config.server.host, config.server.port
    );

    info!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let postgres_store = PostgresStore::new(&database_url, config.max_connections()).await?;

    info!("Running database migrations...");
    postgres_store.migrate().await?;

    let state = AppState::new(Arc::new(postgres_store), config.sync.clone());
    let app = create_router(config.server.max_body_bytes).with_state(state);

    run_server(app, &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("BOM sync server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
