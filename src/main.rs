use anyhow::Context;
use finance_data::app;
use finance_data::config::ServerConfig;
use finance_data::db;
use finance_data::logging::{self, LoggingConfig};
use finance_data::state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env("finance-data-api"))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = ServerConfig::from_env()?;

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    db::create_schema(&mut *pool.acquire().await?).await?;

    let app = app::create_app(AppState { pool });

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("finance-data API running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
