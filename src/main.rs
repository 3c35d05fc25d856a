use std::sync::Arc;

use greybook::{
    bootstrap, config::Config, init_db, make_router, notifications::LogTransport, run_app,
    AppContext,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let pool = init_db(&config.database_url, config.slow_query_threshold_ms).await?;
    let address = config.bind_address;
    let ctx = AppContext::new(pool, config, Arc::new(LogTransport));
    bootstrap(&ctx).await?;

    tracing::info!(%address, "server started");
    if let Err(error) = run_app(make_router(), address, ctx).await {
        tracing::error!(%error, "server stopped");
        return Err(error);
    }
    Ok(())
}
