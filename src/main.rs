use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use fundamentals_dashboard::app;
use fundamentals_dashboard::config::AppConfig;
use fundamentals_dashboard::external::cached_provider::CachedProvider;
use fundamentals_dashboard::external::data_provider::FinancialDataProvider;
use fundamentals_dashboard::external::fmp::FmpProvider;
use fundamentals_dashboard::logging::{init_logging, LoggingConfig};
use fundamentals_dashboard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env().map_err(anyhow::Error::msg)?)?;

    let config = AppConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    if config.fmp_api_key.is_none() {
        tracing::warn!("FMP_API_KEY not set; every request must send an X-Api-Key header");
    }

    let fmp = FmpProvider::from_config(&config).context("failed to build FMP client")?;
    let cache = Arc::new(CachedProvider::new(
        Arc::new(fmp),
        chrono::Duration::minutes(config.cache_ttl_minutes),
    ));
    cache.spawn_cleanup(Duration::from_secs(config.cache_ttl_minutes.max(1) as u64 * 60));
    let provider: Arc<dyn FinancialDataProvider> = cache;
    tracing::info!(
        "Using FMP at {} (cache TTL {} min)",
        config.fmp_base_url,
        config.cache_ttl_minutes
    );

    let addr = config.bind_addr;
    let app = app::create_app(AppState::new(config, provider));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Fundamentals dashboard running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
