use std::net::SocketAddr;

/// Longest cache TTL accepted: 30 days
pub const MAX_CACHE_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Runtime settings, read from the environment (and `.env` via dotenvy)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fmp_base_url: String,
    /// Fallback key for requests that don't send `X-Api-Key`
    pub fmp_api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub statement_limit: u32,
    pub news_limit: u32,
    pub cache_ttl_minutes: i64,
    pub fmp_max_concurrent: usize,
    pub fmp_requests_per_minute: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fmp_base_url: "https://financialmodelingprep.com/api".to_string(),
            fmp_api_key: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            statement_limit: 5,
            news_limit: 5,
            cache_ttl_minutes: 60,
            fmp_max_concurrent: 4,
            fmp_requests_per_minute: 300,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fmp_base_url: std::env::var("FMP_BASE_URL").unwrap_or(defaults.fmp_base_url),
            fmp_api_key: std::env::var("FMP_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            statement_limit: env_or("STATEMENT_LIMIT", defaults.statement_limit),
            news_limit: env_or("NEWS_LIMIT", defaults.news_limit),
            cache_ttl_minutes: env_or("CACHE_TTL_MINUTES", defaults.cache_ttl_minutes),
            fmp_max_concurrent: env_or("FMP_MAX_CONCURRENT", defaults.fmp_max_concurrent),
            fmp_requests_per_minute: env_or(
                "FMP_REQUESTS_PER_MINUTE",
                defaults.fmp_requests_per_minute,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.fmp_base_url)
            .map_err(|e| format!("FMP_BASE_URL is not a valid URL: {}", e))?;
        if self.statement_limit == 0 {
            return Err("STATEMENT_LIMIT must be at least 1".to_string());
        }
        if self.news_limit == 0 {
            return Err("NEWS_LIMIT must be at least 1".to_string());
        }
        if !(0..=MAX_CACHE_TTL_MINUTES).contains(&self.cache_ttl_minutes) {
            return Err(format!(
                "CACHE_TTL_MINUTES must be between 0 and {}, got {}",
                MAX_CACHE_TTL_MINUTES, self.cache_ttl_minutes
            ));
        }
        if self.fmp_max_concurrent == 0 || self.fmp_requests_per_minute == 0 {
            return Err("FMP_MAX_CONCURRENT and FMP_REQUESTS_PER_MINUTE must be positive".to_string());
        }
        Ok(())
    }
}
