use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

pub const DEFAULT_SERVICE_NAME: &str = "fundamentals-dashboard";

/// Loki push endpoint plus the labels every log line is tagged with
#[derive(Debug, Clone, PartialEq)]
pub struct LokiTarget {
    pub url: Url,
    pub service_name: String,
    pub environment: String,
}

/// Subscriber setup: stdout always, Loki when a target is configured
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,fundamentals_dashboard=debug`
    pub filter: String,
    pub loki: Option<LokiTarget>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            loki: None,
        }
    }
}

impl LoggingConfig {
    /// Reads `RUST_LOG`, `LOKI_ENABLED`, `LOKI_URL`, `SERVICE_NAME` and `ENVIRONMENT`
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let set = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let loki_enabled = match set("LOKI_ENABLED") {
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| format!("LOKI_ENABLED must be true or false, got '{}'", raw))?,
            None => false,
        };

        let loki = if loki_enabled {
            let raw = set("LOKI_URL").ok_or("LOKI_ENABLED is true but LOKI_URL is not set")?;
            let url = Url::parse(&raw).map_err(|e| format!("LOKI_URL '{}' is invalid: {}", raw, e))?;
            Some(LokiTarget {
                url,
                service_name: set("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
                environment: set("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            })
        } else {
            None
        };

        Ok(Self {
            filter: set("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            loki,
        })
    }
}

pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(tracing_subscriber::fmt::layer());

    match config.loki {
        #[cfg(feature = "loki")]
        Some(target) => {
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", target.service_name.as_str())?
                .label("environment", target.environment.as_str())?
                .build_url(target.url.clone())?;
            // Ships batches to Loki for the life of the process
            tokio::spawn(task);

            registry.with(loki_layer).try_init()?;
            tracing::info!("Logging at '{}' to stdout and Loki ({})", config.filter, target.url);
        }
        #[cfg(not(feature = "loki"))]
        Some(target) => {
            registry.try_init()?;
            tracing::warn!("Built without the loki feature; ignoring LOKI_URL {}", target.url);
        }
        None => {
            registry.try_init()?;
            tracing::info!("Logging at '{}' to stdout", config.filter);
        }
    }

    Ok(())
}
