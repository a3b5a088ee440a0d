use std::sync::Arc;

use axum::http::HeaderMap;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::data_provider::FinancialDataProvider;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data_provider: Arc<dyn FinancialDataProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, data_provider: Arc<dyn FinancialDataProvider>) -> Self {
        Self {
            config: Arc::new(config),
            data_provider,
        }
    }

    /// API key from the `X-Api-Key` header, else the configured one
    pub fn api_key(&self, headers: &HeaderMap) -> Result<String, AppError> {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.fmp_api_key.clone())
            .ok_or(AppError::MissingApiKey)
    }
}
