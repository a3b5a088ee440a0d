use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use thiserror::Error;

use crate::external::data_provider::DataProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No API key supplied. Set the X-Api-Key header or FMP_API_KEY")]
    MissingApiKey,
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),
}

/// Reasons the forecast engine refuses to produce a projection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Insufficient data for forecasting. Need at least {required} data points, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("Forecast horizon must be at least 1 period, got {0}")]
    InvalidHorizon(u32),
    #[error("Revenue for the period ending {date} is zero; growth rate is undefined")]
    ZeroRevenue { date: NaiveDate },
    #[error("Duplicate period date {date} in revenue history")]
    DuplicateDate { date: NaiveDate },
    #[error("Forecast date {years} years after {from} is out of range")]
    DateOutOfRange { from: NaiveDate, years: u32 },
    #[error("Non-finite value encountered: {0}")]
    NonFinite(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, message).into_response(),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, message).into_response(),
            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, message).into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            }
            AppError::External(_) => (StatusCode::BAD_GATEWAY, message).into_response(),
            AppError::Forecast(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response(),
        }
    }
}

impl From<DataProviderError> for AppError {
    fn from(value: DataProviderError) -> Self {
        match value {
            DataProviderError::RateLimited => AppError::RateLimited,
            DataProviderError::NotFound(symbol) => {
                AppError::NotFound(format!("No data for symbol {}", symbol))
            }
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
