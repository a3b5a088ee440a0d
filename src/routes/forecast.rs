use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{ForecastResult, RevenuePoint, RevenueSeries};
use crate::routes::companies::{parse_model, validate_horizon};
use crate::services::forecast_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(run_forecast))
}

#[derive(Debug, Deserialize)]
struct ForecastRequest {
    series: Vec<RevenuePoint>,
    model: Option<String>,
    horizon: Option<u32>,
}

/// POST /api/forecast
///
/// Runs the forecast engine on a caller-supplied revenue history; no
/// upstream data is fetched.
async fn run_forecast(Json(request): Json<ForecastRequest>) -> Result<Json<ForecastResult>, AppError> {
    let model = parse_model(request.model.as_deref())?;
    let horizon = validate_horizon(request.horizon)?;
    info!(
        "POST /api/forecast - {} points, model={:?}, horizon={}",
        request.series.len(),
        model,
        horizon
    );

    forecast_service::forecast_revenue(&RevenueSeries::new(request.series), model, horizon)
        .map(Json)
        .map_err(|e| {
            warn!("Forecast rejected: {}", e);
            AppError::Forecast(e)
        })
}
