use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{
    CompanyProfile, Dashboard, DashboardQuery, ForecastModel, ForecastSection, KeyRatios,
    NewsItem, NewsQueryParams, PeerComparison, PeerList, PeerQueryParams, StatementKind,
    StatementTable,
};
use crate::routes::{normalize_symbol, parse_symbol_list};
use crate::services::dashboard_service::{DashboardRequest, DEFAULT_HORIZON, MAX_HORIZON};
use crate::services::{
    dashboard_service, data_service, forecast_service, ratio_service, statement_service,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol/dashboard", get(get_dashboard))
        .route("/:symbol/profile", get(get_profile))
        .route("/:symbol/statements/:kind", get(get_statement))
        .route("/:symbol/ratios/latest", get(get_key_ratios))
        .route("/:symbol/peers", get(get_peers))
        .route("/:symbol/peers/comparison", get(get_peer_comparison))
        .route("/:symbol/news", get(get_news))
        .route("/:symbol/forecast", get(get_forecast))
}

/// Payload of a single data section, with the reason it is empty if it is
#[derive(Debug, Serialize)]
pub struct SectionResponse<T> {
    pub symbol: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub model: Option<String>,
    pub horizon: Option<u32>,
}

pub(crate) fn parse_model(raw: Option<&str>) -> Result<ForecastModel, AppError> {
    match raw {
        Some(m) => m.parse::<ForecastModel>().map_err(AppError::Validation),
        None => Ok(ForecastModel::default()),
    }
}

pub(crate) fn validate_horizon(horizon: Option<u32>) -> Result<u32, AppError> {
    let horizon = horizon.unwrap_or(DEFAULT_HORIZON);
    if !(1..=MAX_HORIZON).contains(&horizon) {
        return Err(AppError::Validation(format!(
            "Forecast horizon must be between 1 and {} years, got {}",
            MAX_HORIZON, horizon
        )));
    }
    Ok(horizon)
}

/// GET /api/companies/:symbol/dashboard
///
/// Query parameters:
/// - `indicators`: comma-separated (default: revenue,netIncome,eps)
/// - `model`: `average_growth` (default) or `linear_regression`
/// - `horizon`: forecast years, 1-10 (default: 5)
/// - `peers`: comma-separated peers to compare (default: first three)
async fn get_dashboard(
    Path(symbol): Path<String>,
    Query(params): Query<DashboardQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Dashboard>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/dashboard", symbol);

    let request = DashboardRequest {
        symbol: symbol.clone(),
        indicators: statement_service::parse_indicators(params.indicators.as_deref()),
        model: parse_model(params.model.as_deref())?,
        horizon: validate_horizon(params.horizon)?,
        peers: parse_symbol_list(params.peers.as_deref()),
    };

    dashboard_service::build_dashboard(state.data_provider.as_ref(), &api_key, request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to build dashboard for {}: {}", symbol, e);
            e
        })
}

async fn get_profile(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CompanyProfile>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/profile", symbol);

    let (profile, warning) =
        data_service::company_profile(state.data_provider.as_ref(), &api_key, &symbol)
            .await
            .into_parts();

    profile.map(Json).ok_or_else(|| {
        AppError::NotFound(warning.unwrap_or_else(|| format!("No profile for {}", symbol)))
    })
}

async fn get_statement(
    Path((symbol, kind)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SectionResponse<StatementTable>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let kind: StatementKind = kind.parse()?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/statements/{}", symbol, kind.endpoint());

    let provider = state.data_provider.as_ref();
    let fetched = match kind {
        StatementKind::IncomeStatement => {
            data_service::income_statement(provider, &api_key, &symbol).await
        }
        StatementKind::BalanceSheet => data_service::balance_sheet(provider, &api_key, &symbol).await,
        StatementKind::CashFlow => data_service::cash_flow(provider, &api_key, &symbol).await,
        StatementKind::Ratios => data_service::financial_ratios(provider, &api_key, &symbol).await,
    };
    let (data, warning) = fetched.into_parts();

    Ok(Json(SectionResponse { symbol, data, warning }))
}

async fn get_key_ratios(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SectionResponse<Option<KeyRatios>>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/ratios/latest", symbol);

    let (snapshot, warning) =
        data_service::latest_ratios(state.data_provider.as_ref(), &api_key, &symbol)
            .await
            .into_parts();
    let data = snapshot.as_ref().map(ratio_service::key_ratios);
    let warning = match (&data, warning) {
        (None, None) => Some("Financial ratio data unavailable for analysis.".to_string()),
        (_, w) => w,
    };

    Ok(Json(SectionResponse { symbol, data, warning }))
}

async fn get_peers(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SectionResponse<PeerList>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/peers", symbol);

    let (peers, warning) = data_service::peers(state.data_provider.as_ref(), &api_key, &symbol)
        .await
        .into_parts();

    Ok(Json(SectionResponse {
        symbol: symbol.clone(),
        data: PeerList { symbol, peers },
        warning,
    }))
}

async fn get_peer_comparison(
    Path(symbol): Path<String>,
    Query(params): Query<PeerQueryParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SectionResponse<PeerComparison>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/peers/comparison", symbol);

    let provider = state.data_provider.as_ref();
    let (available, warning) = data_service::peers(provider, &api_key, &symbol)
        .await
        .into_parts();
    if available.is_empty() {
        warn!("No peers available for {}", symbol);
        return Err(AppError::NotFound(warning.unwrap_or_else(|| {
            format!("Unable to retrieve the list of peers for {}.", symbol)
        })));
    }

    let requested = parse_symbol_list(params.peers.as_deref());
    let (comparison, warnings) =
        ratio_service::compare_with_peers(provider, &api_key, &symbol, available, &requested)
            .await;

    Ok(Json(SectionResponse {
        symbol,
        data: comparison,
        warning: (!warnings.is_empty()).then(|| warnings.join(" ")),
    }))
}

async fn get_news(
    Path(symbol): Path<String>,
    Query(params): Query<NewsQueryParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SectionResponse<Vec<NewsItem>>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    info!("GET /api/companies/{}/news", symbol);

    let (mut news, warning) = data_service::news(state.data_provider.as_ref(), &api_key, &symbol)
        .await
        .into_parts();
    if let Some(limit) = params.limit {
        news.truncate(limit);
    }

    Ok(Json(SectionResponse { symbol, data: news, warning }))
}

/// GET /api/companies/:symbol/forecast
///
/// Forecast from the income statement's revenue column. Unlike the dashboard,
/// an engine error here is the whole answer and is returned as 422.
async fn get_forecast(
    Path(symbol): Path<String>,
    Query(params): Query<ForecastQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SectionResponse<ForecastSection>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let api_key = state.api_key(&headers)?;
    let model = parse_model(params.model.as_deref())?;
    let horizon = validate_horizon(params.horizon)?;
    info!(
        "GET /api/companies/{}/forecast - model={:?} horizon={}",
        symbol, model, horizon
    );

    let (income, warning) =
        data_service::income_statement(state.data_provider.as_ref(), &api_key, &symbol)
            .await
            .into_parts();

    if let Some(w) = warning {
        return Err(AppError::External(w));
    }

    let series = statement_service::revenue_series(&income);
    let result = forecast_service::forecast_revenue(&series, model, horizon).map_err(|e| {
        warn!("Forecast for {} not computable: {}", symbol, e);
        AppError::Forecast(e)
    })?;

    Ok(Json(SectionResponse {
        symbol,
        data: statement_service::render_forecast(model, horizon, Ok(result)),
        warning: None,
    }))
}
