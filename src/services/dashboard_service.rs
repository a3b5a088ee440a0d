use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::data_provider::FinancialDataProvider;
use crate::models::{Dashboard, ForecastModel};
use crate::services::{data_service, ratio_service, statement_service};

pub const DEFAULT_HORIZON: u32 = 5;
pub const MAX_HORIZON: u32 = 10;

pub const DATA_UNAVAILABLE: &str =
    "Unable to retrieve financial data for this symbol. Check the symbol and your API key.";

/// What the caller picked on the dashboard form
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub symbol: String,
    pub indicators: Vec<String>,
    pub model: ForecastModel,
    pub horizon: u32,
    pub peers: Vec<String>,
}

/// Fetch everything for one symbol and assemble the dashboard.
///
/// Profile and the three statements are required; without them the whole
/// render fails. Ratios, peers and news only add warnings when missing.
pub async fn build_dashboard(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    request: DashboardRequest,
) -> Result<Dashboard, AppError> {
    let symbol = request.symbol.as_str();
    info!("Building dashboard for {}", symbol);

    let (profile, income, balance, cash_flow, ratios, news, peers) = tokio::join!(
        data_service::company_profile(provider, api_key, symbol),
        data_service::income_statement(provider, api_key, symbol),
        data_service::balance_sheet(provider, api_key, symbol),
        data_service::cash_flow(provider, api_key, symbol),
        data_service::latest_ratios(provider, api_key, symbol),
        data_service::news(provider, api_key, symbol),
        data_service::peers(provider, api_key, symbol),
    );

    let mut warnings: Vec<String> = Vec::new();
    let (profile, w) = profile.into_parts();
    warnings.extend(w);
    let (income, w) = income.into_parts();
    warnings.extend(w);
    let (balance, w) = balance.into_parts();
    warnings.extend(w);
    let (cash_flow, w) = cash_flow.into_parts();
    warnings.extend(w);

    let profile = match profile {
        Some(p) if !income.is_empty() && !balance.is_empty() && !cash_flow.is_empty() => p,
        _ => {
            warn!("Core data missing for {}: {:?}", symbol, warnings);
            return Err(AppError::NotFound(DATA_UNAVAILABLE.to_string()));
        }
    };

    let indicators = request.indicators;
    let statements = [&income, &balance, &cash_flow]
        .iter()
        .map(|t| statement_service::indicator_table(t, &indicators))
        .collect();
    let indicator_charts =
        statement_service::indicator_charts(&[&income, &balance, &cash_flow], &indicators);

    let forecast = statement_service::forecast_section(&income, request.model, request.horizon);
    if let Some(e) = &forecast.error {
        warnings.push(format!("Revenue forecast unavailable: {}", e));
    }

    let (ratios, w) = ratios.into_parts();
    warnings.extend(w);
    let key_ratios = match ratios {
        Some(snapshot) => Some(ratio_service::key_ratios(&snapshot)),
        None => {
            warnings.push("Financial ratio data unavailable for analysis.".to_string());
            None
        }
    };

    let (peers, w) = peers.into_parts();
    warnings.extend(w);
    let peer_comparison = if peers.is_empty() {
        warnings.push(format!("Unable to retrieve the list of peers for {}.", symbol));
        None
    } else {
        let (comparison, peer_warnings) =
            ratio_service::compare_with_peers(provider, api_key, symbol, peers, &request.peers)
                .await;
        warnings.extend(peer_warnings);
        Some(comparison)
    };

    let (news, w) = news.into_parts();
    warnings.extend(w);

    Ok(Dashboard {
        symbol: request.symbol,
        profile,
        indicators,
        statements,
        indicator_charts,
        forecast,
        key_ratios,
        peer_comparison,
        news,
        warnings,
    })
}
