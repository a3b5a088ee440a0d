use tracing::warn;

use crate::external::data_provider::{DataProviderError, FinancialDataProvider};
use crate::models::{
    CompanyProfile, NewsItem, RatioSnapshot, StatementKind, StatementTable,
};

/// A lookup that never fails: on error `value` is empty and `warning` says why
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub warning: Option<String>,
}

impl<T> Fetched<T> {
    fn ok(value: T) -> Self {
        Self { value, warning: None }
    }

    fn degraded(value: T, what: &str, symbol: &str, err: &DataProviderError) -> Self {
        warn!("Failed to fetch {} for {}: {}", what, symbol, err);
        Self {
            value,
            warning: Some(describe(what, symbol, err)),
        }
    }

    pub fn into_parts(self) -> (T, Option<String>) {
        (self.value, self.warning)
    }
}

fn describe(what: &str, symbol: &str, err: &DataProviderError) -> String {
    match err {
        DataProviderError::RateLimited => format!(
            "Could not load {} for {}: the data provider is rate limiting requests.",
            what, symbol
        ),
        DataProviderError::Parse(_) => format!(
            "Could not load {} for {}: the API response was not valid JSON.",
            what, symbol
        ),
        DataProviderError::Api(msg) => {
            format!("Could not load {} for {}: API error: {}", what, symbol, msg)
        }
        other => format!("Could not load {} for {}: {}", what, symbol, other),
    }
}

/// Company profile; `None` when the symbol is unknown or the call failed
pub async fn company_profile(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<Option<CompanyProfile>> {
    match provider.company_profile(api_key, symbol).await {
        Ok(p) => Fetched::ok(Some(p)),
        Err(DataProviderError::NotFound(_)) => Fetched {
            value: None,
            warning: Some(format!("No company profile found for {}.", symbol)),
        },
        Err(e) => Fetched::degraded(None, "the company profile", symbol, &e),
    }
}

async fn statement(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
    kind: StatementKind,
) -> Fetched<StatementTable> {
    match provider.statement(api_key, symbol, kind).await {
        Ok(t) => Fetched::ok(t),
        Err(e) => Fetched::degraded(
            StatementTable::empty(kind),
            &kind.title().to_lowercase(),
            symbol,
            &e,
        ),
    }
}

pub async fn income_statement(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<StatementTable> {
    statement(provider, api_key, symbol, StatementKind::IncomeStatement).await
}

pub async fn balance_sheet(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<StatementTable> {
    statement(provider, api_key, symbol, StatementKind::BalanceSheet).await
}

pub async fn cash_flow(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<StatementTable> {
    statement(provider, api_key, symbol, StatementKind::CashFlow).await
}

pub async fn financial_ratios(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<StatementTable> {
    statement(provider, api_key, symbol, StatementKind::Ratios).await
}

/// Most recent ratio row as a snapshot; `None` if no ratios are available
pub async fn latest_ratios(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<Option<RatioSnapshot>> {
    let (table, warning) = financial_ratios(provider, api_key, symbol).await.into_parts();
    Fetched {
        value: snapshot_from_table(symbol, &table),
        warning,
    }
}

pub fn snapshot_from_table(symbol: &str, table: &StatementTable) -> Option<RatioSnapshot> {
    table.latest().map(|row| RatioSnapshot {
        symbol: symbol.to_string(),
        date: Some(row.date),
        ratios: row.values.clone(),
    })
}

pub async fn peers(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<Vec<String>> {
    match provider.peers(api_key, symbol).await {
        Ok(mut peers) => {
            peers.retain(|p| p != symbol);
            Fetched::ok(peers)
        }
        Err(e) => Fetched::degraded(Vec::new(), "the peer list", symbol, &e),
    }
}

pub async fn news(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
) -> Fetched<Vec<NewsItem>> {
    match provider.news(api_key, symbol).await {
        Ok(feed) if feed.skipped > 0 => Fetched {
            value: feed.items,
            warning: Some(format!(
                "Skipped {} news entries with an unexpected format.",
                feed.skipped
            )),
        },
        Ok(feed) => Fetched::ok(feed.items),
        Err(e) => Fetched::degraded(Vec::new(), "financial news", symbol, &e),
    }
}
