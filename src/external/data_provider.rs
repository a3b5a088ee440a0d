use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CompanyProfile, NewsItem, StatementKind, StatementTable};

#[derive(Debug, Clone, Error)]
pub enum DataProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no data for {0}")]
    NotFound(String),
}

/// News fetched for a ticker, plus how many entries had to be skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsFeed {
    pub items: Vec<NewsItem>,
    pub skipped: usize,
}

/// Source of company fundamentals, keyed by ticker symbol and API key.
///
/// Empty upstream results are returned as empty values, not errors; only
/// `company_profile` treats "nothing there" as [`DataProviderError::NotFound`].
#[async_trait]
pub trait FinancialDataProvider: Send + Sync {
    async fn company_profile(
        &self,
        api_key: &str,
        symbol: &str,
    ) -> Result<CompanyProfile, DataProviderError>;

    async fn statement(
        &self,
        api_key: &str,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<StatementTable, DataProviderError>;

    async fn peers(&self, api_key: &str, symbol: &str) -> Result<Vec<String>, DataProviderError>;

    async fn news(&self, api_key: &str, symbol: &str) -> Result<NewsFeed, DataProviderError>;
}
