use serde::{Deserialize, Serialize};

/// A single news article about a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    /// Kept as FMP sends it ("2024-05-02 16:30:00"); not every item parses cleanly
    pub published_date: String,
    pub body: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

/// Request parameters for fetching news
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsQueryParams {
    /// Maximum number of articles (default: configured news limit)
    pub limit: Option<usize>,
}
