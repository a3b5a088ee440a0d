use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::external::data_provider::{DataProviderError, FinancialDataProvider, NewsFeed};
use crate::models::{CompanyProfile, NewsItem, StatementKind, StatementRow, StatementTable};
use crate::services::rate_limiter::RateLimiter;

/// Financial Modeling Prep REST client
pub struct FmpProvider {
    client: reqwest::Client,
    base_url: String,
    statement_limit: u32,
    news_limit: u32,
    limiter: Arc<RateLimiter>,
}

impl FmpProvider {
    pub fn new(
        base_url: impl Into<String>,
        statement_limit: u32,
        news_limit: u32,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, DataProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| DataProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            statement_limit,
            news_limit,
            limiter,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DataProviderError> {
        let limiter = Arc::new(RateLimiter::new(
            config.fmp_max_concurrent,
            config.fmp_requests_per_minute,
        ));
        Self::new(
            config.fmp_base_url.clone(),
            config.statement_limit,
            config.news_limit,
            limiter,
        )
    }

    /// GET `{base_url}/{path}` and decode the body as JSON.
    ///
    /// FMP answers errors with `{"Error Message": "..."}`, sometimes with a 200
    /// status, so the body is inspected regardless of the status code.
    async fn get_json(
        &self,
        path: &str,
        api_key: &str,
        params: &[(&str, String)],
    ) -> Result<Value, DataProviderError> {
        let url = format!("{}/{}", self.base_url, path);

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("apikey", api_key.to_string()));

        let _guard = self.limiter.acquire().await;
        debug!("FMP request: {}", path);

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| DataProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("FMP rate limit hit on {}", path);
            return Err(DataProviderError::RateLimited);
        }

        let text = resp
            .text()
            .await
            .map_err(|e| DataProviderError::Network(e.to_string()))?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) if status.is_success() => {
                return Err(DataProviderError::Parse(format!(
                    "response is not valid JSON: {}",
                    e
                )))
            }
            Err(_) => return Err(DataProviderError::Api(format!("HTTP {}", status))),
        };

        if let Some(msg) = error_message(&body) {
            return Err(DataProviderError::Api(msg));
        }

        if !status.is_success() {
            return Err(DataProviderError::Api(format!("HTTP {}", status)));
        }

        Ok(body)
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.as_object()?
        .get("Error Message")
        .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
}

fn expect_array(body: Value, what: &str) -> Result<Vec<Value>, DataProviderError> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(DataProviderError::Parse(format!(
            "expected a list of {}, got {}",
            what,
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Turn FMP statement records into a table, keeping only numeric columns
pub(crate) fn parse_statement(
    kind: StatementKind,
    body: Value,
) -> Result<StatementTable, DataProviderError> {
    let records = expect_array(body, "statement records")?;
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let Value::Object(fields) = record else {
            debug!("Skipping non-object {} record", kind);
            continue;
        };

        let date = match fields
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok())
        {
            Some(d) => d,
            None => {
                debug!("Skipping {} record without a usable date", kind);
                continue;
            }
        };

        let period = fields.get("period").and_then(Value::as_str).map(str::to_string);

        let values: BTreeMap<String, f64> = fields
            .iter()
            .filter_map(|(k, v)| v.as_f64().filter(|x| x.is_finite()).map(|x| (k.clone(), x)))
            .collect();

        rows.push(StatementRow { date, period, values });
    }

    Ok(StatementTable { kind, rows })
}

pub(crate) fn parse_profile(symbol: &str, body: Value) -> Result<CompanyProfile, DataProviderError> {
    let first = expect_array(body, "profiles")?
        .into_iter()
        .next()
        .ok_or_else(|| DataProviderError::NotFound(symbol.to_string()))?;

    serde_json::from_value(first).map_err(|e| DataProviderError::Parse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct CompanyOutlook {
    #[serde(default)]
    profile: Option<OutlookProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutlookProfile {
    #[serde(default)]
    peers_list: Vec<String>,
}

pub(crate) fn parse_peers(body: Value) -> Result<Vec<String>, DataProviderError> {
    let outlook: CompanyOutlook =
        serde_json::from_value(body).map_err(|e| DataProviderError::Parse(e.to_string()))?;

    Ok(outlook
        .profile
        .map(|p| p.peers_list)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect())
}

pub(crate) fn parse_news(body: Value) -> Result<NewsFeed, DataProviderError> {
    let entries = match body {
        Value::Array(items) => items,
        _ => {
            return Err(DataProviderError::Api(
                "Unexpected response from the financial news API".to_string(),
            ))
        }
    };

    let mut feed = NewsFeed::default();
    for entry in entries {
        let Value::Object(fields) = entry else {
            feed.skipped += 1;
            continue;
        };
        let text = |key: &str, fallback: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        feed.items.push(NewsItem {
            title: text("title", "Title not available"),
            published_date: text("publishedDate", "Date not available"),
            body: text("text", "Text not available"),
            url: text("url", "#"),
            site: fields.get("site").and_then(Value::as_str).map(str::to_string),
        });
    }

    Ok(feed)
}

#[async_trait]
impl FinancialDataProvider for FmpProvider {
    async fn company_profile(
        &self,
        api_key: &str,
        symbol: &str,
    ) -> Result<CompanyProfile, DataProviderError> {
        let body = self
            .get_json(&format!("v3/profile/{}", symbol), api_key, &[])
            .await?;
        parse_profile(symbol, body)
    }

    async fn statement(
        &self,
        api_key: &str,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<StatementTable, DataProviderError> {
        let body = self
            .get_json(
                &format!("v3/{}/{}", kind.endpoint(), symbol),
                api_key,
                &[("limit", self.statement_limit.to_string())],
            )
            .await?;
        parse_statement(kind, body)
    }

    async fn peers(&self, api_key: &str, symbol: &str) -> Result<Vec<String>, DataProviderError> {
        let body = self
            .get_json(
                "v4/company-outlook",
                api_key,
                &[("symbol", symbol.to_string())],
            )
            .await?;
        parse_peers(body)
    }

    async fn news(&self, api_key: &str, symbol: &str) -> Result<NewsFeed, DataProviderError> {
        let body = self
            .get_json(
                "v3/stock_news",
                api_key,
                &[
                    ("tickers", symbol.to_string()),
                    ("limit", self.news_limit.to_string()),
                ],
            )
            .await?;
        parse_news(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(server: &MockServer) -> FmpProvider {
        // 6000/min keeps the limiter's spacing at 10ms
        let limiter = Arc::new(RateLimiter::new(4, 6000));
        FmpProvider::new(server.base_url(), 5, 5, limiter).unwrap()
    }

    #[tokio::test]
    async fn test_income_statement_keeps_numeric_columns() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/income-statement/AAPL")
                    .query_param("limit", "5")
                    .query_param("apikey", "secret");
                then.status(200).json_body(json!([
                    {
                        "date": "2023-09-30",
                        "symbol": "AAPL",
                        "period": "FY",
                        "calendarYear": "2023",
                        "revenue": 383285000000u64,
                        "netIncome": 96995000000u64,
                        "eps": 6.16,
                        "link": null
                    },
                    {
                        "date": "2022-09-24",
                        "symbol": "AAPL",
                        "period": "FY",
                        "revenue": 394328000000u64,
                        "eps": 6.15
                    }
                ]));
            })
            .await;

        let table = provider(&server)
            .statement("secret", "AAPL", StatementKind::IncomeStatement)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(table.rows.len(), 2);
        let first = &table.rows[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 9, 30).unwrap());
        assert_eq!(first.period.as_deref(), Some("FY"));
        assert_eq!(first.get("revenue"), Some(383285000000.0));
        assert_eq!(first.get("eps"), Some(6.16));
        assert!(first.get("symbol").is_none());
        assert!(first.get("calendarYear").is_none());
        assert!(first.get("link").is_none());
    }

    #[tokio::test]
    async fn test_error_message_body_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/balance-sheet-statement/AAPL");
                then.status(401).json_body(json!({
                    "Error Message": "Invalid API KEY. Please retry or visit our documentation."
                }));
            })
            .await;

        let err = provider(&server)
            .statement("bad", "AAPL", StatementKind::BalanceSheet)
            .await
            .unwrap_err();

        match err {
            DataProviderError::Api(msg) => assert!(msg.contains("Invalid API KEY")),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/stock_news");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = provider(&server).news("k", "AAPL").await.unwrap_err();
        assert!(matches!(err, DataProviderError::Parse(_)));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/ratios/AAPL");
                then.status(429).body("slow down");
            })
            .await;

        let err = provider(&server)
            .statement("k", "AAPL", StatementKind::Ratios)
            .await
            .unwrap_err();
        assert!(matches!(err, DataProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_empty_profile_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/profile/ZZZZ");
                then.status(200).json_body(json!([]));
            })
            .await;

        let err = provider(&server).company_profile("k", "ZZZZ").await.unwrap_err();
        assert!(matches!(err, DataProviderError::NotFound(s) if s == "ZZZZ"));
    }

    #[tokio::test]
    async fn test_profile_maps_fmp_field_names() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/profile/AAPL");
                then.status(200).json_body(json!([{
                    "symbol": "AAPL",
                    "companyName": "Apple Inc.",
                    "price": 189.5,
                    "mktCap": 2950000000000u64,
                    "sector": "Technology",
                    "industry": "Consumer Electronics",
                    "description": "Designs phones.",
                    "image": "https://example.com/aapl.png",
                    "exchangeShortName": "NASDAQ"
                }]));
            })
            .await;

        let profile = provider(&server).company_profile("k", "AAPL").await.unwrap();
        assert_eq!(profile.company_name, "Apple Inc.");
        assert_eq!(profile.market_cap, Some(2950000000000.0));
        assert_eq!(profile.exchange_short_name.as_deref(), Some("NASDAQ"));
    }

    #[tokio::test]
    async fn test_peers_read_from_company_outlook() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/company-outlook")
                    .query_param("symbol", "AAPL");
                then.status(200).json_body(json!({
                    "profile": { "symbol": "AAPL", "peersList": ["msft", "GOOGL", ""] }
                }));
            })
            .await;

        let peers = provider(&server).peers("k", "AAPL").await.unwrap();
        assert_eq!(peers, vec!["MSFT".to_string(), "GOOGL".to_string()]);
    }

    #[test]
    fn test_news_skips_non_object_entries() {
        let feed = parse_news(json!([
            { "title": "Record quarter", "publishedDate": "2024-05-02 16:30:00", "text": "...", "url": "https://n/1" },
            "garbage",
            { "url": "https://n/2" }
        ]))
        .unwrap();

        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.skipped, 1);
        assert_eq!(feed.items[1].title, "Title not available");
    }

    #[test]
    fn test_news_object_body_is_api_error() {
        let err = parse_news(json!({ "status": "weird" })).unwrap_err();
        assert!(matches!(err, DataProviderError::Api(_)));
    }

    #[test]
    fn test_statement_skips_rows_without_date() {
        let table = parse_statement(
            StatementKind::CashFlow,
            json!([{ "freeCashFlow": 10.0 }, { "date": "2023-12-31", "freeCashFlow": 12.0 }]),
        )
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("freeCashFlow"), Some(12.0));
    }
}
