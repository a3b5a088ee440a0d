use serde::{Deserialize, Serialize};

/// Company profile as reported by FMP's `/profile` endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, rename = "mktCap")]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
}

/// Ticker symbols FMP lists as peers of a company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerList {
    pub symbol: String,
    pub peers: Vec<String>,
}
