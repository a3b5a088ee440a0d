use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CompanyProfile, ForecastModel, KeyRatios, NewsItem, PeerComparison, StatementKind};

/// Indicators the dashboard knows how to chart
pub const AVAILABLE_INDICATORS: [&str; 11] = [
    "revenue",
    "netIncome",
    "operatingIncome",
    "eps",
    "ebitda",
    "totalAssets",
    "totalLiabilities",
    "totalStockholdersEquity",
    "operatingCashFlow",
    "capitalExpenditure",
    "freeCashFlow",
];

pub const DEFAULT_INDICATORS: [&str; 3] = ["revenue", "netIncome", "eps"];

/// Display format for period dates (day-month-year)
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

/// Time-series line chart, points in chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Grouped bar chart: one group per category, one bar per series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

/// Statement restricted to the selected indicators, keyed by display date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub kind: StatementKind,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<IndicatorRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: String,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTableRow {
    pub date: String,
    pub projected_revenue: f64,
}

/// Forecast block of the dashboard; `error` is set instead of points when
/// the forecast could not be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSection {
    pub model: ForecastModel,
    pub horizon: u32,
    pub methodology: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_growth_rate: Option<f64>,
    pub table: Vec<ForecastTableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<LineChart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub symbol: String,
    pub profile: CompanyProfile,
    pub indicators: Vec<String>,
    pub statements: Vec<IndicatorTable>,
    pub indicator_charts: Vec<LineChart>,
    pub forecast: ForecastSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ratios: Option<KeyRatios>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_comparison: Option<PeerComparison>,
    pub news: Vec<NewsItem>,
    /// User-visible messages for sections that could not be rendered
    pub warnings: Vec<String>,
}

/// Query string accepted by the dashboard endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    /// Comma-separated indicator names
    pub indicators: Option<String>,
    pub model: Option<String>,
    pub horizon: Option<u32>,
    /// Comma-separated peer symbols
    pub peers: Option<String>,
}
