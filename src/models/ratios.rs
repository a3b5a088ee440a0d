use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dashboard::BarChart;

/// Ratio name → value for one company at its most recent reporting period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSnapshot {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub ratios: BTreeMap<String, f64>,
}

impl RatioSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.ratios.get(name).copied()
    }
}

/// Verdict derived from the price-to-earnings ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valuation {
    Undervalued,
    FairlyValued,
    Overvalued,
}

impl Valuation {
    pub const UNDERVALUED_BELOW: f64 = 15.0;
    pub const OVERVALUED_ABOVE: f64 = 25.0;

    pub fn commentary(&self) -> &'static str {
        match self {
            Valuation::Undervalued => "The stock appears undervalued based on its P/E ratio.",
            Valuation::FairlyValued => "The stock is fairly valued based on its P/E ratio.",
            Valuation::Overvalued => "The stock may be overvalued based on its P/E ratio.",
        }
    }
}

impl std::fmt::Display for Valuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Valuation::Undervalued => write!(f, "undervalued"),
            Valuation::FairlyValued => write!(f, "fairly valued"),
            Valuation::Overvalued => write!(f, "overvalued"),
        }
    }
}

/// Headline ratios shown for the selected company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRatios {
    pub symbol: String,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    /// Fraction, e.g. 0.15 for 15%
    pub return_on_equity: Option<f64>,
    /// Same value scaled for display, e.g. 15.0
    pub return_on_equity_pct: Option<f64>,
    pub price_to_earnings: Option<f64>,
    pub price_to_book: Option<f64>,
    pub valuation: Option<Valuation>,
    pub commentary: Option<String>,
}

/// One company's row in the peer comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRatioRow {
    pub symbol: String,
    pub pe_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    pub symbol: String,
    pub available_peers: Vec<String>,
    pub selected_peers: Vec<String>,
    pub rows: Vec<PeerRatioRow>,
    pub chart: BarChart,
}

/// Query for the peer comparison endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeerQueryParams {
    /// Comma-separated peer symbols; defaults to the first three peers
    pub peers: Option<String>,
}
