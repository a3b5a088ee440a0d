use futures::future::join_all;
use tracing::info;

use crate::external::data_provider::FinancialDataProvider;
use crate::models::{
    BarChart, BarSeries, KeyRatios, PeerComparison, PeerRatioRow, RatioSnapshot, Valuation,
};
use crate::services::data_service;

/// Number of peers compared when the caller does not pick any
pub const DEFAULT_PEER_COUNT: usize = 3;

/// Ratios compared across peers: (FMP field, display label)
pub const PEER_COMPARISON_RATIOS: [(&str, &str); 3] = [
    ("priceEarningsRatio", "P/E Ratio"),
    ("returnOnEquity", "ROE"),
    ("debtEquityRatio", "Debt to Equity"),
];

/// P/E below 15 reads as undervalued, above 25 as overvalued
pub fn classify_pe(pe: f64) -> Option<Valuation> {
    if !pe.is_finite() {
        return None;
    }
    Some(if pe < Valuation::UNDERVALUED_BELOW {
        Valuation::Undervalued
    } else if pe > Valuation::OVERVALUED_ABOVE {
        Valuation::Overvalued
    } else {
        Valuation::FairlyValued
    })
}

pub fn key_ratios(snapshot: &RatioSnapshot) -> KeyRatios {
    let price_to_earnings = snapshot.get("priceEarningsRatio");
    let valuation = price_to_earnings.and_then(classify_pe);
    let return_on_equity = snapshot.get("returnOnEquity");

    KeyRatios {
        symbol: snapshot.symbol.clone(),
        current_ratio: snapshot.get("currentRatio"),
        quick_ratio: snapshot.get("quickRatio"),
        debt_to_equity: snapshot.get("debtEquityRatio"),
        return_on_equity,
        return_on_equity_pct: return_on_equity.map(|r| r * 100.0),
        price_to_earnings,
        price_to_book: snapshot.get("priceToBookRatio"),
        valuation,
        commentary: valuation.map(|v| v.commentary().to_string()),
    }
}

/// Peers to compare: the requested ones that FMP lists, or the first few
/// listed when nothing usable was requested.
pub fn select_peers(available: &[String], requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return available.iter().take(DEFAULT_PEER_COUNT).cloned().collect();
    }
    let mut selected = Vec::new();
    for peer in requested {
        if available.contains(peer) && !selected.contains(peer) {
            selected.push(peer.clone());
        }
    }
    selected
}

/// Assemble the comparison table and grouped bar chart.
///
/// `snapshots` holds the selected peers followed by the company itself;
/// companies without ratios are left out.
pub fn build_peer_comparison(
    symbol: &str,
    available_peers: Vec<String>,
    selected_peers: Vec<String>,
    snapshots: &[RatioSnapshot],
) -> PeerComparison {
    let rows: Vec<PeerRatioRow> = snapshots
        .iter()
        .map(|s| PeerRatioRow {
            symbol: s.symbol.clone(),
            pe_ratio: s.get("priceEarningsRatio"),
            roe: s.get("returnOnEquity"),
            debt_to_equity: s.get("debtEquityRatio"),
        })
        .collect();

    let chart = BarChart {
        title: "Financial Ratio Comparison".to_string(),
        categories: rows.iter().map(|r| r.symbol.clone()).collect(),
        series: PEER_COMPARISON_RATIOS
            .iter()
            .map(|(field, label)| BarSeries {
                name: label.to_string(),
                values: snapshots.iter().map(|s| s.get(field)).collect(),
            })
            .collect(),
    };

    PeerComparison {
        symbol: symbol.to_string(),
        available_peers,
        selected_peers,
        rows,
        chart,
    }
}

/// Fetch the latest ratios for each selected peer and the company itself,
/// concurrently, and build the comparison. Per-company failures become warnings.
pub async fn compare_with_peers(
    provider: &dyn FinancialDataProvider,
    api_key: &str,
    symbol: &str,
    available_peers: Vec<String>,
    requested: &[String],
) -> (PeerComparison, Vec<String>) {
    let selected = select_peers(&available_peers, requested);
    info!("Comparing {} with peers {:?}", symbol, selected);

    let mut companies: Vec<&str> = selected.iter().map(String::as_str).collect();
    companies.push(symbol);

    let fetched = join_all(
        companies
            .iter()
            .map(|s| data_service::latest_ratios(provider, api_key, s)),
    )
    .await;

    let mut warnings = Vec::new();
    let mut snapshots = Vec::new();
    for f in fetched {
        let (snapshot, warning) = f.into_parts();
        warnings.extend(warning);
        snapshots.extend(snapshot);
    }

    (
        build_peer_comparison(symbol, available_peers, selected, &snapshots),
        warnings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn snapshot(symbol: &str, ratios: &[(&str, f64)]) -> RatioSnapshot {
        RatioSnapshot {
            symbol: symbol.to_string(),
            date: None,
            ratios: ratios
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pe_thresholds() {
        assert_eq!(classify_pe(9.0), Some(Valuation::Undervalued));
        assert_eq!(classify_pe(14.99), Some(Valuation::Undervalued));
        assert_eq!(classify_pe(15.0), Some(Valuation::FairlyValued));
        assert_eq!(classify_pe(25.0), Some(Valuation::FairlyValued));
        assert_eq!(classify_pe(25.01), Some(Valuation::Overvalued));
        assert_eq!(classify_pe(-3.0), Some(Valuation::Undervalued));
        assert_eq!(classify_pe(f64::NAN), None);
    }

    #[test]
    fn test_key_ratios_with_commentary() {
        let s = snapshot(
            "AAPL",
            &[
                ("currentRatio", 0.98),
                ("quickRatio", 0.84),
                ("debtEquityRatio", 1.79),
                ("returnOnEquity", 1.56),
                ("priceEarningsRatio", 29.8),
                ("priceToBookRatio", 46.5),
            ],
        );
        let k = key_ratios(&s);

        assert_eq!(k.current_ratio, Some(0.98));
        assert_eq!(k.price_to_book, Some(46.5));
        assert!((k.return_on_equity_pct.unwrap() - 156.0).abs() < 1e-9);
        assert_eq!(k.valuation, Some(Valuation::Overvalued));
        assert!(k.commentary.unwrap().contains("may be overvalued"));
    }

    #[test]
    fn test_key_ratios_without_pe_has_no_commentary() {
        let k = key_ratios(&snapshot("XYZ", &[("currentRatio", 2.0)]));
        assert!(k.price_to_earnings.is_none());
        assert!(k.valuation.is_none());
        assert!(k.commentary.is_none());
    }

    #[test]
    fn test_default_peer_selection_takes_first_three() {
        let available = strings(&["MSFT", "GOOGL", "AMZN", "META"]);
        assert_eq!(select_peers(&available, &[]), strings(&["MSFT", "GOOGL", "AMZN"]));
    }

    #[test]
    fn test_requested_peers_are_filtered_and_deduplicated() {
        let available = strings(&["MSFT", "GOOGL", "AMZN"]);
        let requested = strings(&["AMZN", "TSLA", "AMZN", "MSFT"]);
        assert_eq!(select_peers(&available, &requested), strings(&["AMZN", "MSFT"]));
    }

    #[test]
    fn test_comparison_chart_groups_by_company() {
        let snapshots = vec![
            snapshot("MSFT", &[("priceEarningsRatio", 35.0), ("returnOnEquity", 0.38)]),
            snapshot(
                "AAPL",
                &[
                    ("priceEarningsRatio", 29.0),
                    ("returnOnEquity", 1.5),
                    ("debtEquityRatio", 1.8),
                ],
            ),
        ];
        let cmp = build_peer_comparison(
            "AAPL",
            strings(&["MSFT", "GOOGL"]),
            strings(&["MSFT"]),
            &snapshots,
        );

        assert_eq!(cmp.chart.categories, strings(&["MSFT", "AAPL"]));
        assert_eq!(cmp.chart.series.len(), 3);
        assert_eq!(cmp.chart.series[0].name, "P/E Ratio");
        assert_eq!(cmp.chart.series[0].values, vec![Some(35.0), Some(29.0)]);
        assert_eq!(cmp.chart.series[2].values, vec![None, Some(1.8)]);
        assert_eq!(cmp.rows[1].debt_to_equity, Some(1.8));
    }
}
