use std::collections::BTreeMap;

use crate::errors::ForecastError;
use crate::models::{
    ChartPoint, ForecastModel, ForecastResult, ForecastSection, ForecastTableRow, IndicatorRow,
    IndicatorTable, LineChart, RevenueSeries, StatementTable, AVAILABLE_INDICATORS,
    DEFAULT_INDICATORS, DISPLAY_DATE_FORMAT,
};
use crate::services::forecast_service;

/// Split a comma-separated indicator list, keeping known names in order.
/// Falls back to the defaults when nothing usable is given.
pub fn parse_indicators(raw: Option<&str>) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for name in raw.unwrap_or_default().split(',').map(str::trim) {
        if AVAILABLE_INDICATORS.contains(&name) && !selected.iter().any(|s| s == name) {
            selected.push(name.to_string());
        }
    }
    if selected.is_empty() {
        DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect()
    } else {
        selected
    }
}

/// Rows of `table` restricted to the selected indicators it actually has
pub fn indicator_table(table: &StatementTable, indicators: &[String]) -> IndicatorTable {
    let columns: Vec<String> = indicators
        .iter()
        .filter(|i| table.has_column(i))
        .cloned()
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| IndicatorRow {
            date: row.date.format(DISPLAY_DATE_FORMAT).to_string(),
            values: columns
                .iter()
                .filter_map(|c| row.get(c).map(|v| (c.clone(), v)))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect();

    IndicatorTable {
        kind: table.kind,
        title: table.kind.title().to_string(),
        columns,
        rows,
    }
}

/// One chronological line chart per indicator. Each indicator comes from the
/// first table that has it, in the order given; unknown ones are skipped.
pub fn indicator_charts(tables: &[&StatementTable], indicators: &[String]) -> Vec<LineChart> {
    indicators
        .iter()
        .filter_map(|indicator| {
            let table = tables.iter().find(|t| t.has_column(indicator))?;
            let mut series = table.column(indicator);
            series.sort_by_key(|(date, _)| *date);

            Some(LineChart {
                title: format!("{} over time", indicator),
                x_label: "Date".to_string(),
                y_label: indicator.clone(),
                points: series
                    .into_iter()
                    .map(|(date, y)| ChartPoint {
                        x: date.format(DISPLAY_DATE_FORMAT).to_string(),
                        y,
                    })
                    .collect(),
            })
        })
        .collect()
}

/// The `revenue` column of an income statement
pub fn revenue_series(income: &StatementTable) -> RevenueSeries {
    income.column("revenue").into_iter().collect()
}

/// Run the forecast and shape it for display. Engine errors end up in
/// `error` rather than failing the caller.
pub fn forecast_section(
    income: &StatementTable,
    model: ForecastModel,
    horizon: u32,
) -> ForecastSection {
    let outcome = forecast_service::forecast_revenue(&revenue_series(income), model, horizon);
    render_forecast(model, horizon, outcome)
}

pub fn render_forecast(
    model: ForecastModel,
    horizon: u32,
    outcome: Result<ForecastResult, ForecastError>,
) -> ForecastSection {
    let mut section = ForecastSection {
        model,
        horizon,
        methodology: model.description().to_string(),
        average_growth_rate: None,
        table: Vec::new(),
        chart: None,
        error: None,
    };

    match outcome {
        Ok(result) => {
            section.average_growth_rate = result.growth_rate();
            section.table = result
                .points
                .iter()
                .map(|p| ForecastTableRow {
                    date: p.date.format(DISPLAY_DATE_FORMAT).to_string(),
                    projected_revenue: p.projected_revenue,
                })
                .collect();
            section.chart = Some(LineChart {
                title: "Revenue Forecast".to_string(),
                x_label: "Date".to_string(),
                y_label: "Projected revenue".to_string(),
                points: section
                    .table
                    .iter()
                    .map(|r| ChartPoint {
                        x: r.date.clone(),
                        y: r.projected_revenue,
                    })
                    .collect(),
            });
        }
        Err(e) => section.error = Some(e.to_string()),
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StatementKind, StatementRow};
    use chrono::NaiveDate;

    fn row(y: i32, values: &[(&str, f64)]) -> StatementRow {
        StatementRow {
            date: NaiveDate::from_ymd_opt(y, 9, 30).unwrap(),
            period: Some("FY".to_string()),
            values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn income() -> StatementTable {
        StatementTable {
            kind: StatementKind::IncomeStatement,
            rows: vec![
                row(2023, &[("revenue", 121.0), ("netIncome", 12.0), ("eps", 1.2)]),
                row(2022, &[("revenue", 110.0), ("netIncome", 11.0), ("eps", 1.1)]),
                row(2021, &[("revenue", 100.0), ("netIncome", 10.0), ("eps", 1.0)]),
            ],
        }
    }

    fn balance() -> StatementTable {
        StatementTable {
            kind: StatementKind::BalanceSheet,
            rows: vec![
                row(2023, &[("totalAssets", 500.0), ("netIncome", -1.0)]),
                row(2022, &[("totalAssets", 450.0)]),
            ],
        }
    }

    #[test]
    fn test_parse_indicators_filters_unknown_and_duplicates() {
        assert_eq!(
            parse_indicators(Some("eps, bogus,revenue,eps")),
            vec!["eps".to_string(), "revenue".to_string()]
        );
    }

    #[test]
    fn test_parse_indicators_defaults() {
        assert_eq!(parse_indicators(None), vec!["revenue", "netIncome", "eps"]);
        assert_eq!(parse_indicators(Some("nope")), vec!["revenue", "netIncome", "eps"]);
    }

    #[test]
    fn test_indicator_table_keeps_only_present_columns() {
        let indicators = vec!["revenue".to_string(), "totalAssets".to_string()];
        let table = indicator_table(&income(), &indicators);

        assert_eq!(table.columns, vec!["revenue".to_string()]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].date, "30-09-2023");
        assert_eq!(table.rows[0].values.get("revenue"), Some(&121.0));
        assert!(!table.rows[0].values.contains_key("netIncome"));
    }

    #[test]
    fn test_charts_prefer_income_statement_and_sort_chronologically() {
        let income = income();
        let balance = balance();
        let indicators = vec![
            "netIncome".to_string(),
            "totalAssets".to_string(),
            "freeCashFlow".to_string(),
        ];

        let charts = indicator_charts(&[&income, &balance], &indicators);

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].y_label, "netIncome");
        assert_eq!(charts[0].points.first().unwrap().y, 10.0);
        assert_eq!(charts[0].points.last().unwrap().y, 12.0);
        assert_eq!(charts[1].y_label, "totalAssets");
        assert_eq!(charts[1].points[0].x, "30-09-2022");
    }

    #[test]
    fn test_forecast_section_reports_growth() {
        let section = forecast_section(&income(), ForecastModel::AverageGrowth, 3);

        assert!(section.error.is_none());
        assert_eq!(section.table.len(), 3);
        assert_eq!(section.table[0].date, "30-09-2024");
        assert!((section.average_growth_rate.unwrap() - 0.1).abs() < 1e-9);
        assert_eq!(section.chart.unwrap().points.len(), 3);
    }

    #[test]
    fn test_forecast_section_carries_insufficient_data_error() {
        let mut short = income();
        short.rows.truncate(1);

        let section = forecast_section(&short, ForecastModel::LinearRegression, 5);

        assert!(section.table.is_empty());
        assert!(section.chart.is_none());
        assert!(section.error.unwrap().contains("Insufficient data"));
    }
}
