use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which FMP statement a table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Ratios,
}

impl StatementKind {
    /// FMP v3 path segment for this statement
    pub fn endpoint(&self) -> &'static str {
        match self {
            StatementKind::IncomeStatement => "income-statement",
            StatementKind::BalanceSheet => "balance-sheet-statement",
            StatementKind::CashFlow => "cash-flow-statement",
            StatementKind::Ratios => "ratios",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StatementKind::IncomeStatement => "Income Statement",
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::CashFlow => "Cash Flow",
            StatementKind::Ratios => "Financial Ratios",
        }
    }
}

impl std::str::FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" | "income-statement" => Ok(StatementKind::IncomeStatement),
            "balance-sheet" | "balance-sheet-statement" => Ok(StatementKind::BalanceSheet),
            "cash-flow" | "cash-flow-statement" => Ok(StatementKind::CashFlow),
            "ratios" => Ok(StatementKind::Ratios),
            other => Err(format!("Unknown statement kind '{}'", other)),
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// One reporting period: the date plus every numeric column FMP sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub values: BTreeMap<String, f64>,
}

impl StatementRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }
}

/// Tabular statement in provider order (most recent period first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    pub kind: StatementKind,
    pub rows: Vec<StatementRow>,
}

impl StatementTable {
    pub fn empty(kind: StatementKind) -> Self {
        Self { kind, rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.rows.iter().any(|r| r.values.contains_key(column))
    }

    /// Most recent period by date
    pub fn latest(&self) -> Option<&StatementRow> {
        self.rows.iter().max_by_key(|r| r.date)
    }

    /// (date, value) pairs for a column, skipping periods that lack it
    pub fn column(&self, column: &str) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r.get(column).map(|v| (r.date, v)))
            .collect()
    }
}
