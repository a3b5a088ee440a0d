use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One fiscal period of historical revenue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// Historical revenue, in whatever order the provider returned it.
///
/// The forecast engine sorts a copy before use, so callers may pass the
/// most-recent-first order FMP reports in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueSeries {
    pub points: Vec<RevenuePoint>,
}

impl RevenueSeries {
    pub fn new(points: Vec<RevenuePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(NaiveDate, f64)> for RevenueSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self {
            points: iter
                .into_iter()
                .map(|(date, revenue)| RevenuePoint { date, revenue })
                .collect(),
        }
    }
}

/// Forecasting model selectable by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastModel {
    #[default]
    AverageGrowth,
    LinearRegression,
}

impl ForecastModel {
    pub fn description(&self) -> &'static str {
        match self {
            ForecastModel::AverageGrowth => {
                "Compounds the last revenue by the mean period-over-period growth rate"
            }
            ForecastModel::LinearRegression => {
                "Least-squares line of revenue against the ordinal date, extrapolated"
            }
        }
    }
}

impl std::str::FromStr for ForecastModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average_growth" => Ok(ForecastModel::AverageGrowth),
            "linear_regression" => Ok(ForecastModel::LinearRegression),
            other => Err(format!(
                "Unknown forecast model '{}'. Use 'average_growth' or 'linear_regression'",
                other
            )),
        }
    }
}

/// Single projected period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub projected_revenue: f64,
}

/// Parameters the model settled on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelFit {
    AverageGrowth { growth_rate: f64 },
    LinearRegression { slope: f64, intercept: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub model: ForecastModel,
    pub fit: ModelFit,
    pub last_historical_date: NaiveDate,
    pub last_revenue: f64,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Mean growth rate, when the average-growth model produced this result
    pub fn growth_rate(&self) -> Option<f64> {
        match self.fit {
            ModelFit::AverageGrowth { growth_rate } => Some(growth_rate),
            ModelFit::LinearRegression { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names() {
        assert_eq!(" Average_Growth".parse::<ForecastModel>(), Ok(ForecastModel::AverageGrowth));
        assert_eq!(
            "linear_regression".parse::<ForecastModel>(),
            Ok(ForecastModel::LinearRegression)
        );
        for shorthand in ["growth", "linear", "regression", ""] {
            assert!(shorthand.parse::<ForecastModel>().is_err(), "{}", shorthand);
        }
    }
}
