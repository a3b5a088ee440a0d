//! Revenue projection from historical fiscal periods.
//!
//! Pure and synchronous: nothing here touches the network or shared state,
//! so handlers call it inline.

use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;

use crate::errors::ForecastError;
use crate::models::{
    ForecastModel, ForecastPoint, ForecastResult, ModelFit, RevenuePoint, RevenueSeries,
};

/// Minimum number of historical periods either model accepts
pub const MIN_HISTORY: usize = 2;

/// Project revenue `horizon` fiscal years past the last historical period
pub fn forecast_revenue(
    series: &RevenueSeries,
    model: ForecastModel,
    horizon: u32,
) -> Result<ForecastResult, ForecastError> {
    if horizon == 0 {
        return Err(ForecastError::InvalidHorizon(horizon));
    }

    let history = sorted_history(series)?;
    // Safe: sorted_history guarantees at least MIN_HISTORY points
    let last = history[history.len() - 1];
    let dates = future_dates(last.date, horizon)?;

    let (fit, projected): (ModelFit, Vec<f64>) = match model {
        ForecastModel::AverageGrowth => {
            let g = average_growth_rate(&history)?;
            let values = (1..=horizon as i32)
                .map(|k| last.revenue * (1.0 + g).powi(k))
                .collect();
            (ModelFit::AverageGrowth { growth_rate: g }, values)
        }
        ForecastModel::LinearRegression => {
            let (slope, intercept) = fit_linear(&history);
            let values = dates
                .iter()
                .map(|d| slope * ordinal(*d) as f64 + intercept)
                .collect();
            (ModelFit::LinearRegression { slope, intercept }, values)
        }
    };

    if let Some(bad) = projected.iter().find(|v| !v.is_finite()) {
        return Err(ForecastError::NonFinite(format!("projected revenue {}", bad)));
    }

    debug!(
        "Forecast {:?} over {} periods from {} ({} history points)",
        model,
        horizon,
        last.date,
        history.len()
    );

    Ok(ForecastResult {
        model,
        fit,
        last_historical_date: last.date,
        last_revenue: last.revenue,
        points: dates
            .into_iter()
            .zip(projected)
            .map(|(date, projected_revenue)| ForecastPoint {
                date,
                projected_revenue,
            })
            .collect(),
    })
}

/// Validate the series and return it sorted oldest-first
pub fn sorted_history(series: &RevenueSeries) -> Result<Vec<RevenuePoint>, ForecastError> {
    if series.len() < MIN_HISTORY {
        return Err(ForecastError::InsufficientData {
            required: MIN_HISTORY,
            actual: series.len(),
        });
    }

    if let Some(p) = series.points.iter().find(|p| !p.revenue.is_finite()) {
        return Err(ForecastError::NonFinite(format!(
            "revenue {} for the period ending {}",
            p.revenue, p.date
        )));
    }

    let mut sorted = series.points.clone();
    sorted.sort_by_key(|p| p.date);

    if let Some(w) = sorted.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ForecastError::DuplicateDate { date: w[0].date });
    }

    Ok(sorted)
}

/// Arithmetic mean of period-over-period percentage changes.
///
/// `history` must be sorted oldest-first. A zero revenue followed by another
/// period makes the change undefined and is reported instead of yielding
/// infinity or NaN.
pub fn average_growth_rate(history: &[RevenuePoint]) -> Result<f64, ForecastError> {
    if history.len() < MIN_HISTORY {
        return Err(ForecastError::InsufficientData {
            required: MIN_HISTORY,
            actual: history.len(),
        });
    }

    let mut total = 0.0;
    for w in history.windows(2) {
        let (prev, curr) = (w[0], w[1]);
        if prev.revenue == 0.0 {
            return Err(ForecastError::ZeroRevenue { date: prev.date });
        }
        total += (curr.revenue - prev.revenue) / prev.revenue;
    }

    Ok(total / (history.len() - 1) as f64)
}

/// Least-squares fit of `revenue = slope * ordinal(date) + intercept`.
///
/// Ordinals are centred before accumulating so the sums stay small; dates are
/// distinct (checked by [`sorted_history`]) so the denominator is non-zero.
pub fn fit_linear(history: &[RevenuePoint]) -> (f64, f64) {
    let n = history.len() as f64;
    let xs: Vec<f64> = history.iter().map(|p| ordinal(p.date) as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = history.iter().map(|p| p.revenue).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, p) in xs.iter().zip(history) {
        numerator += (x - x_mean) * (p.revenue - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;
    (slope, intercept)
}

/// Proleptic Gregorian day number, 0001-01-01 being day 1
pub fn ordinal(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64
}

/// `horizon` dates, each one calendar year after the previous, starting one
/// year after `last`. Feb 29 clamps to Feb 28 in non-leap years.
pub fn future_dates(last: NaiveDate, horizon: u32) -> Result<Vec<NaiveDate>, ForecastError> {
    (1..=horizon)
        .map(|k| {
            k.checked_mul(12)
                .and_then(|months| last.checked_add_months(Months::new(months)))
                .ok_or(ForecastError::DateOutOfRange { from: last, years: k })
        })
        .collect()
}
