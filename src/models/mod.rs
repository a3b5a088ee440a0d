mod company;
mod dashboard;
mod forecast;
mod news;
mod ratios;
mod statement;

pub use company::{CompanyProfile, PeerList};
pub use dashboard::{
    BarChart, BarSeries, ChartPoint, Dashboard, DashboardQuery, ForecastSection, ForecastTableRow,
    IndicatorRow, IndicatorTable, LineChart, AVAILABLE_INDICATORS, DEFAULT_INDICATORS,
    DISPLAY_DATE_FORMAT,
};
pub use forecast::{
    ForecastModel, ForecastPoint, ForecastResult, ModelFit, RevenuePoint, RevenueSeries,
};
pub use news::{NewsItem, NewsQueryParams};
pub use ratios::{KeyRatios, PeerComparison, PeerQueryParams, PeerRatioRow, RatioSnapshot, Valuation};
pub use statement::{StatementKind, StatementRow, StatementTable};
