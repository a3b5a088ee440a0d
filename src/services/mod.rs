pub mod dashboard_service;
pub mod data_service;
pub mod forecast_service;
pub mod rate_limiter;
pub mod ratio_service;
pub mod statement_service;
