//! Company fundamentals dashboard backend.
//!
//! Pulls statements, ratios, peers and news from Financial Modeling Prep,
//! projects revenue forward, and serves everything as chart-ready JSON.

pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

mod routes;
