pub mod cached_provider;
pub mod data_provider;
pub mod fmp;
