//! Market data ingestion: vendor-agnostic bar models and the providers that
//! fetch them.
//!
//! Every provider implements [`providers::DataProvider`] and hands back a
//! [`models::bar_series::BarSeries`] ordered oldest to newest.

pub mod models;
pub mod providers;
