//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching time-series bar data from any market data vendor.
//!
//! Each concrete provider implementation (such as Tushare, or the synthetic
//! generator used for dry runs) implements [`DataProvider`] to handle
//! vendor-specific API logic and validation.
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{
//!     bar_series::BarSeries,
//!     request_params::BarsRequestParams,
//! };
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         params: &BarsRequestParams,
//!     ) -> Result<BarSeries, ProviderError> {
//!         Ok(BarSeries::from_unordered(params.symbol.clone(), params.timeframe, vec![]))
//!     }
//! }
//! ```
//!

pub mod synthetic;
pub mod tushare_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar_series::BarSeries, request_params::BarsRequestParams};

/// Trait for fetching time-series bar data from a market data provider.
///
/// Implement this trait for each concrete data vendor.
#[async_trait]
pub trait DataProvider {
    /// Fetches the most recent bars for the given request parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameters specifying symbol, timeframe, asset class and limit.
    ///
    /// # Returns
    ///
    /// * `Ok(BarSeries)` - At most `params.limit` bars, oldest first.
    /// * `Err(ProviderError)` - If the request fails or the payload is unusable.
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., invalid token).
    #[snafu(display("API error {code}: {message}"))]
    Api {
        code: i64,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// A row in the payload lacks a field every bar must carry.
    #[snafu(display("Row {row} is missing required field `{field}`"))]
    MissingField {
        field: String,
        row: usize,
        backtrace: Backtrace,
    },

    /// A field is present but cannot be interpreted.
    #[snafu(display("Row {row} has an invalid `{field}`: {message}"))]
    InvalidField {
        field: String,
        row: usize,
        message: String,
        backtrace: Backtrace,
    },

    /// The provider answered successfully but returned no bars.
    #[snafu(display("No bars returned for {symbol}"))]
    Empty {
        symbol: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::models::{asset::AssetClass, timeframe::TimeFrame};

    use super::*;

    struct CountingProvider {
        calls: AtomicUsize,
    }

    struct FailingProvider;

    #[async_trait]
    impl DataProvider for CountingProvider {
        async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BarSeries::from_unordered(params.symbol.clone(), params.timeframe, vec![]))
        }
    }

    #[async_trait]
    impl DataProvider for FailingProvider {
        async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
            EmptySnafu {
                symbol: params.symbol.clone(),
            }
            .fail()
        }
    }

    // This function decides AT RUNTIME which provider to give back.
    fn get_provider(name: &str) -> Box<dyn DataProvider + Send + Sync> {
        if name == "counting" {
            Box::new(CountingProvider {
                calls: AtomicUsize::new(0),
            })
        } else {
            Box::new(FailingProvider)
        }
    }

    fn params() -> BarsRequestParams {
        BarsRequestParams {
            symbol: "IF2506.CFX".to_string(),
            timeframe: TimeFrame::minutes(15).unwrap(),
            asset_class: AssetClass::Futures,
            limit: 200,
        }
    }

    #[tokio::test]
    async fn test_dynamic_provider() {
        let provider = get_provider("counting");
        let series = provider.fetch_bars(&params()).await.unwrap();
        assert_eq!(series.symbol, "IF2506.CFX");
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_provider_error_display() {
        let provider = get_provider("failing");
        let err = provider.fetch_bars(&params()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Empty { .. }));
        assert_eq!(err.to_string(), "No bars returned for IF2506.CFX");
    }
}
