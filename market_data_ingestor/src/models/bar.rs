//! Canonical in-memory representation of a time-series bar (OHLC).
//!
//! This struct is used as the standard output for all [`DataProvider`](crate::providers::DataProvider)
//! implementations, regardless of asset class.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single time-series bar for a given timestamp.
///
/// Bars are immutable once a provider has produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The timestamp for this bar (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval. Not all providers supply this.
    pub volume: Option<f64>,

    /// Traded amount (turnover). Not all providers supply this.
    pub amount: Option<f64>,

    /// Open interest at the end of the interval, futures only.
    pub open_interest: Option<f64>,
}
