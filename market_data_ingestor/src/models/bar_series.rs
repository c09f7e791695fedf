//! A collection of time-series bars for a specific symbol and timeframe.

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`TimeFrame`], making the data set self-describing. Bars are kept
/// strictly increasing by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "603300.SH", "IF2506.CFX").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// The collection of bars, oldest first.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Builds a series from bars in any order.
    ///
    /// Bars are sorted by timestamp; when two bars share a timestamp the one
    /// appearing later in `bars` wins.
    pub fn from_unordered(symbol: impl Into<String>, timeframe: TimeFrame, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);

        let mut ordered: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match ordered.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => ordered.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            timeframe,
            bars: ordered,
        }
    }

    /// Drops all but the `n` most recent bars.
    pub fn keep_last(mut self, n: usize) -> Self {
        if self.bars.len() > n {
            self.bars.drain(..self.bars.len() - n);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar, if any.
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }
}
