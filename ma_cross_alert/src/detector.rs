//! Moving-average crossover detection.
//!
//! Two simple moving averages of the close price are computed per bar, and a
//! bar is flagged when the short average moves to the other side of the long
//! one compared with the bar right before it:
//!
//! - [`Signal::UpwardCross`] (golden cross): `short > long` now and
//!   `short <= long` on the previous bar.
//! - [`Signal::DownwardCross`] (death cross): `short < long` now and
//!   `short >= long` on the previous bar.
//!
//! Equal averages are neither above nor below, and only the immediately
//! preceding bar is consulted. Averages that touch and then return to the side
//! they came from therefore still fire on the bar after the touch.
//!
//! Everything here is pure: the same bars always produce the same
//! [`AnnotatedBar`]s.

use std::fmt;

use market_data_ingestor::models::bar::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest bars that can carry a crossover: one to compare against, one to flag.
pub const MIN_BARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("short window ({short}) must be at least 1 and shorter than long window ({long})")]
    InvalidWindows { short: usize, long: usize },

    #[error("need at least {required} bars to detect a crossover, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("bar {index} has no usable close price")]
    MissingClose { index: usize },

    #[error("bar {index} is not later than the bar before it")]
    NotChronological { index: usize },
}

/// How averages are formed while fewer than `window` bars are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Average whatever bars exist so far (a minimum-period-1 rolling mean).
    #[default]
    MinPeriodOne,
    /// Leave the average undefined until a full window exists; those leading
    /// bars are dropped from the output.
    FullWindow,
}

/// Validated window lengths for the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverParams {
    short_window: usize,
    long_window: usize,
    policy: WindowPolicy,
}

impl CrossoverParams {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, DetectorError> {
        if short_window == 0 || short_window >= long_window {
            return Err(DetectorError::InvalidWindows {
                short: short_window,
                long: long_window,
            });
        }
        Ok(Self {
            short_window,
            long_window,
            policy: WindowPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    fn min_periods(&self, window: usize) -> usize {
        match self.policy {
            WindowPolicy::MinPeriodOne => 1,
            WindowPolicy::FullWindow => window,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    #[default]
    Neutral,
    UpwardCross,
    DownwardCross,
}

impl Signal {
    /// `1` for an upward cross, `-1` for a downward cross, `0` otherwise.
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Neutral => 0,
            Signal::UpwardCross => 1,
            Signal::DownwardCross => -1,
        }
    }

    pub fn is_cross(self) -> bool {
        self != Signal::Neutral
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::Neutral => "No cross",
            Signal::UpwardCross => "Golden cross",
            Signal::DownwardCross => "Death cross",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A bar with both moving averages defined.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedBar {
    pub bar: Bar,
    pub short_ma: f64,
    pub long_ma: f64,
}

/// A bar with both moving averages and its crossover signal.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedBar {
    pub bar: Bar,
    pub short_ma: f64,
    pub long_ma: f64,
    pub signal: Signal,
}

/// Trailing mean over at most `window` values ending at each index.
///
/// Entries with fewer than `min_periods` values available are `None`.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let slice = &values[(i + 1).saturating_sub(window)..=i];
            if window == 0 || slice.len() < min_periods.max(1) {
                return None;
            }
            // Offsets from the first value keep a flat window exactly at that value.
            let anchor = slice[0];
            let offset: f64 = slice.iter().map(|v| v - anchor).sum();
            Some(anchor + offset / slice.len() as f64)
        })
        .collect()
}

/// Computes the short and long moving averages of `bars`.
///
/// Bars whose averages are undefined under the chosen [`WindowPolicy`] are
/// dropped from the front of the result.
pub fn moving_averages(
    bars: &[Bar],
    params: &CrossoverParams,
) -> Result<Vec<AveragedBar>, DetectorError> {
    if bars.len() < MIN_BARS {
        return Err(DetectorError::InsufficientData {
            required: MIN_BARS,
            actual: bars.len(),
        });
    }
    if let Some(index) = bars.iter().position(|b| !b.close.is_finite()) {
        return Err(DetectorError::MissingClose { index });
    }
    if let Some(index) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(DetectorError::NotChronological { index: index + 1 });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let short = rolling_mean(&closes, params.short_window, params.min_periods(params.short_window));
    let long = rolling_mean(&closes, params.long_window, params.min_periods(params.long_window));

    Ok(bars
        .iter()
        .zip(short)
        .zip(long)
        .filter_map(|((bar, short_ma), long_ma)| {
            Some(AveragedBar {
                bar: bar.clone(),
                short_ma: short_ma?,
                long_ma: long_ma?,
            })
        })
        .collect())
}

/// Flags crossovers using one-bar lookback. The first bar is always neutral.
pub fn annotate_crossovers(averaged: Vec<AveragedBar>) -> Result<Vec<AnnotatedBar>, DetectorError> {
    if averaged.len() < MIN_BARS {
        return Err(DetectorError::InsufficientData {
            required: MIN_BARS,
            actual: averaged.len(),
        });
    }

    let mut previous: Option<(f64, f64)> = None;
    let annotated = averaged
        .into_iter()
        .map(|a| {
            let signal = previous
                .map(|(prev_short, prev_long)| crossover(prev_short, prev_long, a.short_ma, a.long_ma))
                .unwrap_or_default();
            previous = Some((a.short_ma, a.long_ma));
            AnnotatedBar {
                bar: a.bar,
                short_ma: a.short_ma,
                long_ma: a.long_ma,
                signal,
            }
        })
        .collect();

    Ok(annotated)
}

/// Computes averages and signals in one pass.
pub fn detect_crossovers(
    bars: &[Bar],
    params: &CrossoverParams,
) -> Result<Vec<AnnotatedBar>, DetectorError> {
    annotate_crossovers(moving_averages(bars, params)?)
}

fn crossover(prev_short: f64, prev_long: f64, short: f64, long: f64) -> Signal {
    if short > long && prev_short <= prev_long {
        Signal::UpwardCross
    } else if short < long && prev_short >= prev_long {
        Signal::DownwardCross
    } else {
        Signal::Neutral
    }
}
