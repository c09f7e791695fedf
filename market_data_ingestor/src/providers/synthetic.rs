//! Deterministic synthetic bars for dry runs and tests.
//!
//! The series sits on one plateau and jumps to another for its last
//! `tail_bars` bars ([`DEFAULT_TAIL_BARS`] unless set), so a 5/20
//! moving-average pair crosses exactly once, on the first tail bar: upward
//! for [`Scenario::Golden`], downward for [`Scenario::Death`]. With a tail of
//! one bar the cross lands on the newest bar.
//!
//! The last [`DRIFT_BARS`] bars of the first plateau slope through its level,
//! away from the tail side, which keeps the short average on the far side of
//! the long one right up to the jump while the plateau still averages to its
//! level.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use crate::{
    models::{bar::Bar, bar_series::BarSeries, request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::{DataProvider, EmptySnafu, InternalSnafu, ProviderError, ValidationSnafu},
};

pub const DEFAULT_BARS: usize = 50;
pub const DEFAULT_SEED: u64 = 42;

/// Default number of bars on the second plateau.
pub const DEFAULT_TAIL_BARS: usize = 5;

const LOW_LEVEL: f64 = 10.0;
const HIGH_LEVEL: f64 = 12.0;
const CLOSE_NOISE: f64 = 0.05;

/// Body bars nearest the tail that slope through the body level.
pub const DRIFT_BARS: usize = 20;
const DRIFT_PER_BAR: f64 = 0.02;

/// Which crossover the generated tail should produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Golden,
    Death,
}

impl Scenario {
    /// Close levels of the (body, tail) plateaus.
    fn levels(self) -> (f64, f64) {
        match self {
            Scenario::Golden => (LOW_LEVEL, HIGH_LEVEL),
            Scenario::Death => (HIGH_LEVEL, LOW_LEVEL),
        }
    }

    /// Offset of the body bar `bars_before_tail` bars ahead of the jump.
    ///
    /// Zero outside the drift span; inside it the offsets are symmetric around
    /// zero and end on the far side from the tail.
    fn drift(self, bars_before_tail: usize) -> f64 {
        if bars_before_tail > DRIFT_BARS {
            return 0.0;
        }
        let centre = (DRIFT_BARS + 1) as f64 / 2.0;
        let offset = DRIFT_PER_BAR * (bars_before_tail as f64 - centre);
        match self {
            Scenario::Golden => offset,
            Scenario::Death => -offset,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Golden => f.write_str("golden"),
            Scenario::Death => f.write_str("death"),
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "golden" => Ok(Scenario::Golden),
            "death" => Ok(Scenario::Death),
            other => Err(format!("unknown scenario {other:?}, expected golden or death")),
        }
    }
}

/// Provider that fabricates bars instead of calling a vendor.
#[derive(Clone, Debug)]
pub struct SyntheticProvider {
    scenario: Scenario,
    bars: usize,
    tail_bars: usize,
    seed: u64,
    anchor: Option<DateTime<Utc>>,
}

impl SyntheticProvider {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            bars: DEFAULT_BARS,
            tail_bars: DEFAULT_TAIL_BARS,
            seed: DEFAULT_SEED,
            anchor: None,
        }
    }

    /// Bars on the second plateau. `1` puts the cross on the newest bar.
    pub fn with_tail_bars(mut self, tail_bars: usize) -> Self {
        self.tail_bars = tail_bars;
        self
    }

    pub fn with_bars(mut self, bars: usize) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Timestamp of the newest bar. Defaults to now, floored to the timeframe.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Generates the full series, oldest first.
    pub fn generate(&self, timeframe: &TimeFrame) -> Result<Vec<Bar>, ProviderError> {
        let step = timeframe.duration().context(ValidationSnafu {
            message: format!("synthetic bars need a fixed-length timeframe, got {timeframe}"),
        })?;
        let newest = match self.anchor {
            Some(anchor) => anchor,
            None => Utc::now().duration_trunc(step).map_err(|e| {
                InternalSnafu {
                    message: format!("cannot align timestamp: {e}"),
                }
                .build()
            })?,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = normal(0.0, CLOSE_NOISE)?;
        let open_noise = normal(0.0, 0.02)?;
        let wick = normal(0.05, 0.02)?;
        let amount = normal(10_000.0, 500.0)?;
        let open_interest = normal(5_000.0, 200.0)?;

        let (body_level, tail_level) = self.scenario.levels();
        let tail_start = self.bars.saturating_sub(self.tail_bars);
        let timestamps = timestamps(newest, step, self.bars)?;

        let closes: Vec<f64> = (0..self.bars)
            .map(|i| {
                let level = if i < tail_start {
                    body_level + self.scenario.drift(tail_start - i)
                } else {
                    tail_level
                };
                level + noise.sample(&mut rng)
            })
            .collect();

        let bars = closes
            .into_iter()
            .zip(timestamps)
            .map(|(close, timestamp)| Bar {
                timestamp,
                open: close + open_noise.sample(&mut rng),
                high: close + wick.sample(&mut rng),
                low: close - wick.sample(&mut rng),
                close,
                volume: None,
                amount: Some(amount.sample(&mut rng)),
                open_interest: Some(open_interest.sample(&mut rng)),
            })
            .collect();

        Ok(bars)
    }
}

/// `count` timestamps `step` apart, oldest first, ending at `newest`.
fn timestamps(
    newest: DateTime<Utc>,
    step: TimeDelta,
    count: usize,
) -> Result<Vec<DateTime<Utc>>, ProviderError> {
    let out_of_range = || {
        InternalSnafu {
            message: format!("{count} bars of {step} do not fit before {newest}"),
        }
        .build()
    };
    let span = i32::try_from(count.saturating_sub(1))
        .ok()
        .and_then(|n| step.checked_mul(n))
        .ok_or_else(out_of_range)?;
    let oldest = newest.checked_sub_signed(span).ok_or_else(out_of_range)?;

    let mut out = Vec::with_capacity(count);
    let mut ts = oldest;
    for i in 0..count {
        if i > 0 {
            ts = ts.checked_add_signed(step).ok_or_else(out_of_range)?;
        }
        out.push(ts);
    }
    Ok(out)
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>, ProviderError> {
    Normal::new(mean, std_dev).map_err(|e| {
        InternalSnafu {
            message: format!("invalid noise distribution: {e}"),
        }
        .build()
    })
}

#[async_trait]
impl DataProvider for SyntheticProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        let bars = self.generate(&params.timeframe)?;
        if bars.is_empty() {
            return EmptySnafu {
                symbol: params.symbol.as_str(),
            }
            .fail();
        }
        Ok(BarSeries::from_unordered(params.symbol.clone(), params.timeframe, bars).keep_last(params.limit))
    }
}
