//! One strategy run: fetch, compute, detect, notify.
//!
//! Each stage logs its own failure and ends the run with
//! [`RunOutcome::Aborted`]; nothing is retried and no error escapes
//! [`Orchestrator::run`].

use std::fmt;

use market_data_ingestor::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
    providers::DataProvider,
};
use tracing::{error, info, warn};

use crate::{
    config::{AppConfig, ConfigError},
    detector::{
        AnnotatedBar, AveragedBar, CrossoverParams, DetectorError, annotate_crossovers,
        moving_averages,
    },
    notifier::Notifier,
    signal::{SignalEvent, latest_signal},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Computing,
    Detecting,
    Notifying,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Computing => "computing",
            Stage::Detecting => "detecting",
            Stage::Notifying => "notifying",
        };
        f.write_str(name)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The latest bar crossed and the alert went out.
    Alerted(SignalEvent),
    /// The latest bar did not cross.
    NoSignal,
    /// The latest bar crossed but the alert could not be delivered.
    NotificationFailed(SignalEvent),
    /// The run stopped at this stage; the cause has been logged.
    Aborted(Stage),
}

/// What a run asks for: which bars, and which averages to compare.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub request: BarsRequestParams,
    pub crossover: CrossoverParams,
}

impl RunPlan {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            request: config.bars_request(),
            crossover: config.crossover_params()?,
        })
    }
}

pub struct Orchestrator {
    provider: Box<dyn DataProvider + Send + Sync>,
    notifier: Box<dyn Notifier + Send + Sync>,
    plan: RunPlan,
}

impl Orchestrator {
    pub fn new(
        provider: Box<dyn DataProvider + Send + Sync>,
        notifier: Box<dyn Notifier + Send + Sync>,
        plan: RunPlan,
    ) -> Self {
        Self {
            provider,
            notifier,
            plan,
        }
    }

    /// Runs every stage once and reports how far it got.
    pub async fn run(&self) -> RunOutcome {
        let request = &self.plan.request;
        info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            short_window = self.plan.crossover.short_window(),
            long_window = self.plan.crossover.long_window(),
            "strategy run started"
        );

        let outcome = self.run_stages().await;
        match &outcome {
            RunOutcome::Alerted(event) => {
                info!(direction = %event.direction, "strategy run finished with alert")
            }
            RunOutcome::NoSignal => info!("strategy run finished without signal"),
            RunOutcome::NotificationFailed(event) => warn!(
                direction = %event.direction,
                "strategy run finished but the alert was not delivered"
            ),
            RunOutcome::Aborted(stage) => warn!(%stage, "strategy run aborted"),
        }
        outcome
    }

    async fn run_stages(&self) -> RunOutcome {
        let series = match self.fetch().await {
            Some(series) => series,
            None => return RunOutcome::Aborted(Stage::Fetching),
        };

        let averaged = match self.compute(&series) {
            Some(averaged) => averaged,
            None => return RunOutcome::Aborted(Stage::Computing),
        };

        let annotated = match annotate_crossovers(averaged) {
            Ok(annotated) => annotated,
            Err(e) => {
                error!(stage = %Stage::Detecting, error = %e, "crossover detection failed");
                return RunOutcome::Aborted(Stage::Detecting);
            }
        };

        let Some(event) = latest_signal(&series.symbol, &annotated) else {
            log_latest(&annotated);
            return RunOutcome::NoSignal;
        };

        info!(
            symbol = %event.symbol,
            direction = %event.direction,
            signal = event.direction.as_i8(),
            price = event.price,
            short_ma = event.short_ma,
            long_ma = event.long_ma,
            "crossover on latest bar"
        );

        match self.notifier.send_alert(&event).await {
            Ok(()) => RunOutcome::Alerted(event),
            Err(e) => {
                error!(stage = %Stage::Notifying, error = %e, "failed to send alert");
                RunOutcome::NotificationFailed(event)
            }
        }
    }

    async fn fetch(&self) -> Option<BarSeries> {
        match self.provider.fetch_bars(&self.plan.request).await {
            Ok(series) if series.is_empty() => {
                error!(stage = %Stage::Fetching, symbol = %series.symbol, "provider returned no bars");
                None
            }
            Ok(series) => {
                info!(bars = series.len(), "bars fetched");
                Some(series)
            }
            Err(e) => {
                error!(stage = %Stage::Fetching, error = %e, "failed to fetch bars");
                None
            }
        }
    }

    fn compute(&self, series: &BarSeries) -> Option<Vec<AveragedBar>> {
        match moving_averages(&series.bars, &self.plan.crossover) {
            Ok(averaged) => Some(averaged),
            Err(e @ DetectorError::InsufficientData { .. }) => {
                warn!(stage = %Stage::Computing, error = %e, "not enough bars for moving averages");
                None
            }
            Err(e) => {
                error!(stage = %Stage::Computing, error = %e, "moving average computation failed");
                None
            }
        }
    }
}

fn log_latest(annotated: &[AnnotatedBar]) {
    if let Some(latest) = annotated.last() {
        info!(
            timestamp = %latest.bar.timestamp,
            close = latest.bar.close,
            short_ma = latest.short_ma,
            long_ma = latest.long_ma,
            signal = latest.signal.as_i8(),
            "no crossover on latest bar"
        );
    }
}
