use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use ma_cross_alert::{
    detector::{CrossoverParams, Signal, WindowPolicy},
    notifier::{Notifier, NotifyError},
    orchestrator::{Orchestrator, RunOutcome, RunPlan, Stage},
    signal::SignalEvent,
};
use market_data_ingestor::{
    models::{
        asset::AssetClass, bar::Bar, bar_series::BarSeries, request_params::BarsRequestParams,
        timeframe::TimeFrame,
    },
    providers::{ApiSnafu, DataProvider, ProviderError},
};

const SYMBOL: &str = "IF2506.CFX";

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2025, 3, 20, 1, 30, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start + Duration::minutes(15 * i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: Some(100.0),
            amount: None,
            open_interest: None,
        })
        .collect()
}

/// Serves a fixed list of bars, or a fixed error.
struct FakeProvider {
    bars: Vec<Bar>,
    fail: bool,
}

impl FakeProvider {
    fn with_closes(closes: &[f64]) -> Self {
        Self {
            bars: bars_from_closes(closes),
            fail: false,
        }
    }

    fn with_bars(bars: Vec<Bar>) -> Self {
        Self { bars, fail: false }
    }

    fn failing() -> Self {
        Self {
            bars: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DataProvider for FakeProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        if self.fail {
            return ApiSnafu {
                code: 40203_i64,
                message: "rate limited",
            }
            .fail();
        }
        Ok(BarSeries {
            symbol: params.symbol.clone(),
            timeframe: params.timeframe,
            bars: self.bars.clone(),
        })
    }
}

/// Remembers every event it is asked to send.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SignalEvent>>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<SignalEvent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_alert(&self, event: &SignalEvent) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotifyError::NotConfigured);
        }
        Ok(())
    }
}

fn plan(short: usize, long: usize, policy: WindowPolicy) -> RunPlan {
    RunPlan {
        request: BarsRequestParams {
            symbol: SYMBOL.to_string(),
            timeframe: TimeFrame::minutes(15).unwrap(),
            asset_class: AssetClass::Futures,
            limit: 200,
        },
        crossover: CrossoverParams::new(short, long)
            .unwrap()
            .with_policy(policy),
    }
}

async fn run(provider: FakeProvider, notifier: &RecordingNotifier, plan: RunPlan) -> RunOutcome {
    Orchestrator::new(Box::new(provider), Box::new(notifier.clone()), plan)
        .run()
        .await
}

#[tokio::test]
async fn upward_cross_on_last_bar_sends_alert() {
    let notifier = RecordingNotifier::default();
    let closes = [10.0, 10.0, 10.0, 10.0, 10.0, 12.0];

    let outcome = run(
        FakeProvider::with_closes(&closes),
        &notifier,
        plan(2, 4, WindowPolicy::MinPeriodOne),
    )
    .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let event = &sent[0];
    assert_eq!(outcome, RunOutcome::Alerted(event.clone()));
    assert_eq!(event.symbol, SYMBOL);
    assert_eq!(event.direction, Signal::UpwardCross);
    assert_eq!(event.price, 12.0);
    assert!((event.short_ma - 11.0).abs() < 1e-9);
    assert!((event.long_ma - 10.5).abs() < 1e-9);
    assert_eq!(event.timestamp, bars_from_closes(&closes)[5].timestamp);
}

#[tokio::test]
async fn downward_cross_on_last_bar_sends_alert() {
    let notifier = RecordingNotifier::default();

    let outcome = run(
        FakeProvider::with_closes(&[10.0, 10.0, 10.0, 10.0, 10.0, 8.0]),
        &notifier,
        plan(2, 4, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert!(matches!(
        outcome,
        RunOutcome::Alerted(SignalEvent {
            direction: Signal::DownwardCross,
            ..
        })
    ));
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn stale_cross_does_not_alert() {
    let notifier = RecordingNotifier::default();

    // The cross happens one bar before the last.
    let outcome = run(
        FakeProvider::with_closes(&[10.0, 10.0, 10.0, 10.0, 12.0, 12.0]),
        &notifier,
        plan(2, 4, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::NoSignal);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn flat_prices_do_not_alert() {
    let notifier = RecordingNotifier::default();

    let outcome = run(
        FakeProvider::with_closes(&[3950.2; 30]),
        &notifier,
        plan(5, 20, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::NoSignal);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn fetch_failure_aborts_before_notifying() {
    let notifier = RecordingNotifier::default();

    let outcome = run(
        FakeProvider::failing(),
        &notifier,
        plan(5, 20, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::Aborted(Stage::Fetching));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn empty_series_aborts_at_fetch() {
    let notifier = RecordingNotifier::default();

    let outcome = run(
        FakeProvider::with_closes(&[]),
        &notifier,
        plan(5, 20, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::Aborted(Stage::Fetching));
}

#[tokio::test]
async fn single_bar_aborts_at_compute() {
    let notifier = RecordingNotifier::default();

    let outcome = run(
        FakeProvider::with_closes(&[10.0]),
        &notifier,
        plan(5, 20, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::Aborted(Stage::Computing));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn unusable_close_aborts_at_compute() {
    let notifier = RecordingNotifier::default();

    let outcome = run(
        FakeProvider::with_closes(&[10.0, f64::NAN, 10.0, 12.0]),
        &notifier,
        plan(2, 3, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::Aborted(Stage::Computing));
}

#[tokio::test]
async fn out_of_order_bars_abort_at_compute() {
    let notifier = RecordingNotifier::default();
    let mut bars = bars_from_closes(&[10.0, 10.0, 10.0, 12.0]);
    bars.swap(1, 2);

    let outcome = run(
        FakeProvider::with_bars(bars),
        &notifier,
        plan(2, 3, WindowPolicy::MinPeriodOne),
    )
    .await;

    assert_eq!(outcome, RunOutcome::Aborted(Stage::Computing));
}

#[tokio::test]
async fn too_few_full_windows_abort_at_detect() {
    let notifier = RecordingNotifier::default();

    // Only the last of four bars has a full long window.
    let outcome = run(
        FakeProvider::with_closes(&[10.0, 10.0, 10.0, 12.0]),
        &notifier,
        plan(2, 4, WindowPolicy::FullWindow),
    )
    .await;

    assert_eq!(outcome, RunOutcome::Aborted(Stage::Detecting));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn notifier_failure_is_reported_not_raised() {
    let notifier = RecordingNotifier::failing();

    let outcome = run(
        FakeProvider::with_closes(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0]),
        &notifier,
        plan(2, 4, WindowPolicy::MinPeriodOne),
    )
    .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(outcome, RunOutcome::NotificationFailed(sent[0].clone()));
}
