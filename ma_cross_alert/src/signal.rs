//! The single alertable event a run can produce.

use chrono::{DateTime, Utc};

use crate::detector::{AnnotatedBar, Signal};

/// A crossover on the most recent bar, ready to be sent out.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    /// Close price of the signalling bar.
    pub price: f64,
    pub short_ma: f64,
    pub long_ma: f64,
    /// Never [`Signal::Neutral`].
    pub direction: Signal,
}

/// Builds the event for the last annotated bar, if that bar crossed.
///
/// Crosses on earlier bars are stale and ignored.
pub fn latest_signal(symbol: &str, annotated: &[AnnotatedBar]) -> Option<SignalEvent> {
    let latest = annotated.last()?;
    if !latest.signal.is_cross() {
        return None;
    }
    Some(SignalEvent {
        symbol: symbol.to_string(),
        timestamp: latest.bar.timestamp,
        price: latest.bar.close,
        short_ma: latest.short_ma,
        long_ma: latest.long_ma,
        direction: latest.signal,
    })
}
