use std::{fmt, str::FromStr};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// A bar interval, `amount` × `unit` (e.g. 15 minutes).
///
/// Which combinations a vendor accepts is validated by each provider; this
/// type only rejects a zero amount. The text form is `"<amount><UNIT>"`, e.g.
/// `"15MIN"`, `"1H"`, `"1D"`, `"1W"`, `"3MO"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Result<Self, TimeFrameError> {
        if amount == 0 {
            return Err(TimeFrameError::InvalidAmount {
                unit,
                message: "amount must be at least 1".into(),
            });
        }
        Ok(Self { amount, unit })
    }

    pub fn minutes(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    /// Fixed length of one bar. Months have no fixed length and return `None`.
    pub fn duration(&self) -> Option<TimeDelta> {
        let amount = i64::from(self.amount);
        match self.unit {
            TimeFrameUnit::Minute => Some(TimeDelta::minutes(amount)),
            TimeFrameUnit::Hour => Some(TimeDelta::hours(amount)),
            TimeFrameUnit::Day => Some(TimeDelta::days(amount)),
            TimeFrameUnit::Week => Some(TimeDelta::weeks(amount)),
            TimeFrameUnit::Month => None,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            TimeFrameUnit::Minute => "MIN",
            TimeFrameUnit::Hour => "H",
            TimeFrameUnit::Day => "D",
            TimeFrameUnit::Week => "W",
            TimeFrameUnit::Month => "MO",
        };
        write!(f, "{}{}", self.amount, suffix)
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let amount = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|e| TimeFrameError::InvalidInput {
                message: format!("invalid timeframe amount in {s:?}: {e}"),
            })?
        };

        let unit = match unit.trim() {
            "M" | "MIN" | "MINS" | "MINUTE" | "MINUTES" => TimeFrameUnit::Minute,
            "H" | "HR" | "HOUR" | "HOURS" => TimeFrameUnit::Hour,
            "D" | "DAY" | "DAYS" => TimeFrameUnit::Day,
            "W" | "WK" | "WEEK" | "WEEKS" => TimeFrameUnit::Week,
            "MO" | "MONTH" | "MONTHS" => TimeFrameUnit::Month,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("Invalid timeframe unit: {other:?}"),
                });
            }
        };

        Self::new(amount, unit)
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(tf: TimeFrame) -> Self {
        tf.to_string()
    }
}
