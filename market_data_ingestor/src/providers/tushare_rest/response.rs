use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{Asia::Shanghai, Tz};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use snafu::OptionExt;

use crate::{
    models::bar::Bar,
    providers::{InvalidFieldSnafu, MissingFieldSnafu, ProviderError},
};

/// Time zone Tushare stamps Chinese exchange bars in.
pub const EXCHANGE_TZ: Tz = Shanghai;

/// The timestamp column has been published under both names.
const TIME_COLUMNS: [&str; 2] = ["trade_time", "time"];

const TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y%m%d %H:%M:%S"];

#[derive(Deserialize, Debug)]
pub struct TushareResponse {
    /// `0` on success, a vendor error code otherwise.
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<TushareTable>,
}

/// Column-oriented payload: one header row, then one array per record.
#[derive(Deserialize, Debug)]
pub struct TushareTable {
    pub fields: Vec<String>,
    #[serde(default)]
    pub items: Vec<Vec<Value>>,
}

impl TushareTable {
    /// Converts every record into a [`Bar`], in payload order.
    ///
    /// Time, open, high, low and close are required on every row; volume,
    /// amount and open interest are optional.
    pub fn into_bars(self) -> Result<Vec<Bar>, ProviderError> {
        let index: IndexMap<&str, usize> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let col = |name: &str| index.get(name).copied();
        let time_col = TIME_COLUMNS.iter().find_map(|name| col(name));

        self.items
            .iter()
            .enumerate()
            .map(|(row, item)| {
                Ok(Bar {
                    timestamp: timestamp(cell(item, time_col), row)?,
                    open: required(item, col("open"), "open", row)?,
                    high: required(item, col("high"), "high", row)?,
                    low: required(item, col("low"), "low", row)?,
                    close: required(item, col("close"), "close", row)?,
                    volume: optional(item, col("vol"), "vol", row)?,
                    amount: optional(item, col("amount"), "amount", row)?,
                    open_interest: optional(item, col("oi"), "oi", row)?,
                })
            })
            .collect()
    }
}

/// Parses an exchange-local timestamp such as `"2025-03-20 10:15:00"`.
pub fn parse_exchange_time(text: &str) -> Option<DateTime<Utc>> {
    let naive = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())?;
    EXCHANGE_TZ
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

fn cell(item: &[Value], idx: Option<usize>) -> Option<&Value> {
    idx.and_then(|i| item.get(i)).filter(|v| !v.is_null())
}

fn timestamp(value: Option<&Value>, row: usize) -> Result<DateTime<Utc>, ProviderError> {
    let value = value.context(MissingFieldSnafu {
        field: "trade_time",
        row,
    })?;
    value
        .as_str()
        .and_then(parse_exchange_time)
        .context(InvalidFieldSnafu {
            field: "trade_time",
            row,
            message: format!("unrecognised timestamp {value}"),
        })
}

fn number(value: &Value, field: &str, row: usize) -> Result<f64, ProviderError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).context(InvalidFieldSnafu {
        field,
        row,
        message: format!("expected a number, got {value}"),
    })
}

fn required(item: &[Value], idx: Option<usize>, field: &str, row: usize) -> Result<f64, ProviderError> {
    let value = cell(item, idx).context(MissingFieldSnafu { field, row })?;
    number(value, field, row)
}

fn optional(
    item: &[Value],
    idx: Option<usize>,
    field: &str,
    row: usize,
) -> Result<Option<f64>, ProviderError> {
    cell(item, idx).map(|v| number(v, field, row)).transpose()
}
