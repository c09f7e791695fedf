use serde::Serialize;

use crate::{
    models::{
        asset::AssetClass,
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Minute frequencies the real-time minute endpoints accept.
const SUPPORTED_MINUTES: [u32; 5] = [1, 5, 15, 30, 60];

/// Request envelope shared by every Tushare dataset.
#[derive(Debug, Serialize)]
pub struct TushareRequest<'a> {
    pub api_name: &'a str,
    pub token: &'a str,
    pub params: MinuteBarsParams<'a>,
    /// Comma-separated column list; empty asks for the dataset's defaults.
    pub fields: &'a str,
}

/// Parameters of the `rt_fut_min` / `rt_min` datasets.
#[derive(Debug, Serialize)]
pub struct MinuteBarsParams<'a> {
    pub ts_code: &'a str,
    pub freq: String,
}

/// Dataset serving real-time minute bars for an asset class.
pub fn api_name(asset_class: AssetClass) -> &'static str {
    match asset_class {
        AssetClass::Futures => "rt_fut_min",
        AssetClass::Stock => "rt_min",
    }
}

/// Validates the timeframe and renders it as a Tushare `freq` value.
pub fn validate_timeframe(timeframe: &TimeFrame) -> Result<String, ProviderError> {
    let minutes = match timeframe.unit {
        TimeFrameUnit::Minute => timeframe.amount,
        TimeFrameUnit::Hour if timeframe.amount == 1 => 60,
        _ => 0,
    };

    if SUPPORTED_MINUTES.contains(&minutes) {
        Ok(format!("{minutes}MIN"))
    } else {
        ValidationSnafu {
            message: format!(
                "Tushare minute bars support 1, 5, 15, 30 or 60 minutes, got {timeframe}"
            ),
        }
        .fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_supported_frequencies() {
        assert_eq!(validate_timeframe(&TimeFrame::minutes(15).unwrap()).unwrap(), "15MIN");
        assert_eq!(validate_timeframe(&TimeFrame::minutes(1).unwrap()).unwrap(), "1MIN");
        assert_eq!(validate_timeframe(&TimeFrame::hours(1).unwrap()).unwrap(), "60MIN");
    }

    #[test]
    fn rejects_unsupported_frequencies() {
        for tf in ["7MIN", "2H", "1D", "1W"] {
            let tf: TimeFrame = tf.parse().unwrap();
            assert!(
                matches!(validate_timeframe(&tf), Err(ProviderError::Validation { .. })),
                "{tf} should be rejected"
            );
        }
    }

    #[test]
    fn request_body_shape() {
        let body = TushareRequest {
            api_name: api_name(AssetClass::Futures),
            token: "t0k3n",
            params: MinuteBarsParams {
                ts_code: "IF2506.CFX",
                freq: "15MIN".into(),
            },
            fields: "",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "api_name": "rt_fut_min",
                "token": "t0k3n",
                "params": { "ts_code": "IF2506.CFX", "freq": "15MIN" },
                "fields": ""
            })
        );
        assert_eq!(api_name(AssetClass::Stock), "rt_min");
    }
}
