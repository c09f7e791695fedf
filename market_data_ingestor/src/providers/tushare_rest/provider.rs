use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var;
use snafu::{OptionExt, ResultExt};
use tracing::debug;

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, EmptySnafu, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
        tushare_rest::{
            params::{MinuteBarsParams, TushareRequest, api_name, validate_timeframe},
            response::TushareResponse,
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "http://api.tushare.pro";
pub const DEFAULT_TOKEN_ENV: &str = "TUSHARE_TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`TushareProvider`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TushareConfig {
    /// Endpoint receiving the JSON request envelope.
    pub base_url: String,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
    /// Whole-request timeout.
    pub timeout_secs: u64,
}

impl Default for TushareConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub struct TushareProvider {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl TushareProvider {
    /// Creates a new Tushare provider.
    ///
    /// Reads the API token from the environment variable named by
    /// `config.token_env` (`TUSHARE_TOKEN` by default).
    pub fn new(config: &TushareConfig) -> Result<Self, ProviderInitError> {
        let token = SecretString::new(get_env_var(&config.token_env).context(MissingEnvVarSnafu)?.into());
        Self::with_token(config, token)
    }

    /// Creates a provider with an explicit token instead of reading the environment.
    pub fn with_token(config: &TushareConfig, token: SecretString) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token,
        })
    }
}

#[async_trait]
impl DataProvider for TushareProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
        // Validate the timeframe before proceeding.
        let freq = validate_timeframe(&params.timeframe)?;
        let api_name = api_name(params.asset_class);

        let body = TushareRequest {
            api_name,
            token: self.token.expose_secret(),
            params: MinuteBarsParams {
                ts_code: &params.symbol,
                freq,
            },
            fields: "",
        };

        debug!(symbol = %params.symbol, api_name, "requesting bars from Tushare");
        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(http_error(status, message));
        }

        let payload = response.json::<TushareResponse>().await.context(ReqwestSnafu)?;
        let series = into_series(payload, params)?;
        debug!(symbol = %series.symbol, bars = series.len(), "received bars from Tushare");

        Ok(series)
    }
}

/// Maps a non-success HTTP status to [`ProviderError::Api`].
fn http_error(status: StatusCode, message: String) -> ProviderError {
    ApiSnafu {
        code: i64::from(status.as_u16()),
        message,
    }
    .build()
}

/// Turns a decoded response into at most `params.limit` bars, oldest first.
fn into_series(payload: TushareResponse, params: &BarsRequestParams) -> Result<BarSeries, ProviderError> {
    if payload.code != 0 {
        return ApiSnafu {
            code: payload.code,
            message: payload.msg.unwrap_or_default(),
        }
        .fail();
    }

    let table = payload.data.context(EmptySnafu {
        symbol: params.symbol.as_str(),
    })?;
    let bars = table.into_bars()?;
    if bars.is_empty() {
        return EmptySnafu {
            symbol: params.symbol.as_str(),
        }
        .fail();
    }

    Ok(BarSeries::from_unordered(params.symbol.clone(), params.timeframe, bars).keep_last(params.limit))
}
