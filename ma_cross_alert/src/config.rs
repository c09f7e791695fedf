//! Static run configuration loaded from TOML once at startup.
//!
//! ```toml
//! [instrument]
//! symbol = "603300.SH"
//! asset_class = "stock"
//! timeframe = "15MIN"
//!
//! [strategy]
//! short_window = 5
//! long_window = 20
//!
//! [provider]
//! kind = "tushare"
//!
//! [smtp]
//! server = "smtp.qq.com"
//! from = "alerts@example.com"
//! to = "me@example.com"
//! ```
//!
//! Secrets never live in the file: the Tushare token and SMTP password are
//! read from the environment variables named by `token_env` and
//! `password_env`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono_tz::Tz;
use lettre::message::Mailbox;
use market_data_ingestor::{
    models::{
        asset::AssetClass,
        request_params::{BarsRequestParams, DEFAULT_BAR_LIMIT},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{
        synthetic::{self, Scenario},
        tushare_rest::TushareConfig,
    },
};
use serde::Deserialize;
use thiserror::Error;

use crate::detector::{CrossoverParams, MIN_BARS, WindowPolicy};

pub const DEFAULT_LOG_FILE: &str = "ma_cross_alert.log";

/// Upper bound on generated synthetic bars.
pub const MAX_SYNTHETIC_BARS: usize = 100_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub instrument: InstrumentCfg,
    #[serde(default)]
    pub strategy: StrategyCfg,
    pub provider: ProviderCfg,
    /// Required unless alerts only go to the log (`--dry-run`).
    pub smtp: Option<SmtpCfg>,
    #[serde(default)]
    pub alert: AlertCfg,
    #[serde(default)]
    pub logging: LoggingCfg,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentCfg {
    /// Vendor symbol, e.g. `"603300.SH"`.
    pub symbol: String,
    #[serde(default)]
    pub asset_class: AssetClass,
    #[serde(default = "default_timeframe")]
    pub timeframe: TimeFrame,
    /// Most recent bars to request.
    #[serde(default = "default_bar_limit")]
    pub bar_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyCfg {
    pub short_window: usize,
    pub long_window: usize,
    pub window_policy: WindowPolicy,
}

impl Default for StrategyCfg {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            window_policy: WindowPolicy::MinPeriodOne,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderCfg {
    Tushare(TushareConfig),
    Synthetic(SyntheticCfg),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntheticCfg {
    pub scenario: Scenario,
    #[serde(default = "default_synthetic_bars")]
    pub bars: usize,
    /// Bars after the jump; `1` makes the newest bar the crossover.
    #[serde(default = "default_synthetic_tail_bars")]
    pub tail_bars: usize,
    #[serde(default = "default_synthetic_seed")]
    pub seed: u64,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpSecurity {
    /// TLS from the first byte, usually port 465.
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS, usually port 587.
    Starttls,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpCfg {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub security: SmtpSecurity,
    pub from: String,
    pub to: String,
    /// Login name; the `from` address when omitted.
    pub username: Option<String>,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertCfg {
    /// Time zone used for timestamps in alert messages.
    pub display_timezone: Tz,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self {
            display_timezone: chrono_tz::Asia::Shanghai,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingCfg {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Log file appended to alongside the console. Empty disables it.
    pub file: PathBuf,
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LoggingCfg {
    pub fn log_file(&self) -> Option<&Path> {
        (!self.file.as_os_str().is_empty()).then_some(self.file.as_path())
    }
}

fn default_timeframe() -> TimeFrame {
    TimeFrame {
        amount: 15,
        unit: TimeFrameUnit::Minute,
    }
}

fn default_bar_limit() -> usize {
    DEFAULT_BAR_LIMIT
}

fn default_synthetic_bars() -> usize {
    synthetic::DEFAULT_BARS
}

fn default_synthetic_tail_bars() -> usize {
    synthetic::DEFAULT_TAIL_BARS
}

fn default_synthetic_seed() -> u64 {
    synthetic::DEFAULT_SEED
}

fn default_smtp_port() -> u16 {
    465
}

fn default_password_env() -> String {
    "SMTP_PASSWORD".to_string()
}

fn default_smtp_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Reads, parses and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instrument.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("instrument.symbol cannot be empty".into()));
        }
        if self.instrument.bar_limit < MIN_BARS {
            return Err(ConfigError::Invalid(format!(
                "instrument.bar_limit must be at least {MIN_BARS}"
            )));
        }
        self.crossover_params()?;

        if let ProviderCfg::Synthetic(s) = &self.provider {
            if !(MIN_BARS..=MAX_SYNTHETIC_BARS).contains(&s.bars) {
                return Err(ConfigError::Invalid(format!(
                    "provider.bars must be between {MIN_BARS} and {MAX_SYNTHETIC_BARS}"
                )));
            }
            if s.tail_bars == 0 || s.tail_bars >= s.bars {
                return Err(ConfigError::Invalid(
                    "provider.tail_bars must be at least 1 and less than provider.bars".into(),
                ));
            }
        }

        if let Some(smtp) = &self.smtp {
            if smtp.server.trim().is_empty() {
                return Err(ConfigError::Invalid("smtp.server cannot be empty".into()));
            }
            for (key, address) in [("smtp.from", &smtp.from), ("smtp.to", &smtp.to)] {
                address.parse::<Mailbox>().map_err(|e| {
                    ConfigError::Invalid(format!("{key} is not a valid mailbox ({address:?}): {e}"))
                })?;
            }
        }

        Ok(())
    }

    pub fn crossover_params(&self) -> Result<CrossoverParams, ConfigError> {
        CrossoverParams::new(self.strategy.short_window, self.strategy.long_window)
            .map(|p| p.with_policy(self.strategy.window_policy))
            .map_err(|e| ConfigError::Invalid(format!("strategy: {e}")))
    }

    pub fn bars_request(&self) -> BarsRequestParams {
        BarsRequestParams {
            symbol: self.instrument.symbol.trim().to_string(),
            timeframe: self.instrument.timeframe,
            asset_class: self.instrument.asset_class,
            limit: self.instrument.bar_limit,
        }
    }
}
