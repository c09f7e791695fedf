//! Delivery of crossover alerts.

pub mod dry_run;
pub mod smtp;

use async_trait::async_trait;
use chrono_tz::Tz;
use shared_utils::env::MissingEnvVarError;
use thiserror::Error;

use crate::{config::AppConfig, signal::SignalEvent};

pub use dry_run::LogNotifier;
pub use smtp::SmtpNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mailbox {address:?}: {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("failed to build alert email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("SMTP password unavailable: {0}")]
    MissingSecret(#[from] MissingEnvVarError),

    #[error("no [smtp] section configured")]
    NotConfigured,
}

/// Sends one alert per detected signal.
#[async_trait]
pub trait Notifier {
    async fn send_alert(&self, event: &SignalEvent) -> Result<(), NotifyError>;
}

/// Build the notifier for this run: the log for dry runs, SMTP otherwise.
pub fn build_notifier(
    config: &AppConfig,
    dry_run: bool,
) -> Result<Box<dyn Notifier + Send + Sync>, NotifyError> {
    let tz = config.alert.display_timezone;
    if dry_run {
        return Ok(Box::new(LogNotifier::new(tz)));
    }
    let smtp = config.smtp.as_ref().ok_or(NotifyError::NotConfigured)?;
    Ok(Box::new(SmtpNotifier::from_config(smtp, tz)?))
}

/// Rendered alert text, independent of the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

/// Renders `event` with its timestamp shown in `tz`.
pub fn format_alert(event: &SignalEvent, tz: Tz) -> AlertMessage {
    let local_time = event.timestamp.with_timezone(&tz).format("%Y-%m-%d %H:%M");
    let subject = format!("[MA signal] {} - {}", event.symbol, event.direction);
    let body = format!(
        "Instrument: {}\n\
         Signal time: {local_time}\n\
         Signal: {}\n\
         Price: {:.2}\n\
         Short MA: {:.2}\n\
         Long MA: {:.2}\n",
        event.symbol, event.direction, event.price, event.short_ma, event.long_ma,
    );
    AlertMessage { subject, body }
}
