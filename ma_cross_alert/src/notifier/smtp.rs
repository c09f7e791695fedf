use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use tracing::{debug, info};

use crate::{
    config::{SmtpCfg, SmtpSecurity},
    notifier::{NotifyError, Notifier, format_alert},
    signal::SignalEvent,
};

/// Emails alerts through an authenticated SMTP relay.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    display_tz: Tz,
}

impl SmtpNotifier {
    /// Builds the transport, reading the password from `config.password_env`.
    ///
    /// No connection is opened until the first alert is sent.
    pub fn from_config(config: &SmtpCfg, display_tz: Tz) -> Result<Self, NotifyError> {
        let password = SecretString::new(get_env_var(&config.password_env)?.into());
        Self::with_password(config, display_tz, password)
    }

    pub fn with_password(
        config: &SmtpCfg,
        display_tz: Tz,
        password: SecretString,
    ) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.from)?;
        let to = parse_mailbox(&config.to)?;
        let username = config
            .username
            .clone()
            .unwrap_or_else(|| from.email.to_string());

        let builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?,
            SmtpSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            }
        };
        let mailer = builder
            .port(config.port)
            .credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        debug!(server = %config.server, port = config.port, "SMTP transport ready");
        Ok(Self {
            mailer,
            from,
            to,
            display_tz,
        })
    }

    /// Renders `event` into a plain-text email.
    pub fn build_message(&self, event: &SignalEvent) -> Result<Message, NotifyError> {
        let alert = format_alert(event, self.display_tz);
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body)?;
        Ok(message)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_alert(&self, event: &SignalEvent) -> Result<(), NotifyError> {
        let message = self.build_message(event)?;
        self.mailer.send(message).await?;
        info!(to = %self.to, symbol = %event.symbol, "alert email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serial_test::serial;

    use super::*;
    use crate::detector::Signal;

    fn smtp_cfg() -> SmtpCfg {
        SmtpCfg {
            server: "smtp.example.com".into(),
            port: 465,
            security: SmtpSecurity::Tls,
            from: "Alerts <alerts@example.com>".into(),
            to: "trader@example.com".into(),
            username: None,
            password_env: "MA_CROSS_TEST_SMTP_PASSWORD".into(),
            timeout_secs: 10,
        }
    }

    fn event() -> SignalEvent {
        SignalEvent {
            symbol: "IF2506.CFX".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 20, 6, 45, 0).unwrap(),
            price: 3950.4,
            short_ma: 3948.12,
            long_ma: 3941.7,
            direction: Signal::UpwardCross,
        }
    }

    #[test]
    #[serial]
    fn missing_password_is_reported() {
        unsafe { std::env::remove_var("MA_CROSS_TEST_SMTP_PASSWORD") };
        let err = SmtpNotifier::from_config(&smtp_cfg(), chrono_tz::Asia::Shanghai)
            .err()
            .expect("password should be required");
        assert!(matches!(err, NotifyError::MissingSecret(_)));
    }

    #[tokio::test]
    async fn message_carries_alert_text() {
        let notifier = SmtpNotifier::with_password(
            &smtp_cfg(),
            chrono_tz::Asia::Shanghai,
            SecretString::new("hunter2".into()),
        )
        .unwrap();

        let message = notifier.build_message(&event()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: [MA signal] IF2506.CFX - Golden cross"));
        assert!(raw.contains("To: trader@example.com"));
        assert!(raw.contains("Signal time: 2025-03-20 14:45"));
        assert!(raw.contains("Price: 3950.40"));
    }

    #[test]
    fn bad_recipient_is_rejected() {
        let cfg = SmtpCfg {
            to: "not an address".into(),
            ..smtp_cfg()
        };
        let err = SmtpNotifier::with_password(
            &cfg,
            chrono_tz::UTC,
            SecretString::new("hunter2".into()),
        )
        .err()
        .expect("recipient should be rejected");
        assert!(matches!(err, NotifyError::Address { .. }));
    }
}
