use async_trait::async_trait;
use chrono_tz::Tz;
use tracing::info;

use crate::{
    notifier::{NotifyError, Notifier, format_alert},
    signal::SignalEvent,
};

/// Writes the rendered alert to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    display_tz: Tz,
}

impl LogNotifier {
    pub fn new(display_tz: Tz) -> Self {
        Self { display_tz }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_alert(&self, event: &SignalEvent) -> Result<(), NotifyError> {
        let message = format_alert(event, self.display_tz);
        info!(subject = %message.subject, "dry run, alert not sent:\n{}", message.body);
        Ok(())
    }
}
