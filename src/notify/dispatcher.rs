use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{info, instrument, warn};

use crate::detector::Alert;
use crate::errors::{AppResult, DispatchError};
use crate::notify::{ChatTransport, Recipients, format};

#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<i64>,
    pub dropped: Vec<(i64, DispatchError)>,
    /// No recipient was active but the transport kept the message.
    pub recorded: bool,
}

/// Best-effort fan-out of messages to every active recipient.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    recipients: Arc<Recipients>,
    exchange: String,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        recipients: Arc<Recipients>,
        exchange: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            recipients,
            exchange: exchange.into(),
        }
    }

    /// Sends `text` to all recipients. A recipient whose delivery fails is removed
    /// from the active set; the others are unaffected.
    pub async fn deliver(&self, text: &str) -> DeliveryReport {
        let targets = self.recipients.snapshot();
        if targets.is_empty() {
            let recorded = self.transport.record_undelivered(text);
            if !recorded {
                info!("no active recipients, message not delivered");
            }
            return DeliveryReport {
                recorded,
                ..Default::default()
            };
        }

        let transport = self.transport.as_ref();
        let results = join_all(targets.into_iter().map(|chat_id| async move {
            (chat_id, transport.send_message(chat_id, text).await)
        }))
        .await;

        let mut report = DeliveryReport::default();
        for (chat_id, result) in results {
            match result {
                Ok(()) => report.delivered.push(chat_id),
                Err(err) => {
                    warn!(
                        chat_id,
                        transport = self.transport.name(),
                        error = %err,
                        "delivery failed, dropping recipient"
                    );
                    self.recipients.remove(chat_id);
                    report.dropped.push((chat_id, err));
                }
            }
        }
        report
    }

    pub async fn dispatch_alert(&self, alert: &Alert) -> DeliveryReport {
        let text = format::alert_message(alert, &self.exchange);
        let report = self.deliver(&text).await;
        info!(
            alert_id = %alert.id,
            symbol = %alert.symbol,
            timeframe = %alert.timeframe,
            side = %alert.side,
            delivered = report.delivered.len(),
            dropped = report.dropped.len(),
            recorded = report.recorded,
            "alert dispatched"
        );
        report
    }

    /// Consumes alerts until the feed closes.
    #[instrument(skip_all)]
    pub async fn run(self, alerts: broadcast::Receiver<Alert>) -> AppResult<()> {
        let mut stream = BroadcastStream::new(alerts);
        info!(transport = self.transport.name(), "dispatcher started");
        while let Some(item) = stream.next().await {
            match item {
                Ok(alert) => {
                    self.dispatch_alert(&alert).await;
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "dispatcher lagged, alerts skipped");
                }
            }
        }
        info!("alert feed closed, dispatcher stopping");
        Ok(())
    }
}
