use tokio::sync::broadcast;
use tracing::warn;

use crate::detector::Alert;

/// Fan-out channel between the scanner and the dispatcher.
#[derive(Clone)]
pub struct AlertFeed {
    tx: broadcast::Sender<Alert>,
}

impl AlertFeed {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers that will see the alert.
    pub fn publish(&self, alert: Alert) -> usize {
        match self.tx.send(alert) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(alert)) => {
                warn!(alert_id = %alert.id, symbol = %alert.symbol, "no alert subscribers, alert dropped");
                0
            }
        }
    }
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(256)
    }
}
