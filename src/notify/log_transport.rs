use async_trait::async_trait;
use tracing::info;

use crate::errors::DispatchError;
use crate::notify::{ChatTransport, ChatUpdate};

/// Writes outgoing messages to the log. Used for dry runs without a bot token.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl ChatTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        info!(chat_id, message = %text, "outgoing message");
        Ok(())
    }

    async fn poll_updates(&self, _offset: Option<i64>) -> Result<Vec<ChatUpdate>, DispatchError> {
        Ok(Vec::new())
    }

    fn receives_updates(&self) -> bool {
        false
    }

    fn record_undelivered(&self, text: &str) -> bool {
        info!(message = %text, "message without recipients");
        true
    }
}
