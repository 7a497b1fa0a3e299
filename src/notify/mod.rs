mod dispatcher;
mod feed;
pub mod format;
mod log_transport;
mod recipients;
pub mod telegram;

pub use dispatcher::{DeliveryReport, Dispatcher};
pub use feed::AlertFeed;
pub use log_transport::LogTransport;
pub use recipients::Recipients;
pub use telegram::TelegramClient;

use async_trait::async_trait;

use crate::errors::DispatchError;

/// Inbound chat message. `chat_id`/`text` are absent for non-text updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUpdate {
    pub update_id: i64,
    pub chat_id: Option<i64>,
    pub text: Option<String>,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DispatchError>;

    /// Long-polls for updates with an id of at least `offset`.
    async fn poll_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>, DispatchError>;

    fn receives_updates(&self) -> bool {
        true
    }

    /// Called instead of `send_message` when there is no recipient. Returns true
    /// if the transport kept the message anyway.
    fn record_undelivered(&self, _text: &str) -> bool {
        false
    }
}
