use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::NotifierConfig;
use crate::errors::{AppResult, DispatchError};
use crate::notify::{ChatTransport, ChatUpdate};

/// Telegram Bot API client: sendMessage for alerts, getUpdates long polling for commands.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    endpoint: String,
    poll_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl TelegramClient {
    pub fn new(cfg: &NotifierConfig, token: &str) -> AppResult<Self> {
        // getUpdates holds the request open for poll_timeout_secs
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{token}", cfg.api_base.trim_end_matches('/')),
            poll_timeout_secs: cfg.poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.endpoint)
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Option<T>, DispatchError> {
        let status = resp.status();
        let body: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| DispatchError::Transport(e.without_url().to_string()))?;
        if body.ok {
            Ok(body.result)
        } else {
            Err(DispatchError::Rejected {
                code: body.error_code.unwrap_or(i64::from(status.as_u16())),
                description: body.description.unwrap_or_else(|| status.to_string()),
            })
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    fn name(&self) -> &'static str {
        "telegram"
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.without_url().to_string()))?;
        Self::decode::<serde_json::Value>(resp).await.map(|_| ())
    }

    async fn poll_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>, DispatchError> {
        let mut query = vec![
            ("timeout", self.poll_timeout_secs.to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let resp = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&query)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.without_url().to_string()))?;

        let updates: Vec<Update> = Self::decode(resp).await?.unwrap_or_default();
        debug!(count = updates.len(), "updates received");
        Ok(updates.into_iter().map(ChatUpdate::from).collect())
    }
}

impl From<Update> for ChatUpdate {
    fn from(update: Update) -> Self {
        let (chat_id, text) = match update.message {
            Some(message) => (Some(message.chat.id), message.text),
            None => (None, None),
        };
        ChatUpdate {
            update_id: update.update_id,
            chat_id,
            text,
        }
    }
}
