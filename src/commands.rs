//! Inbound chat commands: subscription management and on-demand MACD checks.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::detector::SignalDetector;
use crate::engine::scanner::ScanPlan;
use crate::errors::AppResult;
use crate::marketdata::{MarketDataProvider, Timeframe, fetch_with_retry, normalize_symbol};
use crate::notify::{ChatTransport, Recipients, format};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Pairs,
    Help,
    Chart { symbol: String, timeframe: Timeframe },
    /// Recognised command with bad arguments; carries the reply.
    Invalid(String),
}

/// Parses a chat message. Returns `None` for text that is not a command.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("crypto") {
        return Some(Command::Pairs);
    }
    if !text.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    // "/tf@SomeBot" in group chats
    let name = parts[0].split('@').next().unwrap_or_default().to_lowercase();
    match name.as_str() {
        "/start" => Some(Command::Start),
        "/stop" => Some(Command::Stop),
        "/pairs" => Some(Command::Pairs),
        "/help" => Some(Command::Help),
        "/tf" => Some(parse_chart(&parts[1..])),
        _ => None,
    }
}

fn parse_chart(args: &[&str]) -> Command {
    let [timeframe, symbol] = args else {
        return Command::Invalid(
            "Wrong format. Examples:\n`/tf 1h BTCUSDT`\n`/tf 30m ETHUSDT`".to_string(),
        );
    };
    match timeframe.parse::<Timeframe>() {
        Ok(timeframe) => Command::Chart {
            symbol: normalize_symbol(symbol),
            timeframe,
        },
        Err(err) => Command::Invalid(format!(
            "{}. Supported: `{}`",
            format::escape_markdown(&err),
            Timeframe::supported_list()
        )),
    }
}

pub struct CommandListener {
    transport: Arc<dyn ChatTransport>,
    recipients: Arc<Recipients>,
    provider: Arc<dyn MarketDataProvider>,
    detector: Arc<SignalDetector>,
    plan: ScanPlan,
}

impl CommandListener {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        recipients: Arc<Recipients>,
        provider: Arc<dyn MarketDataProvider>,
        detector: Arc<SignalDetector>,
        plan: ScanPlan,
    ) -> Self {
        Self {
            transport,
            recipients,
            provider,
            detector,
            plan,
        }
    }

    /// Applies a command and returns the reply text.
    #[instrument(skip(self))]
    pub async fn handle(&self, chat_id: i64, command: Command) -> String {
        match command {
            Command::Start => {
                if self.recipients.register(chat_id) {
                    info!(chat_id, recipients = self.recipients.len(), "recipient registered");
                }
                format::welcome(
                    &self.plan.symbols,
                    &self.plan.timeframes,
                    self.detector.policy_id(),
                )
            }
            Command::Stop => {
                if self.recipients.remove(chat_id) {
                    info!(chat_id, "recipient removed");
                }
                format::stopped()
            }
            Command::Pairs => format::pairs(&self.plan.symbols, &self.plan.timeframes),
            Command::Help => format::usage(),
            Command::Chart { symbol, timeframe } => self.snapshot(&symbol, timeframe).await,
            Command::Invalid(reply) => reply,
        }
    }

    async fn snapshot(&self, symbol: &str, timeframe: Timeframe) -> String {
        let candles = match fetch_with_retry(
            self.provider.as_ref(),
            symbol,
            timeframe,
            self.plan.candle_limit,
            self.plan.retry_delay,
        )
        .await
        {
            Ok(candles) => candles,
            Err(err) => return format::failure(symbol, timeframe, &err.to_string()),
        };

        match self.detector.inspect(&candles) {
            Ok(inspection) => format::inspection(
                symbol,
                timeframe,
                self.provider.name(),
                &inspection,
                self.detector.state().get(symbol, timeframe),
            ),
            Err(err) => format::failure(symbol, timeframe, &err.to_string()),
        }
    }

    pub async fn run(self) -> AppResult<()> {
        info!(transport = self.transport.name(), "command listener started");
        let mut offset: Option<i64> = None;
        loop {
            let updates = match self.transport.poll_updates(offset).await {
                Ok(updates) => updates,
                Err(err) => {
                    warn!(error = %err, "polling updates failed");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let (Some(chat_id), Some(text)) = (update.chat_id, update.text.as_deref()) else {
                    continue;
                };
                let Some(command) = parse(text) else {
                    debug!(chat_id, "ignoring non-command message");
                    continue;
                };
                let reply = self.handle(chat_id, command).await;
                if let Err(err) = self.transport.send_message(chat_id, &reply).await {
                    warn!(chat_id, error = %err, "reply failed");
                }
            }
        }
    }
}
