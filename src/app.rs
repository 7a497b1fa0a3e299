use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{info, warn};

use crate::commands::CommandListener;
use crate::config::{Settings, TransportKind};
use crate::detector::{PolicyRegistry, SignalDetector, SignalState};
use crate::engine::{ScanPlan, Scanner};
use crate::errors::{AppError, AppResult};
use crate::indicators::{IndicatorEngine, MacdEngine};
use crate::marketdata::{BinanceClient, MarketDataProvider};
use crate::notify::{AlertFeed, ChatTransport, Dispatcher, LogTransport, Recipients, TelegramClient};
use crate::utils::secrets::resolve_secret;

pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn run(self) -> AppResult<()> {
        let provider: Arc<dyn MarketDataProvider> =
            Arc::new(BinanceClient::new(&self.settings.exchange)?);
        let engine: Arc<dyn IndicatorEngine> =
            Arc::new(MacdEngine::from_config(&self.settings.indicator));
        let policy = PolicyRegistry::with_builtins().build(&self.settings.scanner.policy)?;
        let state = Arc::new(SignalState::new());
        let detector = Arc::new(SignalDetector::new(engine, policy, state));

        let recipients = Arc::new(Recipients::new(
            self.settings.notifier.recipient_mode,
            self.settings.notifier.chat_ids.iter().copied(),
        ));
        let transport = self.build_transport()?;
        let plan = ScanPlan::from_settings(&self.settings);

        let feed = AlertFeed::default();
        let dispatcher = Dispatcher::new(
            transport.clone(),
            recipients.clone(),
            self.settings.exchange.name.clone(),
        );
        // subscribe before the scanner can publish
        let alert_rx = feed.subscribe();
        let scanner = Scanner::new(provider.clone(), detector.clone(), feed, plan.clone());

        info!(
            exchange = %self.settings.exchange.name,
            transport = transport.name(),
            recipients = recipients.len(),
            recipient_mode = ?recipients.mode(),
            pairs = %plan.symbols.join(","),
            timeframes = %plan.timeframes.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(","),
            "macdbot starting"
        );

        let listener = transport.receives_updates().then(|| {
            CommandListener::new(transport.clone(), recipients.clone(), provider, detector, plan)
        });

        let mut dispatch_task = tokio::spawn(dispatcher.run(alert_rx));
        let mut scan_task = tokio::spawn(scanner.run());
        let mut listen_task = tokio::spawn(async move {
            match listener {
                Some(listener) => listener.run().await,
                None => std::future::pending().await,
            }
        });

        tokio::select! {
            res = &mut scan_task => task_ended("scanner", res),
            res = &mut dispatch_task => task_ended("dispatcher", res),
            res = &mut listen_task => task_ended("command listener", res),
        }
    }

    fn build_transport(&self) -> AppResult<Arc<dyn ChatTransport>> {
        let notifier = &self.settings.notifier;
        match notifier.transport {
            TransportKind::Log => Ok(Arc::new(LogTransport)),
            TransportKind::Telegram => {
                let token = resolve_secret(
                    "notifier.bot_token",
                    notifier.bot_token.as_deref(),
                    notifier.bot_token_env.as_deref(),
                )?;
                Ok(Arc::new(TelegramClient::new(notifier, &token)?))
            }
        }
    }
}

fn task_ended(name: &str, res: Result<AppResult<()>, JoinError>) -> AppResult<()> {
    match res {
        Ok(Ok(())) => {
            warn!(task = name, "task exited");
            Err(AppError::Other(format!("{name} exited unexpectedly")))
        }
        Ok(Err(err)) => Err(err),
        Err(err) => Err(AppError::Other(format!("{name} task failed: {err}"))),
    }
}
