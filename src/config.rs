use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::indicators::{IndicatorEngine, MacdEngine};
use crate::marketdata::Timeframe;

const ENV_PREFIX: &str = "MACDBOT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "ExchangeConfig::default_name")]
    pub name: String,
    #[serde(default = "ExchangeConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ExchangeConfig::default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "ExchangeConfig::default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default = "ExchangeConfig::default_candle_limit")]
    pub candle_limit: usize,
}

impl ExchangeConfig {
    fn default_name() -> String {
        "Binance".to_string()
    }

    fn default_base_url() -> String {
        "https://api.binance.com".to_string()
    }

    fn default_request_timeout() -> u64 {
        10
    }

    fn default_retry_delay() -> u64 {
        2_000
    }

    fn default_candle_limit() -> usize {
        200
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            base_url: Self::default_base_url(),
            request_timeout_secs: Self::default_request_timeout(),
            retry_delay_ms: Self::default_retry_delay(),
            candle_limit: Self::default_candle_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "IndicatorConfig::default_fast")]
    pub fast_period: usize,
    #[serde(default = "IndicatorConfig::default_slow")]
    pub slow_period: usize,
    #[serde(default = "IndicatorConfig::default_signal")]
    pub signal_period: usize,
    #[serde(default = "IndicatorConfig::default_min_candles")]
    pub min_candles: usize,
}

impl IndicatorConfig {
    fn default_fast() -> usize {
        12
    }

    fn default_slow() -> usize {
        26
    }

    fn default_signal() -> usize {
        9
    }

    fn default_min_candles() -> usize {
        50
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_period: Self::default_fast(),
            slow_period: Self::default_slow(),
            signal_period: Self::default_signal(),
            min_candles: Self::default_min_candles(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "ScannerConfig::default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "ScannerConfig::default_timeframes")]
    pub timeframes: Vec<Timeframe>,
    #[serde(default = "ScannerConfig::default_policy")]
    pub policy: String,
    #[serde(default = "ScannerConfig::default_interval")]
    pub interval_secs: u64,
    #[serde(default = "ScannerConfig::default_interval")]
    pub backoff_secs: u64,
}

impl ScannerConfig {
    fn default_symbols() -> Vec<String> {
        [
            "BTC/USDT",
            "ETH/USDT",
            "SOL/USDT",
            "BNB/USDT",
            "PAXG/USDT",
            "XRP/USDT",
            "DOT/USDT",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn default_timeframes() -> Vec<Timeframe> {
        vec![
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::M30,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
        ]
    }

    fn default_policy() -> String {
        "crossing".to_string()
    }

    fn default_interval() -> u64 {
        60
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            symbols: Self::default_symbols(),
            timeframes: Self::default_timeframes(),
            policy: Self::default_policy(),
            interval_secs: Self::default_interval(),
            backoff_secs: Self::default_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Telegram,
    Log,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecipientMode {
    /// The most recent `/start` replaces every other recipient.
    #[default]
    Single,
    Multi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default = "NotifierConfig::default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "NotifierConfig::default_token_env")]
    pub bot_token_env: Option<String>,
    #[serde(default)]
    pub chat_ids: Vec<i64>,
    #[serde(default)]
    pub recipient_mode: RecipientMode,
    #[serde(default = "NotifierConfig::default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl NotifierConfig {
    fn default_api_base() -> String {
        "https://api.telegram.org".to_string()
    }

    fn default_token_env() -> Option<String> {
        Some("TELEGRAM_BOT_TOKEN".to_string())
    }

    fn default_poll_timeout() -> u64 {
        30
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            api_base: Self::default_api_base(),
            bot_token: None,
            bot_token_env: Self::default_token_env(),
            chat_ids: Vec::new(),
            recipient_mode: RecipientMode::default(),
            poll_timeout_secs: Self::default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub indicator: IndicatorConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Settings {
    pub fn load_from(path: impl AsRef<Path>) -> AppResult<Self> {
        let builder = Config::builder().add_source(File::from(path.as_ref()));
        Self::finish(builder)
    }

    pub fn from_toml(contents: &str) -> AppResult<Self> {
        let builder = Config::builder().add_source(File::from_str(contents, FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> AppResult<Self> {
        let cfg = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.scanner.symbols.is_empty() {
            return Err(AppError::Config("scanner.symbols must not be empty".into()));
        }
        if self.scanner.timeframes.is_empty() {
            return Err(AppError::Config(
                "scanner.timeframes must not be empty".into(),
            ));
        }
        let ind = &self.indicator;
        if ind.fast_period == 0 || ind.signal_period == 0 {
            return Err(AppError::Config("indicator periods must be > 0".into()));
        }
        if ind.fast_period >= ind.slow_period {
            return Err(AppError::Config(
                "indicator.fast_period must be < indicator.slow_period".into(),
            ));
        }
        let required = MacdEngine::from_config(ind).min_candles();
        if self.exchange.candle_limit < required {
            return Err(AppError::Config(format!(
                "exchange.candle_limit ({}) must cover the {} candles the indicator needs",
                self.exchange.candle_limit, required
            )));
        }
        Ok(())
    }
}
