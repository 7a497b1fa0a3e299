#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;

use macdbot::detector::crossing::CrossingPolicy;
use macdbot::detector::{SignalDetector, SignalState};
use macdbot::engine::ScanPlan;
use macdbot::errors::{DispatchError, FetchError};
use macdbot::indicators::{IndicatorEngine, MacdEngine};
use macdbot::marketdata::{Candle, MarketDataProvider, Timeframe};
use macdbot::notify::{ChatTransport, ChatUpdate};

type Key = (String, Timeframe);

/// Serves fixed candle windows per pair; scripted failures are consumed first.
#[derive(Default)]
pub struct FakeExchange {
    windows: HashMap<Key, Vec<Candle>>,
    failures: Mutex<HashMap<Key, Vec<FetchError>>>,
    pub calls: AtomicUsize,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeExchange {
    pub fn with_window(mut self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.windows.insert((symbol.to_string(), timeframe), candles);
        self
    }

    pub fn failing(self, symbol: &str, timeframe: Timeframe, errors: Vec<FetchError>) -> Self {
        self.failures
            .lock()
            .insert((symbol.to_string(), timeframe), errors);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for FakeExchange {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        _limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().push(symbol.to_string());
        let key = (symbol.to_string(), timeframe);
        if let Some(queue) = self.failures.lock().get_mut(&key) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        self.windows
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::PermanentExchange(format!("unknown market {symbol}")))
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        self.sent.lock().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn poll_updates(&self, _offset: Option<i64>) -> Result<Vec<ChatUpdate>, DispatchError> {
        Ok(Vec::new())
    }
}

/// MACD that panics on one specific window length.
pub struct PanicsOnLength {
    pub inner: MacdEngine,
    pub len: usize,
}

impl IndicatorEngine for PanicsOnLength {
    fn id(&self) -> &'static str {
        "macd"
    }

    fn min_candles(&self) -> usize {
        self.inner.min_candles()
    }

    fn compute(&self, closes: &[f64]) -> Option<macdbot::indicators::MacdSeries> {
        if closes.len() == self.len {
            panic!("indicator failed on {} closes", closes.len());
        }
        self.inner.compute(closes)
    }
}

pub fn to_candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: start + ChronoDuration::hours(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        })
        .collect()
}

/// A 200-bar window whose final bar is the first golden cross: an accelerating
/// decline followed by a steady rally.
pub fn golden_cross_window() -> Vec<Candle> {
    let prices: Vec<f64> = (0..320)
        .map(|i| {
            if i < 250 {
                200.0 - 0.001 * (i * i) as f64
            } else {
                137.5 + 1.5 * (i - 249) as f64
            }
        })
        .collect();

    let engine = MacdEngine::default();
    for end in 199..prices.len() {
        let window = &prices[end - 199..=end];
        let series = engine.compute(window).unwrap();
        let (Some(prev), Some(cur)) = (series.get(198), series.get(199)) else {
            continue;
        };
        if prev.macd <= prev.signal && cur.macd > cur.signal {
            return to_candles(window);
        }
    }
    panic!("price path never produced a golden cross");
}

pub fn flat_window(len: usize) -> Vec<Candle> {
    to_candles(&vec![50.0; len])
}

pub fn plan(symbols: &[&str], timeframes: &[Timeframe]) -> ScanPlan {
    ScanPlan {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        timeframes: timeframes.to_vec(),
        candle_limit: 200,
        retry_delay: Duration::ZERO,
        interval: Duration::from_millis(10),
        backoff: Duration::from_millis(10),
    }
}

pub fn detector_with(engine: Arc<dyn IndicatorEngine>) -> Arc<SignalDetector> {
    Arc::new(SignalDetector::new(
        engine,
        Box::new(CrossingPolicy),
        Arc::new(SignalState::new()),
    ))
}

pub fn detector() -> Arc<SignalDetector> {
    detector_with(Arc::new(MacdEngine::default()))
}
