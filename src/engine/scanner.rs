use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Settings;
use crate::detector::{Alert, SignalDetector};
use crate::errors::{AppResult, ScanError};
use crate::marketdata::{MarketDataProvider, Timeframe, fetch_with_retry};
use crate::notify::AlertFeed;

/// What to scan and how often.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub candle_limit: usize,
    pub retry_delay: Duration,
    pub interval: Duration,
    pub backoff: Duration,
}

impl ScanPlan {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            symbols: settings.scanner.symbols.clone(),
            timeframes: settings.scanner.timeframes.clone(),
            candle_limit: settings.exchange.candle_limit,
            retry_delay: settings.exchange.retry_delay(),
            interval: settings.scanner.interval(),
            backoff: settings.scanner.backoff(),
        }
    }

    pub fn pair_count(&self) -> usize {
        self.symbols.len() * self.timeframes.len()
    }
}

#[derive(Debug)]
pub struct PairOutcome {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub result: Result<Option<Alert>, ScanError>,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub outcomes: Vec<PairOutcome>,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().and_then(Option::as_ref))
    }

    pub fn failures(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

pub struct Scanner {
    provider: Arc<dyn MarketDataProvider>,
    detector: Arc<SignalDetector>,
    feed: AlertFeed,
    plan: ScanPlan,
}

impl Scanner {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        detector: Arc<SignalDetector>,
        feed: AlertFeed,
        plan: ScanPlan,
    ) -> Self {
        Self {
            provider,
            detector,
            feed,
            plan,
        }
    }

    pub async fn scan_pair(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<Alert>, ScanError> {
        let candles = fetch_with_retry(
            self.provider.as_ref(),
            symbol,
            timeframe,
            self.plan.candle_limit,
            self.plan.retry_delay,
        )
        .await?;
        self.detector.evaluate(symbol, timeframe, &candles)
    }

    /// One pass over symbols x timeframes in configured order. Per-pair failures,
    /// panics included, are logged and recorded; they never end the sweep.
    #[instrument(skip_all, fields(pairs = self.plan.pair_count()))]
    pub async fn sweep(&self) -> SweepReport {
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(self.plan.pair_count());

        for symbol in &self.plan.symbols {
            for &timeframe in &self.plan.timeframes {
                let result = match AssertUnwindSafe(self.scan_pair(symbol, timeframe))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(panic) => Err(ScanError::Panicked(panic_message(panic.as_ref()))),
                };
                match &result {
                    Ok(Some(alert)) => {
                        self.feed.publish(alert.clone());
                    }
                    Ok(None) => debug!(symbol = %symbol, %timeframe, "no new signal"),
                    Err(err @ ScanError::InsufficientData { .. }) => {
                        debug!(symbol = %symbol, %timeframe, error = %err, "pair skipped");
                    }
                    Err(err @ ScanError::Panicked(_)) => {
                        error!(symbol = %symbol, %timeframe, error = %err, "pair skipped");
                    }
                    Err(err) => {
                        warn!(symbol = %symbol, %timeframe, error = %err, "pair skipped");
                    }
                }
                outcomes.push(PairOutcome {
                    symbol: symbol.clone(),
                    timeframe,
                    result,
                });
            }
        }

        SweepReport {
            outcomes,
            elapsed: started.elapsed(),
        }
    }

    /// Sweeps forever.
    pub async fn run(self) -> AppResult<()> {
        info!(
            symbols = self.plan.symbols.len(),
            timeframes = self.plan.timeframes.len(),
            policy = self.detector.policy_id(),
            interval_secs = self.plan.interval.as_secs(),
            "scanner started"
        );
        pace(self.plan.interval, self.plan.backoff, || self.sweep()).await
    }
}

/// Drives `sweep` in a loop: `interval` after a completed sweep, `backoff` after
/// one that panicked past the per-pair guard.
async fn pace<F, Fut>(interval: Duration, backoff: Duration, mut sweep: F) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SweepReport>,
{
    loop {
        let pause = match AssertUnwindSafe(sweep()).catch_unwind().await {
            Ok(report) => {
                info!(
                    pairs = report.outcomes.len(),
                    alerts = report.alerts().count(),
                    failures = report.failures().count(),
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "sweep complete"
                );
                interval
            }
            Err(panic) => {
                error!(
                    reason = %panic_message(panic.as_ref()),
                    backoff_secs = backoff.as_secs(),
                    "sweep aborted"
                );
                backoff
            }
        };
        tokio::time::sleep(pause).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
