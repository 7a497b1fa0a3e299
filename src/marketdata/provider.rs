use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::FetchError;
use crate::marketdata::{Candle, Timeframe};

/// Source of candle windows, ordered oldest to newest.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError>;
}

/// Fetches once and, on a transient failure only, retries a single time after `delay`.
pub async fn fetch_with_retry(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
    delay: Duration,
) -> Result<Vec<Candle>, FetchError> {
    match provider.fetch_candles(symbol, timeframe, limit).await {
        Err(err) if err.is_transient() => {
            warn!(
                provider = provider.name(),
                symbol,
                %timeframe,
                error = %err,
                "candle fetch failed, retrying once"
            );
            tokio::time::sleep(delay).await;
            provider.fetch_candles(symbol, timeframe, limit).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use parking_lot::Mutex;

    use super::*;

    struct Scripted {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<Result<Vec<Candle>, FetchError>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Vec<Candle>, FetchError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _limit: usize,
        ) -> Result<Vec<Candle>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::PermanentExchange("script exhausted".into())))
        }
    }

    fn one_candle() -> Vec<Candle> {
        vec![Candle {
            timestamp: Utc::now(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        }]
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let provider = Scripted::new(vec![
            Err(FetchError::TransientNetwork("reset".into())),
            Ok(one_candle()),
        ]);
        let candles = fetch_with_retry(&provider, "BTC/USDT", Timeframe::H1, 200, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_is_returned() {
        let provider = Scripted::new(vec![
            Err(FetchError::TransientNetwork("reset".into())),
            Err(FetchError::TransientNetwork("timeout".into())),
            Ok(one_candle()),
        ]);
        let err = fetch_with_retry(&provider, "BTC/USDT", Timeframe::H1, 200, Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::TransientNetwork("timeout".into()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let provider = Scripted::new(vec![
            Err(FetchError::PermanentExchange("invalid symbol".into())),
            Ok(one_candle()),
        ]);
        let err = fetch_with_retry(&provider, "NOPE/USDT", Timeframe::M5, 200, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
