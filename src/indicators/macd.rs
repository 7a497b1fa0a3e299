use crate::config::IndicatorConfig;
use crate::indicators::{ExponentialMovingAverage, IndicatorEngine, IndicatorSample, MacdSeries};

/// MACD(fast, slow, signal) over closing prices. The MACD line starts once the
/// slow EMA is seeded; the signal line is an EMA of the MACD line.
#[derive(Debug, Clone)]
pub struct MacdEngine {
    fast: usize,
    slow: usize,
    signal: usize,
    min_candles: usize,
}

impl MacdEngine {
    pub fn new(fast: usize, slow: usize, signal: usize, min_candles: usize) -> Self {
        Self {
            fast,
            slow,
            signal,
            min_candles,
        }
    }

    pub fn from_config(cfg: &IndicatorConfig) -> Self {
        Self::new(
            cfg.fast_period,
            cfg.slow_period,
            cfg.signal_period,
            cfg.min_candles,
        )
    }

    /// Index of the first candle that carries a full sample.
    pub fn warmup_len(&self) -> usize {
        self.slow.max(1) + self.signal.max(1) - 1
    }
}

impl Default for MacdEngine {
    fn default() -> Self {
        Self::from_config(&IndicatorConfig::default())
    }
}

impl IndicatorEngine for MacdEngine {
    fn id(&self) -> &'static str {
        "macd"
    }

    fn min_candles(&self) -> usize {
        self.min_candles.max(self.warmup_len())
    }

    fn compute(&self, closes: &[f64]) -> Option<MacdSeries> {
        if closes.len() < self.warmup_len() {
            return None;
        }

        let mut fast = ExponentialMovingAverage::new(self.fast);
        let mut slow = ExponentialMovingAverage::new(self.slow);
        let mut signal = ExponentialMovingAverage::new(self.signal);

        let samples = closes
            .iter()
            .map(|&close| {
                let fast_value = fast.update(close);
                let slow_value = slow.update(close);
                let (Some(f), Some(s)) = (fast_value, slow_value) else {
                    return None;
                };
                let line = f - s;
                signal.update(line).map(|sig| IndicatorSample::new(line, sig))
            })
            .collect();

        Some(MacdSeries::new(samples))
    }
}
