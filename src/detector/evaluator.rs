use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::detector::{Alert, Classification, SignalPolicy, SignalState};
use crate::errors::ScanError;
use crate::indicators::{IndicatorEngine, IndicatorSample};
use crate::marketdata::{Candle, Timeframe};

/// Latest reading of a candle window, classified but not recorded.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub price: f64,
    pub candle_time: DateTime<Utc>,
    pub sample: IndicatorSample,
    pub classification: Option<Classification>,
}

pub struct SignalDetector {
    engine: Arc<dyn IndicatorEngine>,
    policy: Box<dyn SignalPolicy>,
    state: Arc<SignalState>,
}

impl SignalDetector {
    pub fn new(
        engine: Arc<dyn IndicatorEngine>,
        policy: Box<dyn SignalPolicy>,
        state: Arc<SignalState>,
    ) -> Self {
        Self {
            engine,
            policy,
            state,
        }
    }

    pub fn policy_id(&self) -> &'static str {
        self.policy.id()
    }

    pub fn state(&self) -> Arc<SignalState> {
        self.state.clone()
    }

    pub fn min_candles(&self) -> usize {
        self.engine.min_candles()
    }

    /// Computes the indicator and classifies the last two samples. Never touches
    /// the signal state.
    pub fn inspect(&self, candles: &[Candle]) -> Result<Inspection, ScanError> {
        let need = self.engine.min_candles();
        let insufficient = ScanError::InsufficientData {
            got: candles.len(),
            need,
        };
        let Some(last_candle) = candles.last() else {
            return Err(insufficient);
        };
        if candles.len() < need {
            return Err(insufficient);
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let series = self
            .engine
            .compute(&closes)
            .ok_or_else(|| insufficient.clone())?;
        let (previous, current) = series.latest_pair();
        let current = *current.ok_or(insufficient)?;

        Ok(Inspection {
            price: last_candle.close,
            candle_time: last_candle.timestamp,
            sample: current,
            classification: self.policy.classify(previous, &current),
        })
    }

    /// Classifies the window and returns an alert if the side changed since the
    /// last one emitted for this pair. The state is updated before returning.
    #[instrument(skip(self, candles), fields(policy = self.policy.id(), candles = candles.len()))]
    pub fn evaluate(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<Option<Alert>, ScanError> {
        let inspection = self.inspect(candles)?;
        let Some(classification) = inspection.classification else {
            return Ok(None);
        };

        if !self
            .state
            .mark_if_changed(symbol, timeframe, classification.side)
        {
            debug!(side = %classification.side, "signal unchanged, suppressed");
            return Ok(None);
        }

        let alert = Alert::new(
            symbol,
            timeframe,
            classification.side,
            classification.reason,
            inspection.price,
            &inspection.sample,
            inspection.candle_time,
        );
        info!(
            alert_id = %alert.id,
            side = %alert.side,
            price = alert.price,
            macd = alert.macd,
            signal = alert.signal,
            "signal emitted"
        );
        Ok(Some(alert))
    }
}
