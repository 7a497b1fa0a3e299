use crate::detector::{Classification, Side, SignalPolicy};
use crate::indicators::IndicatorSample;

/// Snapshot rule: MACD above its signal with a positive histogram is a BUY,
/// below with a negative histogram is a SELL. Re-qualifies every scan while it holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumPolicy;

impl SignalPolicy for MomentumPolicy {
    fn id(&self) -> &'static str {
        "momentum"
    }

    fn classify(
        &self,
        _previous: Option<&IndicatorSample>,
        current: &IndicatorSample,
    ) -> Option<Classification> {
        if current.macd > current.signal && current.histogram > 0.0 {
            Some(Classification::new(
                Side::Buy,
                "MACD above signal, histogram > 0 (bullish momentum).",
            ))
        } else if current.macd < current.signal && current.histogram < 0.0 {
            Some(Classification::new(
                Side::Sell,
                "MACD below signal, histogram < 0 (bearish momentum).",
            ))
        } else {
            None
        }
    }
}
