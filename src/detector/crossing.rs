use crate::detector::{Classification, Side, SignalPolicy};
use crate::indicators::IndicatorSample;

/// Two-sample rule: fires only on the bar where the MACD line crosses its signal line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossingPolicy;

impl SignalPolicy for CrossingPolicy {
    fn id(&self) -> &'static str {
        "crossing"
    }

    fn classify(
        &self,
        previous: Option<&IndicatorSample>,
        current: &IndicatorSample,
    ) -> Option<Classification> {
        let prev = previous?;
        if prev.macd <= prev.signal && current.macd > current.signal {
            Some(Classification::new(
                Side::Buy,
                "MACD golden cross (MACD crossed above signal).",
            ))
        } else if prev.macd >= prev.signal && current.macd < current.signal {
            Some(Classification::new(
                Side::Sell,
                "MACD death cross (MACD crossed below signal).",
            ))
        } else {
            None
        }
    }
}
