use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detector::Side;
use crate::indicators::IndicatorSample;
use crate::marketdata::Timeframe;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub side: Side,
    pub reason: String,
    pub price: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub candle_time: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        symbol: &str,
        timeframe: Timeframe,
        side: Side,
        reason: &str,
        price: f64,
        sample: &IndicatorSample,
        candle_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            timeframe,
            side,
            reason: reason.to_string(),
            price,
            macd: sample.macd,
            signal: sample.signal,
            histogram: sample.histogram,
            candle_time,
            generated_at: Utc::now(),
        }
    }
}
