//! MACD cross detection and per-pair de-duplication.
//!
//! A [`SignalPolicy`] classifies the latest indicator readings into a [`Side`];
//! [`SignalDetector`] turns a classification into an [`Alert`] only when the side
//! differs from the one last emitted for the same (symbol, timeframe).

mod alert;
pub mod crossing;
mod evaluator;
pub mod momentum;
pub mod registry;
mod state;

pub use alert::Alert;
pub use evaluator::{Inspection, SignalDetector};
pub use registry::PolicyRegistry;
pub use state::{PairKey, SignalState};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub side: Side,
    pub reason: &'static str,
}

impl Classification {
    pub fn new(side: Side, reason: &'static str) -> Self {
        Self { side, reason }
    }
}

/// Decision rule over the two most recent indicator samples of a pair.
pub trait SignalPolicy: Send + Sync {
    fn id(&self) -> &'static str;

    fn classify(
        &self,
        previous: Option<&IndicatorSample>,
        current: &IndicatorSample,
    ) -> Option<Classification>;
}
