use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::detector::Side;
use crate::marketdata::Timeframe;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl PairKey {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }
}

/// Last emitted side per (symbol, timeframe). Lives for the process only.
#[derive(Debug, Default)]
pub struct SignalState {
    inner: DashMap<PairKey, Side>,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<Side> {
        self.inner
            .get(&PairKey::new(symbol, timeframe))
            .map(|entry| *entry.value())
    }

    /// Records `side` and returns true if it differs from the stored side.
    /// The check and the write happen under one entry lock.
    pub fn mark_if_changed(&self, symbol: &str, timeframe: Timeframe, side: Side) -> bool {
        match self.inner.entry(PairKey::new(symbol, timeframe)) {
            Entry::Occupied(mut slot) => {
                if *slot.get() == side {
                    false
                } else {
                    slot.insert(side);
                    true
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(side);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
