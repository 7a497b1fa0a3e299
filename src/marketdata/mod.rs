pub mod binance;
pub mod candles;
pub mod provider;

pub use binance::BinanceClient;
pub use candles::{Candle, Timeframe, normalize_symbol};
pub use provider::{MarketDataProvider, fetch_with_retry};
