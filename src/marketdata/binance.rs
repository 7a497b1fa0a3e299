use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ExchangeConfig;
use crate::errors::{AppResult, FetchError};
use crate::marketdata::{Candle, MarketDataProvider, Timeframe};

const KLINES_PATH: &str = "/api/v3/klines";

/// Public market data client for the Binance spot REST API. No API key needed.
#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    name: String,
    base_url: String,
}

impl BinanceClient {
    pub fn new(cfg: &ExchangeConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("macdbot/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self {
            http,
            name: cfg.name.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn market_id(symbol: &str) -> String {
        symbol.replace('/', "").to_uppercase()
    }

    fn classify_status(status: StatusCode, body: &str) -> FetchError {
        let msg = format!("HTTP {status}: {}", truncate(body, 200));
        if status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.as_u16() == 418
        {
            FetchError::TransientNetwork(msg)
        } else {
            FetchError::PermanentExchange(msg)
        }
    }
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(exchange = %self.name))]
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        let url = format!("{}{KLINES_PATH}", self.base_url);
        let market = Self::market_id(symbol);
        let limit = limit.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("symbol", market.as_str()),
                ("interval", timeframe.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::TransientNetwork(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::TransientNetwork(e.to_string()))?;
        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        let candles = parse_klines(&body)?;
        debug!(count = candles.len(), "klines received");
        Ok(candles)
    }
}

/// Decodes the kline array payload:
/// `[[openTime, "open", "high", "low", "close", "volume", closeTime, ...], ...]`.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>, FetchError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| FetchError::PermanentExchange(format!("malformed klines payload: {e}")))?;

    let mut candles: Vec<Candle> = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < 6 {
            return Err(FetchError::PermanentExchange(format!(
                "kline row has {} fields, expected at least 6",
                row.len()
            )));
        }
        let open_ms = row[0]
            .as_i64()
            .ok_or_else(|| FetchError::PermanentExchange("kline open time is not an integer".into()))?;
        let timestamp = Utc
            .timestamp_millis_opt(open_ms)
            .single()
            .ok_or_else(|| FetchError::PermanentExchange(format!("invalid timestamp {open_ms}")))?;

        let candle = Candle {
            timestamp,
            open: number(&row[1], "open")?,
            high: number(&row[2], "high")?,
            low: number(&row[3], "low")?,
            close: number(&row[4], "close")?,
            volume: number(&row[5], "volume")?,
        };

        // Keep the window strictly ordered with unique open times.
        match candles.last_mut() {
            Some(last) if last.timestamp == candle.timestamp => *last = candle,
            Some(last) if last.timestamp > candle.timestamp => {
                return Err(FetchError::PermanentExchange(
                    "klines are not ordered by open time".into(),
                ));
            }
            _ => candles.push(candle),
        }
    }
    Ok(candles)
}

fn number(value: &Value, field: &str) -> Result<f64, FetchError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| FetchError::PermanentExchange(format!("invalid {field} value: {value}")))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        [1700000000000, "100.0", "110.5", "95.25", "105.0", "12.5", 1700003599999, "0", 10, "0", "0", "0"],
        [1700003600000, "105.0", "107.0", "101.0", "102.75", "8", 1700007199999, "0", 4, "0", "0", "0"]
    ]"#;

    #[test]
    fn parses_kline_rows() {
        let candles = parse_klines(SAMPLE).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(candles[0].high, 110.5);
        assert_eq!(candles[1].close, 102.75);
        assert_eq!(candles[1].volume, 8.0);
    }

    #[test]
    fn malformed_payload_is_permanent() {
        let err = parse_klines(r#"{"code":-1121,"msg":"Invalid symbol."}"#).unwrap_err();
        assert!(matches!(err, FetchError::PermanentExchange(_)));

        let err = parse_klines(r#"[[1700000000000, "1", "2"]]"#).unwrap_err();
        assert!(matches!(err, FetchError::PermanentExchange(_)));
    }

    #[test]
    fn duplicate_open_time_keeps_latest_row() {
        let body = r#"[
            [1700000000000, "1", "1", "1", "1", "1"],
            [1700000000000, "2", "2", "2", "2", "2"]
        ]"#;
        let candles = parse_klines(body).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 2.0);
    }

    #[test]
    fn status_classification() {
        assert!(BinanceClient::classify_status(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(BinanceClient::classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(!BinanceClient::classify_status(StatusCode::BAD_REQUEST, "bad symbol").is_transient());
    }

    #[test]
    fn market_id_strips_slash() {
        assert_eq!(BinanceClient::market_id("btc/usdt"), "BTCUSDT");
    }
}
