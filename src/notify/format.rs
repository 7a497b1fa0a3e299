use crate::detector::{Alert, Inspection, Side};
use crate::marketdata::Timeframe;
use crate::utils::time::{format_utc, now};

/// Escapes the legacy Markdown entity characters so echoed text cannot break
/// message parsing.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn alert_message(alert: &Alert, exchange: &str) -> String {
    format!(
        "🚨 *CRYPTO MACD Signal*\n\n\
         Exchange: *{exchange}*\n\
         Pair: *{symbol}*\n\
         Timeframe: *{timeframe}*\n\
         Signal: *{side}*\n\n\
         Price: `{price:.5}`\n\
         MACD: `{macd:.6}`\n\
         Signal: `{signal:.6}`\n\
         Histogram: `{histogram:.6}`\n\
         Candle time: {candle_time}\n\
         Reason: {reason}\n\
         Generated: {generated}",
        exchange = escape_markdown(exchange),
        symbol = escape_markdown(&alert.symbol),
        timeframe = alert.timeframe,
        side = alert.side,
        price = alert.price,
        macd = alert.macd,
        signal = alert.signal,
        histogram = alert.histogram,
        candle_time = format_utc(&alert.candle_time),
        reason = alert.reason,
        generated = format_utc(&alert.generated_at),
    )
}

fn joined(timeframes: &[Timeframe]) -> String {
    timeframes
        .iter()
        .map(Timeframe::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn welcome(symbols: &[String], timeframes: &[Timeframe], policy: &str) -> String {
    format!(
        "👋 *Crypto MACD Signal Bot*\n\n\
         Auto-signal MACD 12,26,9 (`{policy}` policy) for:\n\
         Pairs: {pairs}\n\
         Timeframes: {tfs}\n\n\
         Quick MACD check: `/tf <timeframe> <symbol>`, e.g. `/tf 1h BTCUSDT`\n\
         Supported timeframes: `{supported}`\n\n\
         BUY/SELL signals will be sent to this chat. Send /stop to unsubscribe.",
        pairs = escape_markdown(&symbols.join(", ")),
        tfs = joined(timeframes),
        supported = Timeframe::supported_list(),
    )
}

pub fn pairs(symbols: &[String], timeframes: &[Timeframe]) -> String {
    let tfs = joined(timeframes);
    let lines: Vec<String> = symbols
        .iter()
        .map(|s| format!("- {} @ {tfs}", escape_markdown(s)))
        .collect();
    format!(
        "📊 *Monitored pairs:*\n{}\n\nFor a manual check use: `/tf <timeframe> <symbol>`",
        lines.join("\n")
    )
}

pub fn usage() -> String {
    format!(
        "Usage:\n\
         `/start` subscribe to signals\n\
         `/stop` unsubscribe\n\
         `/pairs` or `CRYPTO` list monitored pairs\n\
         `/tf <timeframe> <symbol>` MACD snapshot, e.g. `/tf 1h BTCUSDT`\n\n\
         Timeframes: `{}`",
        Timeframe::supported_list()
    )
}

pub fn stopped() -> String {
    "🔕 You will no longer receive signals. Send /start to subscribe again.".to_string()
}

pub fn inspection(
    symbol: &str,
    timeframe: Timeframe,
    exchange: &str,
    inspection: &Inspection,
    last_emitted: Option<Side>,
) -> String {
    let current = inspection
        .classification
        .map(|c| format!("*{}* ({})", c.side, c.reason))
        .unwrap_or_else(|| "none".to_string());
    let last = last_emitted
        .map(|side| side.as_str())
        .unwrap_or("none");
    format!(
        "📈 *{symbol} - {timeframe}* ({exchange})\n\n\
         Price: `{price:.5}`\n\
         MACD: `{macd:.6}`\n\
         Signal: `{signal:.6}`\n\
         Histogram: `{histogram:.6}`\n\
         Candle time: {candle_time}\n\
         Current signal: {current}\n\
         Last alert sent: {last}\n\
         Checked: {checked}",
        symbol = escape_markdown(symbol),
        exchange = escape_markdown(exchange),
        price = inspection.price,
        macd = inspection.sample.macd,
        signal = inspection.sample.signal,
        histogram = inspection.sample.histogram,
        candle_time = format_utc(&inspection.candle_time),
        checked = format_utc(&now()),
    )
}

pub fn failure(symbol: &str, timeframe: Timeframe, reason: &str) -> String {
    format!(
        "⚠️ Could not compute MACD for {} {timeframe}: {}",
        escape_markdown(symbol),
        escape_markdown(reason)
    )
}
