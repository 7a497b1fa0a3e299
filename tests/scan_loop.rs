mod common;

use std::sync::Arc;

use macdbot::config::RecipientMode;
use macdbot::detector::Side;
use macdbot::engine::Scanner;
use macdbot::errors::{FetchError, ScanError};
use macdbot::indicators::MacdEngine;
use macdbot::marketdata::Timeframe;
use macdbot::notify::{AlertFeed, Dispatcher, Recipients};

use common::{
    FakeExchange, PanicsOnLength, RecordingTransport, detector, detector_with, flat_window,
    golden_cross_window, plan,
};

#[tokio::test]
async fn golden_cross_on_last_bar_emits_one_buy() {
    let window = golden_cross_window();
    assert_eq!(window.len(), 200);
    let last_close = window[199].close;

    let provider = Arc::new(FakeExchange::default().with_window("BTC/USDT", Timeframe::H1, window));
    let detector = detector();
    let feed = AlertFeed::new(16);
    let mut rx = feed.subscribe();
    let scanner = Scanner::new(
        provider,
        detector.clone(),
        feed,
        plan(&["BTC/USDT"], &[Timeframe::H1]),
    );

    let report = scanner.sweep().await;
    let alerts: Vec<_> = report.alerts().collect();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].side, Side::Buy);
    assert_eq!(alerts[0].price, last_close);

    let published = rx.try_recv().expect("alert published to the feed");
    assert_eq!(published.id, alerts[0].id);
    assert_eq!(
        detector.state().get("BTC/USDT", Timeframe::H1),
        Some(Side::Buy)
    );

    // the same window on the next sweep is suppressed
    let report = scanner.sweep().await;
    assert_eq!(report.alerts().count(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failing_pair_does_not_abort_sweep() {
    let window = golden_cross_window();
    let mut provider = FakeExchange::default();
    for symbol in ["BTC/USDT", "ETH/USDT", "SOL/USDT"] {
        for tf in [Timeframe::M5, Timeframe::H1] {
            provider = provider.with_window(symbol, tf, window.clone());
        }
    }
    let provider = provider.failing(
        "ETH/USDT",
        Timeframe::M5,
        vec![FetchError::PermanentExchange("market closed".into())],
    );
    let provider = Arc::new(provider);

    let scanner = Scanner::new(
        provider.clone(),
        detector(),
        AlertFeed::new(16),
        plan(
            &["BTC/USDT", "ETH/USDT", "SOL/USDT"],
            &[Timeframe::M5, Timeframe::H1],
        ),
    );
    let report = scanner.sweep().await;

    let order: Vec<(&str, Timeframe)> = report
        .outcomes
        .iter()
        .map(|o| (o.symbol.as_str(), o.timeframe))
        .collect();
    assert_eq!(
        order,
        vec![
            ("BTC/USDT", Timeframe::M5),
            ("BTC/USDT", Timeframe::H1),
            ("ETH/USDT", Timeframe::M5),
            ("ETH/USDT", Timeframe::H1),
            ("SOL/USDT", Timeframe::M5),
            ("SOL/USDT", Timeframe::H1),
        ]
    );

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].symbol, "ETH/USDT");
    assert_eq!(failures[0].timeframe, Timeframe::M5);
    assert!(matches!(
        failures[0].result,
        Err(ScanError::Fetch(FetchError::PermanentExchange(_)))
    ));
    // permanent errors are not retried
    assert_eq!(provider.call_count(), 6);
    assert_eq!(report.alerts().count(), 5);
}

#[tokio::test]
async fn transient_failure_recovers_within_the_sweep() {
    let provider = Arc::new(
        FakeExchange::default()
            .with_window("SOL/USDT", Timeframe::H4, golden_cross_window())
            .failing(
                "SOL/USDT",
                Timeframe::H4,
                vec![FetchError::TransientNetwork("connection reset".into())],
            ),
    );
    let scanner = Scanner::new(
        provider.clone(),
        detector(),
        AlertFeed::new(4),
        plan(&["SOL/USDT"], &[Timeframe::H4]),
    );

    let report = scanner.sweep().await;
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.alerts().count(), 1);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn short_window_is_insufficient_and_leaves_state_alone() {
    let provider =
        Arc::new(FakeExchange::default().with_window("XRP/USDT", Timeframe::M15, flat_window(49)));
    let detector = detector();
    let scanner = Scanner::new(
        provider,
        detector.clone(),
        AlertFeed::new(4),
        plan(&["XRP/USDT"], &[Timeframe::M15]),
    );

    let report = scanner.sweep().await;
    assert!(matches!(
        report.outcomes[0].result,
        Err(ScanError::InsufficientData { got: 49, need: 50 })
    ));
    assert!(detector.state().is_empty());
}

#[tokio::test]
async fn flat_market_produces_no_alerts() {
    let provider =
        Arc::new(FakeExchange::default().with_window("DOT/USDT", Timeframe::D1, flat_window(200)));
    let scanner = Scanner::new(
        provider,
        detector(),
        AlertFeed::new(4),
        plan(&["DOT/USDT"], &[Timeframe::D1]),
    );
    let report = scanner.sweep().await;
    assert!(report.outcomes[0].result.as_ref().unwrap().is_none());
}

#[tokio::test]
async fn emitted_alert_reaches_registered_chat() {
    let provider = Arc::new(
        FakeExchange::default().with_window("BNB/USDT", Timeframe::H1, golden_cross_window()),
    );
    let transport = Arc::new(RecordingTransport::default());
    let recipients = Arc::new(Recipients::new(RecipientMode::Multi, [11, 12]));
    let dispatcher = Dispatcher::new(transport.clone(), recipients, "Binance");

    let feed = AlertFeed::new(4);
    let rx = feed.subscribe();
    let scanner = Scanner::new(
        provider,
        detector(),
        feed,
        plan(&["BNB/USDT"], &[Timeframe::H1]),
    );
    scanner.sweep().await;
    drop(scanner);

    dispatcher.run(rx).await.unwrap();
    let sent = transport.sent.lock();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(_, text)| text.contains("Pair: *BNB/USDT*")));
    assert!(sent.iter().all(|(_, text)| text.contains("Signal: *BUY*")));
}

#[tokio::test]
async fn panicking_pair_does_not_abort_sweep() {
    let provider = Arc::new(
        FakeExchange::default()
            .with_window("BTC/USDT", Timeframe::H1, golden_cross_window())
            .with_window("ETH/USDT", Timeframe::H1, flat_window(61))
            .with_window("SOL/USDT", Timeframe::H1, golden_cross_window()),
    );
    let detector = detector_with(Arc::new(PanicsOnLength {
        inner: MacdEngine::default(),
        len: 61,
    }));
    let scanner = Scanner::new(
        provider.clone(),
        detector.clone(),
        AlertFeed::new(4),
        plan(&["BTC/USDT", "ETH/USDT", "SOL/USDT"], &[Timeframe::H1]),
    );

    let report = scanner.sweep().await;
    assert_eq!(
        *provider.fetched.lock(),
        vec!["BTC/USDT", "ETH/USDT", "SOL/USDT"]
    );
    assert_eq!(report.outcomes.len(), 3);
    match &report.outcomes[1].result {
        Err(ScanError::Panicked(reason)) => assert!(reason.contains("61 closes")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(report.alerts().count(), 2);
    assert_eq!(detector.state().get("ETH/USDT", Timeframe::H1), None);
    assert_eq!(
        detector.state().get("SOL/USDT", Timeframe::H1),
        Some(Side::Buy)
    );
}
