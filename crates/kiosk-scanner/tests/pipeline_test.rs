//! End-to-end tests of the scan pipeline: source, decoder, sanitizer and
//! interpreter together.

use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use futures::channel::mpsc;
use kiosk_scanner::{
    InputEvent, InputSource, KeystrokeDecoder, SyntheticSource, TerminalSource, canonicalize,
    next_scan,
};
use tokio::time::Instant;

#[tokio::test]
async fn test_synthetic_scan_to_identifier() {
    let (mut source, handle) = SyntheticSource::new();
    let mut decoder = KeystrokeDecoder::new();

    handle
        .type_scan("\x02SS2255--228811111155\x03", Instant::now(), Duration::from_millis(8))
        .await
        .unwrap();

    let code = next_scan(&mut source, &mut decoder).await.unwrap();
    let id = canonicalize(code).unwrap();
    assert_eq!(id.as_str(), "SS2255-2288155");
}

#[tokio::test]
async fn test_slow_typing_then_scan() {
    let (mut source, handle) = SyntheticSource::new();
    let mut decoder = KeystrokeDecoder::new();
    let t0 = Instant::now();

    // Someone bumps a key, then scans a card a second later.
    handle.send(InputEvent::char('q').at(t0)).await.unwrap();
    handle
        .type_scan("20231234", t0 + Duration::from_secs(1), Duration::from_millis(5))
        .await
        .unwrap();

    let code = next_scan(&mut source, &mut decoder).await.unwrap();
    assert_eq!(code.as_str(), "20231234");
    assert_eq!(decoder.stats().fragments_discarded, 1);
}

#[tokio::test]
async fn test_paste_with_object_payload() {
    let (mut source, handle) = SyntheticSource::new();
    let mut decoder = KeystrokeDecoder::new();

    handle
        .paste("  {id: 'a1b2', studentNo: '2023-0042'}  ")
        .await
        .unwrap();

    let code = next_scan(&mut source, &mut decoder).await.unwrap();
    assert_eq!(canonicalize(code).unwrap().as_str(), "2023-0042");
}

fn press(tx: &mpsc::UnboundedSender<io::Result<Event>>, code: KeyCode) {
    tx.unbounded_send(Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))))
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_terminal_slow_typing_restarts_scan() {
    let (tx, rx) = mpsc::unbounded();
    let mut source = TerminalSource::from_stream(rx, "terminal");
    let mut decoder = KeystrokeDecoder::new();

    press(&tx, KeyCode::Char('A'));
    assert!(decoder.feed(source.next_event().await.unwrap()).is_none());
    tokio::time::advance(Duration::from_millis(600)).await;
    press(&tx, KeyCode::Char('B'));
    press(&tx, KeyCode::Enter);

    let code = next_scan(&mut source, &mut decoder).await.unwrap();
    assert_eq!(code.as_str(), "B");
    assert_eq!(decoder.stats().fragments_discarded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_keys_and_paste_yield_consecutive_scans() {
    let (tx, rx) = mpsc::unbounded();
    let mut source = TerminalSource::from_stream(rx, "terminal");
    let mut decoder = KeystrokeDecoder::new();

    for c in "20230142".chars() {
        press(&tx, KeyCode::Char(c));
    }
    press(&tx, KeyCode::Enter);
    tx.unbounded_send(Ok(Event::Paste(" 20230257 ".to_string())))
        .unwrap();
    drop(tx);

    let first = next_scan(&mut source, &mut decoder).await.unwrap();
    let second = next_scan(&mut source, &mut decoder).await.unwrap();
    assert_eq!(first.as_str(), "20230142");
    assert_eq!(second.as_str(), "20230257");

    let end = next_scan(&mut source, &mut decoder).await.unwrap_err();
    assert!(end.is_disconnected());
}

#[tokio::test]
async fn test_source_disconnect_ends_scanning() {
    let (mut source, handle) = SyntheticSource::new();
    let mut decoder = KeystrokeDecoder::new();

    handle.send(InputEvent::char('1')).await.unwrap();
    drop(handle);

    let err = next_scan(&mut source, &mut decoder).await.unwrap_err();
    assert!(err.is_disconnected());
    assert_eq!(decoder.pending_len(), 1);
}
