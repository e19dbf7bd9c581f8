use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use market::error::FeedError;
use market::feed::protocol::{FeedRequest, parse_ticker};
use market::feed::ws::WsFeedConnector;
use market::feed::{FeedConnection, FeedConnector};
use market::handshake;

/// Single-connection websocket server. `script` maps every inbound text frame
/// to the frames sent back, in order. Resolves the `Origin` header it saw.
async fn spawn_server(
    script: fn(&str) -> Vec<Message>,
) -> (String, oneshot::Receiver<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (origin_tx, origin_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();

        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let origin = req
                .headers()
                .get("origin")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let _ = origin_tx.send(origin);
            Ok(resp)
        };

        let mut ws = accept_hdr_async(stream, callback).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                for reply in script(text.as_str()) {
                    if ws.send(reply).await.is_err() {
                        return;
                    }
                }
            }
        }
    });

    (format!("ws://{addr}"), origin_rx)
}

fn hitbtc_like(raw: &str) -> Vec<Message> {
    let req: serde_json::Value = serde_json::from_str(raw).unwrap();

    match req["method"].as_str().unwrap() {
        "getSymbol" => vec![Message::Text(
            r#"{"jsonrpc":"2.0","result":{"id":"ETHBTC","baseCurrency":"ETH","feeCurrency":"BTC"},"id":null}"#.into(),
        )],
        "getCurrency" => vec![Message::Text(
            r#"{"jsonrpc":"2.0","result":{"id":"ETH","fullName":"Ethereum"},"id":null}"#.into(),
        )],
        "subscribeTicker" => vec![
            Message::Ping(vec![1, 2, 3].into()),
            Message::Text(r#"{"jsonrpc":"2.0","result":true,"id":null}"#.into()),
            Message::Text(
                r#"{"jsonrpc":"2.0","method":"ticker","params":{"ask":"0.07","bid":"0.069","last":"0.0695","open":"0.07","low":"0.068","high":"0.072"}}"#.into(),
            ),
        ],
        _ => vec![],
    }
}

fn silent(_: &str) -> Vec<Message> {
    vec![]
}

fn hang_up(_: &str) -> Vec<Message> {
    vec![Message::Close(None)]
}

fn connector(url: String, timeout: Duration) -> WsFeedConnector {
    WsFeedConnector::new(url, "https://localhost/".into(), timeout)
}

#[tokio::test]
async fn open_sends_fixed_origin_header() {
    let (url, origin) = spawn_server(hitbtc_like).await;

    let mut conn = connector(url, Duration::from_secs(2)).open().await.unwrap();

    assert_eq!(origin.await.unwrap().as_deref(), Some("https://localhost/"));
    conn.close().await;
}

#[tokio::test]
async fn handshake_over_websocket_resolves_identity() {
    let (url, _origin) = spawn_server(hitbtc_like).await;
    let mut conn = connector(url, Duration::from_secs(2)).open().await.unwrap();

    let hs = handshake::resolve(&mut conn, "ETHBTC").await.unwrap();

    assert!(hs.is_complete());
    assert_eq!(hs.record.id, "ETH");
    assert_eq!(hs.record.full_name, "Ethereum");
    assert_eq!(hs.record.fee_currency, "BTC");
}

// Replies are matched to requests by arrival order only. Each subscribe makes
// the server queue an ack and a push; every request consumes exactly one data
// frame, so the second read returns the push queued by the first subscribe.
#[tokio::test]
async fn replies_are_paired_by_arrival_order() {
    let (url, _origin) = spawn_server(hitbtc_like).await;
    let mut conn = connector(url, Duration::from_secs(2)).open().await.unwrap();
    let subscribe = FeedRequest::subscribe_ticker("ETHBTC");

    let first = conn.request(&subscribe).await.unwrap();
    assert!(parse_ticker(&first).unwrap().is_none(), "ping skipped, ack read");

    let second = conn.request(&subscribe).await.unwrap();
    let push = parse_ticker(&second).unwrap().unwrap();
    assert_eq!(push.ask, "0.07");
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let (url, _origin) = spawn_server(silent).await;
    let mut conn = connector(url, Duration::from_millis(100)).open().await.unwrap();

    let err = conn
        .request(&FeedRequest::get_symbol("ETHBTC"))
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::Timeout(_)));
}

#[tokio::test]
async fn peer_close_ends_the_connection() {
    let (url, _origin) = spawn_server(hang_up).await;
    let mut conn = connector(url, Duration::from_secs(2)).open().await.unwrap();

    let err = conn
        .request(&FeedRequest::get_symbol("ETHBTC"))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Closed));

    let again = conn
        .request(&FeedRequest::get_symbol("ETHBTC"))
        .await
        .unwrap_err();
    assert!(matches!(again, FeedError::Closed));

    conn.close().await;
    conn.close().await;
}

#[tokio::test]
async fn unreachable_endpoint_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = connector(format!("ws://{addr}"), Duration::from_secs(1))
        .open()
        .await
        .err()
        .unwrap();

    assert!(matches!(err, FeedError::Connect(_)));
}
