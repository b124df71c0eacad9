//! End-to-end fetch tests against a local HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arbiwatch_core::credential::{CredentialGate, SharedCredential};
use arbiwatch_core::sources::{
    FetchError, HttpTransport, NormalizedPayload, ReqwestTransport, SourceFetcher, SourceKind,
};
use arbiwatch_core::{Dashboard, ForceOutcome, SchedulerSettings};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;

const TOKEN: &str = "secret";

#[derive(Clone, Default)]
struct ServerState {
    fail_pairs: Arc<AtomicBool>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

async fn pairs(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_pairs.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    axum::Json(json!({
        "results": [
            {"pair": "BTC/USDT", "buyExchange": "A", "sellExchange": "B", "spread": 1.2}
        ]
    }))
    .into_response()
}

async fn tracking(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    axum::Json(json!({
        "BTC": {
            "lowestExchange": "A",
            "lowestPrice": 100,
            "highestExchange": "B",
            "highestPrice": 110,
            "profitPercentage": 9.1
        }
    }))
    .into_response()
}

async fn sentiment() -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "success": true,
        "data": [
            {"symbol": "ETH", "overallSentiment": -0.4},
            {"symbol": "BTC", "overallSentiment": 0.6}
        ]
    }))
}

async fn status(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let next = chrono::Utc::now() + chrono::Duration::seconds(60);
    axum::Json(json!({"nextRefreshTime": next.timestamp_millis()})).into_response()
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

async fn spawn_server(state: ServerState) -> SocketAddr {
    let app = Router::new()
        .route("/api/arbitrage", get(pairs))
        .route("/api/arbitrage/arbitrack", get(tracking))
        .route("/api/crypto/sentiment", get(sentiment))
        .route("/api/arbitrage/status", get(status))
        .route("/broken", get(not_json))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn transport(addr: SocketAddr) -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn test_authenticated_pairs_are_unwrapped() {
    let addr = spawn_server(ServerState::default()).await;
    let gate = CredentialGate::new(Arc::new(SharedCredential::with_token(TOKEN)));
    let fetcher = SourceFetcher::new(SourceKind::Pairs, transport(addr), gate);

    match fetcher.fetch().await.unwrap() {
        NormalizedPayload::Pairs(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0]["pair"], "BTC/USDT");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_token_is_http_status() {
    let addr = spawn_server(ServerState::default()).await;
    let gate = CredentialGate::new(Arc::new(SharedCredential::with_token("wrong")));
    let fetcher = SourceFetcher::new(SourceKind::Tracking, transport(addr), gate);

    assert_eq!(
        fetcher.fetch().await.unwrap_err(),
        FetchError::HttpStatus { status: 401 }
    );
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let addr = spawn_server(ServerState::default()).await;

    let err = transport(addr).get_json("/broken", None).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedPayload { .. }));
}

#[tokio::test]
async fn test_unknown_path_is_http_status() {
    let addr = spawn_server(ServerState::default()).await;

    let err = transport(addr).get_json("/missing", None).await.unwrap_err();
    assert_eq!(err, FetchError::HttpStatus { status: 404 });
}

#[tokio::test]
async fn test_full_cycle_fills_snapshot() {
    let addr = spawn_server(ServerState::default()).await;
    let dashboard = Dashboard::with_parts(
        transport(addr),
        Arc::new(SharedCredential::with_token(TOKEN)),
        SchedulerSettings::default(),
    );

    assert_eq!(dashboard.force_refresh().await, ForceOutcome::Completed);

    let snapshot = dashboard.snapshot();
    assert!(snapshot.initialized);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.pair_data.len(), 1);
    assert_eq!(snapshot.track_data.len(), 1);
    assert_eq!(snapshot.track_data[0].coin1, "BTC");
    assert_eq!(snapshot.track_data[0].min_exchange, "A");
    assert_eq!(snapshot.track_data[0].max_exchange, "B");

    let symbols: Vec<_> = snapshot
        .sentiment_data
        .iter()
        .filter_map(|record| record.symbol())
        .collect();
    assert_eq!(symbols, vec!["BTC", "ETH"]);

    // The server's deadline, one minute out, wins over the 300s interval.
    assert!(snapshot.countdown_seconds <= 60);
    assert!(snapshot.countdown_seconds >= 50);
}

#[tokio::test]
async fn test_pairs_failure_keeps_previous_pairs() {
    let state = ServerState::default();
    let addr = spawn_server(state.clone()).await;
    let dashboard = Dashboard::with_parts(
        transport(addr),
        Arc::new(SharedCredential::with_token(TOKEN)),
        SchedulerSettings::default(),
    );

    dashboard.force_refresh().await;
    let before = dashboard.snapshot().pair_data;
    assert_eq!(before.len(), 1);

    state.fail_pairs.store(true, Ordering::SeqCst);
    dashboard.force_refresh().await;

    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot.pair_data, before);
    assert_eq!(snapshot.sentiment_data.len(), 2);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("pairs: HTTP error! status: 500")
    );
    assert!(snapshot.initialized);
}

#[tokio::test]
async fn test_without_token_only_public_source_is_read() {
    let addr = spawn_server(ServerState::default()).await;
    let dashboard = Dashboard::with_parts(
        transport(addr),
        Arc::new(SharedCredential::new()),
        SchedulerSettings::default(),
    );

    dashboard.force_refresh().await;

    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot.error, None);
    assert!(snapshot.pair_data.is_empty());
    assert!(snapshot.track_data.is_empty());
    assert_eq!(snapshot.sentiment_data.len(), 2);
    assert_eq!(snapshot.countdown_seconds, 300);
}
