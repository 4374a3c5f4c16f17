// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use order_feed_ingest::api::{self, AppState};
use order_feed_ingest::ingest::providers::FixtureFeed;
use order_feed_ingest::metrics::Metrics;
use order_feed_ingest::{run_once, BatchPolicy, IngestConfig, OrderStore, RecordBuilder};

#[tokio::test]
async fn metrics_endpoint_contains_ingest_series() {
    // Only test in this binary, so the global recorder is ours.
    let metrics = Metrics::init().expect("recorder installs once");
    let state = AppState::new(OrderStore::default(), IngestConfig::default());
    let app = api::router(state.clone()).merge(metrics.router());

    let feed = FixtureFeed::from_fixture(include_str!("fixtures/orders.xml"));
    run_once(&feed, &RecordBuilder::default(), state.store.as_ref(), BatchPolicy::Abort)
        .await
        .expect("fixture ingests");

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "ingest_orders_seen_total 2",
        "ingest_orders_saved_total 2",
        "ingest_parse_ms_bucket",
        "ingest_last_run_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
