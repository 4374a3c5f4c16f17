// tests/ingest_encoding.rs
//
// Feeds are not always UTF-8: the declared charset decides how bytes are read.

use encoding_rs::WINDOWS_1252;

use order_feed_ingest::ingest::ingest_document;
use order_feed_ingest::{BatchPolicy, FeedError, OrderStore, RecordBuilder};

fn latin1_feed() -> Vec<u8> {
    let xml = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
        <orders><order>\
        <order_id>FR-1</order_id><order_mrid>FR-1</order_mrid><order_refid>FR-1</order_refid>\
        <billing_address><billing_lastname>Lefèvre</billing_lastname>\
        <billing_address>12 rue du Château&nbsp;</billing_address></billing_address>\
        <order_amount>12.90</order_amount>\
        </order></orders>";
    let (bytes, _, unmappable) = WINDOWS_1252.encode(xml);
    assert!(!unmappable);
    bytes.into_owned()
}

#[tokio::test]
async fn declared_latin1_feed_is_decoded_before_parsing() {
    let store = OrderStore::default();
    let report = ingest_document(
        "latin1",
        &latin1_feed(),
        &RecordBuilder::default(),
        &store,
        BatchPolicy::Abort,
    )
    .await
    .unwrap();
    assert!(report.is_clean());

    let r = store.get("FR-1").unwrap();
    assert_eq!(r.billing_lastname, "Lefèvre");
    assert_eq!(r.billing_address, "12 rue du Château");
}

#[tokio::test]
async fn unknown_charset_fails_the_run() {
    let store = OrderStore::default();
    let doc = b"<?xml version=\"1.0\" encoding=\"x-klingon\"?><orders/>";
    let err = ingest_document("odd", doc, &RecordBuilder::default(), &store, BatchPolicy::Skip)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_body_has_no_root() {
    let store = OrderStore::default();
    let err = ingest_document("blank", b"   ", &RecordBuilder::default(), &store, BatchPolicy::Skip)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::EmptyDocument), "got {err:?}");
}
