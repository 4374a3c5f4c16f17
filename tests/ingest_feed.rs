// tests/ingest_feed.rs
//
// End-to-end over the bundled feed fixture: every mapped field of a fully
// populated order lands in the record, and the fallbacks of a sparse order
// behave as documented.

use chrono::{DateTime, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use order_feed_ingest::ingest::providers::FixtureFeed;
use order_feed_ingest::{
    run_once, BatchPolicy, ConflictPolicy, LocalZone, OrderRecord, OrderStore, RecordBuilder,
};

const FEED: &str = include_str!("fixtures/orders.xml");

fn dec(s: &str) -> Option<Decimal> {
    Some(Decimal::from_str(s).unwrap())
}

fn first_order_expected() -> OrderRecord {
    OrderRecord {
        marketplace: "amazon".into(),
        id_flux: "88617".into(),
        order_id: "123-2979087-5555555".into(),
        order_mrid: "123-2979087-5555555".into(),
        order_refid: "ref-5555555".into(),
        order_external_id: "ext-5555555".into(),
        order_status_marketplace: "accept".into(),
        order_status_lengow: "processing".into(),
        order_purchase_date: NaiveDate::from_ymd_opt(2014, 10, 21),
        order_purchase_time: NaiveTime::from_hms_opt(10, 19, 20),
        payment_date: NaiveDate::from_ymd_opt(2014, 10, 21),
        payment_time: NaiveTime::from_hms_opt(10, 21, 3),
        tracking_shipped_date: Some(
            DateTime::parse_from_rfc3339("2014-10-22T09:30:00+00:00").unwrap(),
        ),
        order_amount: dec("34.5"),
        order_tax: dec("0"),
        order_shipping: dec("5.50"),
        order_commission: dec("2.75"),
        order_processing_fee: dec("0.40"),
        order_currency: "EUR".into(),
        tracking_parcel_weight: dec("1.25"),
        payment_checkout: "checkout-1".into(),
        payment_status: "paid".into(),
        payment_type: "card".into(),
        invoice_number: "INV-0042".into(),
        invoice_url: "https://invoices.example.test/INV-0042.pdf".into(),
        billing_society: "".into(),
        billing_civility: "M".into(),
        billing_lastname: "Dupont".into(),
        billing_firstname: "Jean".into(),
        billing_email: "jean.dupont@example.test".into(),
        billing_address: "014 rue de la poupée".into(),
        billing_address_2: "Bâtiment B".into(),
        billing_address_complement: "".into(),
        billing_zipcode: "44000".into(),
        billing_city: "Nantes".into(),
        billing_country: "France".into(),
        billing_country_iso: "FR".into(),
        billing_phone_home: "0240000000".into(),
        billing_phone_office: "".into(),
        billing_phone_mobile: "0600000000".into(),
        billing_full_address: "014 rue de la poupée Bâtiment B 44000 Nantes".into(),
        delivery_society: "ACME".into(),
        delivery_civility: "Mme".into(),
        delivery_lastname: "Martin".into(),
        delivery_firstname: "Claire".into(),
        delivery_email: "claire.martin@example.test".into(),
        delivery_address: "2 place du Commerce".into(),
        delivery_address_2: "".into(),
        delivery_address_complement: "3e étage".into(),
        delivery_zipcode: "75002".into(),
        delivery_city: "Paris".into(),
        delivery_country: "France".into(),
        delivery_country_iso: "FR".into(),
        delivery_phone_home: "".into(),
        delivery_phone_office: "0140000000".into(),
        delivery_phone_mobile: "0611111111".into(),
        delivery_full_address: "ACME 2 place du Commerce 75002 Paris".into(),
        tracking_method: "Standard".into(),
        tracking_carrier: "Colissimo".into(),
        tracking_number: "6A00000000000".into(),
        tracking_url: "https://track.example.test/6A00000000000".into(),
        tracking_relay: "".into(),
        tracking_delivering_by_marketplace: false,
        order_comments: "Leave at the front desk".into(),
        customer_id: "C-1001".into(),
    }
}

async fn ingest_fixture(store: &OrderStore, builder: &RecordBuilder) {
    let feed = FixtureFeed::from_fixture(FEED);
    let report = run_once(&feed, builder, store, BatchPolicy::Abort)
        .await
        .expect("fixture ingests");
    assert_eq!(report.orders_seen, 2);
    assert_eq!(report.created, 2);
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);
}

#[tokio::test]
async fn fully_populated_order_round_trips_every_field() {
    let store = OrderStore::new(ConflictPolicy::Reject);
    ingest_fixture(&store, &RecordBuilder::default()).await;

    let got = store.get("123-2979087-5555555").expect("first order stored");
    assert_eq!(got, first_order_expected());
}

#[tokio::test]
async fn sparse_order_takes_field_fallbacks() {
    let store = OrderStore::default();
    ingest_fixture(&store, &RecordBuilder::default()).await;

    let r = store.get("CD-1410230001").expect("second order stored");
    assert_eq!(r.order_status_marketplace, "WaitingForShipmentAcceptation");
    assert_eq!(r.marketplace, "cdiscount");
    assert_eq!(r.order_external_id, "");
    assert_eq!(r.billing_address, "7 avenue Foch");

    // Blank tax stays absent, blank weight means zero.
    assert_eq!(r.order_tax, None);
    assert_eq!(r.tracking_parcel_weight, Some(Decimal::ZERO));
    // Non-numeric amount is absent, not an error.
    assert_eq!(r.order_shipping, None);
    assert_eq!(r.order_amount, dec("19.90"));

    assert_eq!(r.order_purchase_date, NaiveDate::from_ymd_opt(2014, 10, 23));
    assert_eq!(r.order_purchase_time, None);
    assert_eq!(r.payment_date, None);
    assert_eq!(r.tracking_shipped_date, None);
    assert!(r.tracking_delivering_by_marketplace);

    // Fields missing from the node altogether.
    assert_eq!(r.invoice_number, "");
    assert_eq!(r.order_commission, None);
    assert_eq!(r.customer_id, "");
}

#[tokio::test]
async fn shipped_date_carries_the_configured_zone() {
    let zone: LocalZone = "+02:00".parse().unwrap();
    let builder = RecordBuilder::new(Default::default(), zone);
    let store = OrderStore::default();
    ingest_fixture(&store, &builder).await;

    let shipped = store
        .get("123-2979087-5555555")
        .and_then(|r| r.tracking_shipped_date)
        .expect("shipped date present");
    assert_eq!(shipped.to_rfc3339(), "2014-10-22T09:30:00+02:00");
}

#[tokio::test]
async fn records_are_listed_in_order_id_order() {
    let store = OrderStore::default();
    ingest_fixture(&store, &RecordBuilder::default()).await;

    let ids: Vec<String> = store.list().into_iter().map(|r| r.order_id).collect();
    assert_eq!(ids, vec!["123-2979087-5555555", "CD-1410230001"]);
}
