// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// One normalized order, flat, as handed to storage.
///
/// Text fields are empty when the feed omits them or leaves them blank;
/// typed fields are `None` when the raw text did not convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderRecord {
    // identity
    pub marketplace: String,
    pub id_flux: String,
    pub order_id: String,
    pub order_mrid: String,
    pub order_refid: String,
    pub order_external_id: String,

    // status
    pub order_status_marketplace: String,
    pub order_status_lengow: String,

    // temporal
    pub order_purchase_date: Option<NaiveDate>,
    pub order_purchase_time: Option<NaiveTime>,
    pub payment_date: Option<NaiveDate>,
    pub payment_time: Option<NaiveTime>,
    pub tracking_shipped_date: Option<DateTime<FixedOffset>>,

    // monetary
    pub order_amount: Option<Decimal>,
    pub order_tax: Option<Decimal>,
    pub order_shipping: Option<Decimal>,
    pub order_commission: Option<Decimal>,
    pub order_processing_fee: Option<Decimal>,
    pub order_currency: String,
    pub tracking_parcel_weight: Option<Decimal>,

    // payment / invoice
    pub payment_checkout: String,
    pub payment_status: String,
    pub payment_type: String,
    pub invoice_number: String,
    pub invoice_url: String,

    // billing party
    pub billing_society: String,
    pub billing_civility: String,
    pub billing_lastname: String,
    pub billing_firstname: String,
    pub billing_email: String,
    pub billing_address: String,
    pub billing_address_2: String,
    pub billing_address_complement: String,
    pub billing_zipcode: String,
    pub billing_city: String,
    pub billing_country: String,
    pub billing_country_iso: String,
    pub billing_phone_home: String,
    pub billing_phone_office: String,
    pub billing_phone_mobile: String,
    pub billing_full_address: String,

    // delivery party
    pub delivery_society: String,
    pub delivery_civility: String,
    pub delivery_lastname: String,
    pub delivery_firstname: String,
    pub delivery_email: String,
    pub delivery_address: String,
    pub delivery_address_2: String,
    pub delivery_address_complement: String,
    pub delivery_zipcode: String,
    pub delivery_city: String,
    pub delivery_country: String,
    pub delivery_country_iso: String,
    pub delivery_phone_home: String,
    pub delivery_phone_office: String,
    pub delivery_phone_mobile: String,
    pub delivery_full_address: String,

    // logistics
    pub tracking_method: String,
    pub tracking_carrier: String,
    pub tracking_number: String,
    pub tracking_url: String,
    pub tracking_relay: String,
    pub tracking_delivering_by_marketplace: bool,

    pub order_comments: String,
    pub customer_id: String,
}

/// Where the raw feed document comes from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve the raw (still encoded) document bytes.
    async fn fetch(&self) -> Result<Vec<u8>, FeedError>;
    fn name(&self) -> &str;
}
