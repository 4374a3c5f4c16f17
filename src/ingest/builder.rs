// src/ingest/builder.rs
//! Record builder: one generic pass over the field-mapping table.

use crate::ingest::convert::{to_datetime, to_decimal, LocalZone};
use crate::ingest::extract::extract;
use crate::ingest::mapping::{FieldMapping, Rule};
use crate::ingest::types::OrderRecord;
use crate::ingest::xml::XmlNode;

#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    mapping: FieldMapping,
    zone: LocalZone,
}

impl RecordBuilder {
    pub fn new(mapping: FieldMapping, zone: LocalZone) -> Self {
        Self { mapping, zone }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn zone(&self) -> LocalZone {
        self.zone
    }

    /// Build one record from an `order` node.
    ///
    /// Never fails: unparsable values take their fallback and missing
    /// elements read as `""`. Whether the result is storable is up to the sink.
    pub fn build(&self, node: &XmlNode) -> OrderRecord {
        let mut record = OrderRecord::default();

        for spec in self.mapping.specs() {
            let raw = extract(node, &spec.path);
            match &spec.rule {
                Rule::Text(slot) => *slot(&mut record) = raw,
                Rule::Date { format, slot } => {
                    *slot(&mut record) = to_datetime(&raw, format).map(|dt| dt.date());
                }
                Rule::Time { format, slot } => {
                    *slot(&mut record) = to_datetime(&raw, format).map(|dt| dt.time());
                }
                Rule::Timestamp { format, slot } => {
                    let naive = to_datetime(&raw, format);
                    let aware = naive.and_then(|dt| self.zone.attach(dt));
                    if naive.is_some() && aware.is_none() {
                        tracing::debug!(
                            target: "ingest",
                            field = spec.name,
                            zone = %self.zone,
                            "timestamp falls into a DST gap; left empty"
                        );
                    }
                    *slot(&mut record) = aware;
                }
                Rule::Decimal { fallback, slot } => {
                    *slot(&mut record) = fallback.apply(to_decimal(&raw));
                }
                Rule::Flag { truthy, slot } => *slot(&mut record) = raw == *truthy,
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::xml::parse_document;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    fn node(xml: &str) -> XmlNode {
        parse_document(xml).unwrap()
    }

    #[test]
    fn minimal_order_gets_defaults() {
        let b = RecordBuilder::default();
        let r = b.build(&node("<order><order_id>42</order_id></order>"));
        assert_eq!(r.order_id, "42");
        assert_eq!(r.billing_city, "");
        assert_eq!(r.order_amount, None);
        assert_eq!(r.order_tax, None);
        assert_eq!(r.tracking_parcel_weight, Some(Decimal::ZERO));
        assert_eq!(r.order_purchase_date, None);
        assert!(!r.tracking_delivering_by_marketplace);
    }

    #[test]
    fn blank_order_id_still_builds() {
        let b = RecordBuilder::default();
        let r = b.build(&node(
            "<order><order_id>\u{00A0}</order_id><order_mrid>m1</order_mrid></order>",
        ));
        assert_eq!(r.order_id, "");
        assert_eq!(r.order_mrid, "m1");
        assert_eq!(r.tracking_parcel_weight, Some(Decimal::ZERO));
    }

    #[test]
    fn typed_fields_convert_and_fall_back() {
        let b = RecordBuilder::default();
        let r = b
            .build(&node(
                "<order>\
                   <order_id>1</order_id>\
                   <order_purchase_date>2014-10-21</order_purchase_date>\
                   <order_purchase_heure>not a time</order_purchase_heure>\
                   <order_amount>34.50</order_amount>\
                   <order_tax>n/a</order_tax>\
                   <tracking_informations>\
                     <tracking_parcel_weight>abc</tracking_parcel_weight>\
                     <tracking_deliveringByMarketPlace>1</tracking_deliveringByMarketPlace>\
                   </tracking_informations>\
                 </order>",
            ));
        assert_eq!(r.order_purchase_date, NaiveDate::from_ymd_opt(2014, 10, 21));
        assert_eq!(r.order_purchase_time, None);
        assert_eq!(r.order_amount, Some(Decimal::new(345, 1)));
        assert_eq!(r.order_tax, None);
        assert_eq!(r.tracking_parcel_weight, Some(Decimal::ZERO));
        assert!(r.tracking_delivering_by_marketplace);
    }

    #[test]
    fn flag_requires_exact_one() {
        let b = RecordBuilder::default();
        for raw in ["0", "", "true", "yes", "01"] {
            let xml = format!(
                "<order><order_id>1</order_id><tracking_deliveringByMarketPlace>{raw}</tracking_deliveringByMarketPlace></order>"
            );
            let r = b.build(&node(&xml));
            assert!(!r.tracking_delivering_by_marketplace, "raw={raw:?}");
        }
    }

    #[test]
    fn shipment_keeps_full_instant_in_configured_zone() {
        let zone: LocalZone = "+01:00".parse().unwrap();
        let b = RecordBuilder::new(FieldMapping::lengow(), zone);
        let r = b
            .build(&node(
                "<order><order_id>1</order_id><tracking_informations>\
                 <tracking_shipped_date>2014-10-22 09:30:00</tracking_shipped_date>\
                 </tracking_informations></order>",
            ));
        let shipped = r.tracking_shipped_date.unwrap();
        assert_eq!(shipped.to_rfc3339(), "2014-10-22T09:30:00+01:00");
    }

    #[test]
    fn format_override_changes_parsing() {
        let mapping = FieldMapping::lengow()
            .with_format("payment_time", "%Hh%M")
            .unwrap();
        let b = RecordBuilder::new(mapping, LocalZone::default());
        let r = b
            .build(&node(
                "<order><order_id>1</order_id><order_payment><payment_heure>10h19</payment_heure></order_payment></order>",
            ));
        assert_eq!(r.payment_time, NaiveTime::from_hms_opt(10, 19, 0));
    }
}
