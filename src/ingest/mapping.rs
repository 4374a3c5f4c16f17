// src/ingest/mapping.rs
//! Declarative field-mapping table: which record field is read from where,
//! and how its raw text is converted.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::error::MappingError;
use crate::ingest::convert::DecimalFallback;
use crate::ingest::extract::FieldPath;
use crate::ingest::types::OrderRecord;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accessor for the record field a rule writes into.
pub type Slot<T> = fn(&mut OrderRecord) -> &mut T;

/// Conversion applied to a field's extracted text.
#[derive(Clone)]
pub enum Rule {
    /// Stored as extracted.
    Text(Slot<String>),
    /// Date component of the parsed value.
    Date {
        format: String,
        slot: Slot<Option<NaiveDate>>,
    },
    /// Time component of the parsed value.
    Time {
        format: String,
        slot: Slot<Option<NaiveTime>>,
    },
    /// Full instant, attached to the configured zone.
    Timestamp {
        format: String,
        slot: Slot<Option<DateTime<FixedOffset>>>,
    },
    Decimal {
        fallback: DecimalFallback,
        slot: Slot<Option<Decimal>>,
    },
    /// `true` iff the text equals `truthy` exactly.
    Flag { truthy: &'static str, slot: Slot<bool> },
}

impl Rule {
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Text(_) => "text",
            Rule::Date { .. } => "date",
            Rule::Time { .. } => "time",
            Rule::Timestamp { .. } => "timestamp",
            Rule::Decimal { .. } => "decimal",
            Rule::Flag { .. } => "flag",
        }
    }

    pub fn format(&self) -> Option<&str> {
        match self {
            Rule::Date { format, .. } | Rule::Time { format, .. } | Rule::Timestamp { format, .. } => {
                Some(format)
            }
            _ => None,
        }
    }

    fn format_mut(&mut self) -> Option<&mut String> {
        match self {
            Rule::Date { format, .. } | Rule::Time { format, .. } | Rule::Timestamp { format, .. } => {
                Some(format)
            }
            _ => None,
        }
    }
}

/// One row of the table.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub path: FieldPath,
    pub rule: Rule,
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("path", &self.path.to_string())
            .field("kind", &self.rule.kind())
            .field("format", &self.rule.format())
            .finish()
    }
}

fn text(name: &'static str, path: FieldPath, slot: Slot<String>) -> FieldSpec {
    FieldSpec {
        name,
        path,
        rule: Rule::Text(slot),
    }
}

fn date(name: &'static str, path: FieldPath, slot: Slot<Option<NaiveDate>>) -> FieldSpec {
    FieldSpec {
        name,
        path,
        rule: Rule::Date {
            format: DATE_FORMAT.to_string(),
            slot,
        },
    }
}

fn time(name: &'static str, path: FieldPath, slot: Slot<Option<NaiveTime>>) -> FieldSpec {
    FieldSpec {
        name,
        path,
        rule: Rule::Time {
            format: TIME_FORMAT.to_string(),
            slot,
        },
    }
}

fn timestamp(
    name: &'static str,
    path: FieldPath,
    slot: Slot<Option<DateTime<FixedOffset>>>,
) -> FieldSpec {
    FieldSpec {
        name,
        path,
        rule: Rule::Timestamp {
            format: TIMESTAMP_FORMAT.to_string(),
            slot,
        },
    }
}

fn decimal(
    name: &'static str,
    path: FieldPath,
    fallback: DecimalFallback,
    slot: Slot<Option<Decimal>>,
) -> FieldSpec {
    FieldSpec {
        name,
        path,
        rule: Rule::Decimal { fallback, slot },
    }
}

fn flag(name: &'static str, path: FieldPath, slot: Slot<bool>) -> FieldSpec {
    FieldSpec {
        name,
        path,
        rule: Rule::Flag { truthy: "1", slot },
    }
}

/// Ordered field-mapping table consumed by the record builder.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    specs: Vec<FieldSpec>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::lengow()
    }
}

impl FieldMapping {
    pub fn new(specs: Vec<FieldSpec>) -> Self {
        Self { specs }
    }

    /// Table for the aggregator's order feed.
    pub fn lengow() -> Self {
        use crate::ingest::convert::DecimalFallback::{Null, Zero};
        use crate::ingest::extract::FieldPath as P;
        let d = P::descendant;

        let specs = vec![
            text("marketplace", P::child("marketplace"), |r| &mut r.marketplace),
            text("id_flux", P::child("idFlux"), |r| &mut r.id_flux),
            text(
                "order_status_marketplace",
                P::nested("order_status", "marketplace"),
                |r| &mut r.order_status_marketplace,
            ),
            text(
                "order_status_lengow",
                P::nested("order_status", "lengow"),
                |r| &mut r.order_status_lengow,
            ),
            text("order_id", P::child("order_id"), |r| &mut r.order_id),
            text("order_mrid", P::child("order_mrid"), |r| &mut r.order_mrid),
            text("order_refid", P::child("order_refid"), |r| &mut r.order_refid),
            text("order_external_id", P::child("order_external_id"), |r| {
                &mut r.order_external_id
            }),
            date("order_purchase_date", P::child("order_purchase_date"), |r| {
                &mut r.order_purchase_date
            }),
            time("order_purchase_time", P::child("order_purchase_heure"), |r| {
                &mut r.order_purchase_time
            }),
            date("payment_date", d("payment_date"), |r| &mut r.payment_date),
            time("payment_time", d("payment_heure"), |r| &mut r.payment_time),
            timestamp("tracking_shipped_date", d("tracking_shipped_date"), |r| {
                &mut r.tracking_shipped_date
            }),
            decimal("order_amount", P::child("order_amount"), Null, |r| {
                &mut r.order_amount
            }),
            decimal("order_tax", P::child("order_tax"), Null, |r| &mut r.order_tax),
            decimal("order_shipping", P::child("order_shipping"), Null, |r| {
                &mut r.order_shipping
            }),
            decimal("order_commission", P::child("order_commission"), Null, |r| {
                &mut r.order_commission
            }),
            decimal(
                "order_processing_fee",
                P::child("order_processing_fee"),
                Null,
                |r| &mut r.order_processing_fee,
            ),
            // Frequently omitted for unshipped orders; zero is meaningful.
            decimal("tracking_parcel_weight", d("tracking_parcel_weight"), Zero, |r| {
                &mut r.tracking_parcel_weight
            }),
            text("order_currency", P::child("order_currency"), |r| &mut r.order_currency),
            text("payment_checkout", d("payment_checkout"), |r| &mut r.payment_checkout),
            text("payment_status", d("payment_status"), |r| &mut r.payment_status),
            text("payment_type", d("payment_type"), |r| &mut r.payment_type),
            text("invoice_number", d("invoice_number"), |r| &mut r.invoice_number),
            text("invoice_url", d("invoice_url"), |r| &mut r.invoice_url),
            text("billing_society", d("billing_society"), |r| &mut r.billing_society),
            text("billing_civility", d("billing_civility"), |r| &mut r.billing_civility),
            text("billing_lastname", d("billing_lastname"), |r| &mut r.billing_lastname),
            text("billing_firstname", d("billing_firstname"), |r| {
                &mut r.billing_firstname
            }),
            text("billing_email", d("billing_email"), |r| &mut r.billing_email),
            text(
                "billing_address",
                P::nested("billing_address", "billing_address"),
                |r| &mut r.billing_address,
            ),
            text("billing_address_2", d("billing_address_2"), |r| {
                &mut r.billing_address_2
            }),
            text(
                "billing_address_complement",
                d("billing_address_complement"),
                |r| &mut r.billing_address_complement,
            ),
            text("billing_zipcode", d("billing_zipcode"), |r| &mut r.billing_zipcode),
            text("billing_city", d("billing_city"), |r| &mut r.billing_city),
            text("billing_country", d("billing_country"), |r| &mut r.billing_country),
            text("billing_country_iso", d("billing_country_iso"), |r| {
                &mut r.billing_country_iso
            }),
            text("billing_phone_home", d("billing_phone_home"), |r| {
                &mut r.billing_phone_home
            }),
            text("billing_phone_office", d("billing_phone_office"), |r| {
                &mut r.billing_phone_office
            }),
            text("billing_phone_mobile", d("billing_phone_mobile"), |r| {
                &mut r.billing_phone_mobile
            }),
            text("billing_full_address", d("billing_full_address"), |r| {
                &mut r.billing_full_address
            }),
            text("delivery_society", d("delivery_society"), |r| &mut r.delivery_society),
            text("delivery_civility", d("delivery_civility"), |r| {
                &mut r.delivery_civility
            }),
            text("delivery_lastname", d("delivery_lastname"), |r| {
                &mut r.delivery_lastname
            }),
            text("delivery_firstname", d("delivery_firstname"), |r| {
                &mut r.delivery_firstname
            }),
            text("delivery_email", d("delivery_email"), |r| &mut r.delivery_email),
            text(
                "delivery_address",
                P::nested("delivery_address", "delivery_address"),
                |r| &mut r.delivery_address,
            ),
            text("delivery_address_2", d("delivery_address_2"), |r| {
                &mut r.delivery_address_2
            }),
            text(
                "delivery_address_complement",
                d("delivery_address_complement"),
                |r| &mut r.delivery_address_complement,
            ),
            text("delivery_zipcode", d("delivery_zipcode"), |r| &mut r.delivery_zipcode),
            text("delivery_city", d("delivery_city"), |r| &mut r.delivery_city),
            text("delivery_country", d("delivery_country"), |r| &mut r.delivery_country),
            text("delivery_country_iso", d("delivery_country_iso"), |r| {
                &mut r.delivery_country_iso
            }),
            text("delivery_phone_home", d("delivery_phone_home"), |r| {
                &mut r.delivery_phone_home
            }),
            text("delivery_phone_office", d("delivery_phone_office"), |r| {
                &mut r.delivery_phone_office
            }),
            text("delivery_phone_mobile", d("delivery_phone_mobile"), |r| {
                &mut r.delivery_phone_mobile
            }),
            text("delivery_full_address", d("delivery_full_address"), |r| {
                &mut r.delivery_full_address
            }),
            text("tracking_method", d("tracking_method"), |r| &mut r.tracking_method),
            text("tracking_carrier", d("tracking_carrier"), |r| &mut r.tracking_carrier),
            text("tracking_number", d("tracking_number"), |r| &mut r.tracking_number),
            text("tracking_url", d("tracking_url"), |r| &mut r.tracking_url),
            text("tracking_relay", d("tracking_relay"), |r| &mut r.tracking_relay),
            flag(
                "tracking_delivering_by_marketplace",
                d("tracking_deliveringByMarketPlace"),
                |r| &mut r.tracking_delivering_by_marketplace,
            ),
            text("order_comments", d("order_comments"), |r| &mut r.order_comments),
            text("customer_id", d("customer_id"), |r| &mut r.customer_id),
        ];

        Self { specs }
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut FieldSpec, MappingError> {
        self.specs
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| MappingError::UnknownField(name.to_string()))
    }

    /// Read `name` from a different location (`child`, `a/b` or `.//child`).
    pub fn with_path(mut self, name: &str, expr: &str) -> Result<Self, MappingError> {
        let path = FieldPath::parse(expr).map_err(|source| MappingError::Path {
            field: name.to_string(),
            source,
        })?;
        self.get_mut(name)?.path = path;
        Ok(self)
    }

    /// Parse date/time field `name` with a different strftime format.
    pub fn with_format(mut self, name: &str, format: &str) -> Result<Self, MappingError> {
        let spec = self.get_mut(name)?;
        match spec.rule.format_mut() {
            Some(f) => *f = format.to_string(),
            None => return Err(MappingError::NotTemporal(name.to_string())),
        }
        Ok(self)
    }
}
