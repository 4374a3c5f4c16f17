// src/ingest/convert.rs
//! Lenient typed conversions. Unparsable input is an expected condition in
//! this feed, so every conversion reports it as `None` instead of an error.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use rust_decimal::Decimal;

/// Parse a fixed-precision decimal; `None` for empty or non-numeric text.
pub fn to_decimal(text: &str) -> Option<Decimal> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    Decimal::from_str(t)
        .or_else(|_| Decimal::from_scientific(t))
        .ok()
}

/// What a decimal field holds when its text does not convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalFallback {
    Null,
    Zero,
}

impl DecimalFallback {
    pub fn apply(self, parsed: Option<Decimal>) -> Option<Decimal> {
        match (parsed, self) {
            (Some(v), _) => Some(v),
            (None, DecimalFallback::Null) => None,
            (None, DecimalFallback::Zero) => Some(Decimal::ZERO),
        }
    }
}

/// Parse `text` with a strftime-style `format`.
///
/// Date-only formats give midnight; time-only formats are placed on
/// 1900-01-01. `None` when the text does not match the format.
pub fn to_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, format) {
        return Some(d.and_time(NaiveTime::MIN));
    }
    if let Ok(t) = NaiveTime::parse_from_str(text, format) {
        return NaiveDate::from_ymd_opt(1900, 1, 1).map(|d| d.and_time(t));
    }
    None
}

/// Like [`to_datetime`], substituting `default` on failure.
pub fn to_datetime_or(text: &str, format: &str, default: NaiveDateTime) -> NaiveDateTime {
    to_datetime(text, format).unwrap_or(default)
}

/// Zone that naive feed timestamps are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalZone {
    /// The host's local zone (DST-aware).
    System,
    Fixed(FixedOffset),
}

impl Default for LocalZone {
    fn default() -> Self {
        LocalZone::Fixed(Utc.fix())
    }
}

impl LocalZone {
    /// Attach the zone to a wall-clock value. `None` only when the value
    /// falls into a DST gap of the system zone.
    pub fn attach(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            LocalZone::Fixed(off) => off.from_local_datetime(&naive).single(),
            LocalZone::System => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }
}

/// Accepts `local`, `UTC`/`Z`, or an offset like `+01:00` / `-0530`.
impl FromStr for LocalZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") || s.eq_ignore_ascii_case("system") {
            return Ok(LocalZone::System);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(LocalZone::default());
        }

        let bad = || format!("invalid timezone '{s}' (expected local, UTC or ±HH:MM)");
        let (sign, rest) = match s.chars().next() {
            Some('+') => (1, &s[1..]),
            Some('-') => (-1, &s[1..]),
            _ => return Err(bad()),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| bad())?;
        let minutes: i32 = digits[2..].parse().map_err(|_| bad())?;
        if minutes >= 60 {
            return Err(bad());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(LocalZone::Fixed)
            .ok_or_else(bad)
    }
}

impl fmt::Display for LocalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalZone::System => write!(f, "local"),
            LocalZone::Fixed(off) => write!(f, "{off}"),
        }
    }
}
