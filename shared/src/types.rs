//! Common types used across the platform

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Precision used for every quality reading and mass stored on a line
pub const QUALITY_PRECISION: u32 = 3;

/// Precision used for monetary amounts
pub const AMOUNT_PRECISION: u32 = 2;

/// Density of raw milk used to convert weighbridge kilograms to litres
pub const DEFAULT_KG_PER_LITRE: Decimal = Decimal::from_parts(10339, 0, 0, false, 4);

/// Round half away from zero, the way the ERP's `flt(value, precision)` does
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to the 3 decimal places mandated for quality values
pub fn round3(value: Decimal) -> Decimal {
    round_to(value, QUALITY_PRECISION)
}

/// Parse a loosely typed reading (`"4.5"`, `" 8 "`, `""`) into a decimal,
/// treating anything unparsable as zero
pub fn parse_reading(raw: Option<&str>) -> Decimal {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO)
}

/// Accepts whatever the form sends for a numeric field: a number, a numeric
/// string, `""`, `null` or junk. Blank and unparsable values come out as `None`.
struct LenientDecimal;

impl<'de> Visitor<'de> for LenientDecimal {
    type Value = Option<Decimal>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(v.to_string().parse::<Decimal>().ok())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(None);
        }
        Ok(v.parse::<Decimal>().ok())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// `deserialize_with` for host-supplied numbers; missing or non-numeric reads as zero
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserializer.deserialize_any(LenientDecimal)?.unwrap_or(Decimal::ZERO))
}

/// Like [`lenient_decimal`] for optional fields, which stay unset when blank
pub fn lenient_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientDecimal)
}

/// The kind of ERP document whose lines are being aggregated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PurchaseReceipt,
    StockEntry,
    WorkOrder,
    Bom,
    /// Only posts to the ledger; never aggregated as a document
    QualityInspection,
}

impl DocumentKind {
    /// Name of the doctype as the hosting ERP spells it
    pub fn doctype(&self) -> &'static str {
        match self {
            DocumentKind::PurchaseReceipt => "Purchase Receipt",
            DocumentKind::StockEntry => "Stock Entry",
            DocumentKind::WorkOrder => "Work Order",
            DocumentKind::Bom => "BOM",
            DocumentKind::QualityInspection => "Quality Inspection",
        }
    }

    pub fn from_doctype(doctype: &str) -> Option<Self> {
        match doctype {
            "Purchase Receipt" => Some(DocumentKind::PurchaseReceipt),
            "Stock Entry" => Some(DocumentKind::StockEntry),
            "Work Order" => Some(DocumentKind::WorkOrder),
            "BOM" => Some(DocumentKind::Bom),
            "Quality Inspection" => Some(DocumentKind::QualityInspection),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.doctype())
    }
}

/// Date range for ledger queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::CoreResult<Self> {
        if start > end {
            return Err(crate::CoreError::InvalidDateRange {
                from: start,
                to: end,
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
