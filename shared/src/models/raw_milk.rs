//! Raw Milk Testing Report
//!
//! One row per submitted inspection: the tanker it came in on, the MBRT
//! test window and the value recorded for each tested parameter.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DocStatus, QualityInspection, QualityInspectionReading};
use crate::duration::{elapsed_seconds_str, format_duration};
use crate::error::CoreResult;
use crate::types::DateRange;

/// Specification name on the inspection and the report column it fills
pub const TEST_PARAMETERS: &[(&str, &str)] = &[
    ("Temp", "temp"),
    ("Fat", "fat"),
    ("LR", "lr"),
    ("SNF", "snf"),
    ("Alcohol", "alcohol"),
    ("Acidity", "acidity"),
    ("Ammonia", "ammonia"),
    ("MBRT", "mbrt"),
    ("Sucrose", "sucrose"),
    ("Starch", "starch"),
    ("Neutralizer", "neutralizer"),
    ("Detergent", "detergent"),
    ("Urea", "urea"),
    ("Maltose", "maltose"),
    ("BR", "br"),
    ("RM", "rm"),
    ("Wash RM", "wash_rm"),
    ("Channa", "channa"),
];

/// Report filters; the date range applies to the inspection's report date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawMilkTestFilter {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub quality_inspection: Option<String>,
    #[serde(default)]
    pub purchase_receipt: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl RawMilkTestFilter {
    pub fn date_range(&self) -> CoreResult<DateRange> {
        DateRange::new(self.from_date, self.to_date)
    }

    /// Submitted, reported within the range, and matching the name and
    /// receipt filters when given
    pub fn matches_inspection(&self, inspection: &QualityInspection) -> bool {
        let in_range = inspection
            .report_date
            .map_or(false, |date| date >= self.from_date && date <= self.to_date);
        inspection.docstatus == DocStatus::Submitted
            && in_range
            && self
                .quality_inspection
                .as_deref()
                .map_or(true, |name| name == inspection.name)
            && self
                .purchase_receipt
                .as_deref()
                .map_or(true, |pr| inspection.reference_name.as_deref() == Some(pr))
    }

    /// With a supplier filter, rows without a receipt from that supplier drop out
    pub fn matches_receipt(&self, receipt: Option<&ReceiptSummary>) -> bool {
        match self.supplier.as_deref() {
            Some(supplier) => receipt.map_or(false, |r| r.supplier == supplier),
            None => true,
        }
    }
}

/// Purchase Receipt header fields shown next to the inspection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub name: String,
    pub supplier: String,
    #[serde(default, rename = "custom_supplier_code")]
    pub supplier_code: Option<String>,
    #[serde(default, rename = "custom_tanker_no")]
    pub tanker_no: Option<String>,
    #[serde(default, rename = "custom_net_weight")]
    pub net_weight: Option<Decimal>,
}

/// One report row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RawMilkTestRow {
    pub qi_id: String,
    pub pr_id: Option<String>,
    pub tanker_no: Option<String>,
    pub supplier: Option<String>,
    pub supplier_code: Option<String>,
    pub mbrt_start_time: Option<String>,
    pub mbrt_end_time: Option<String>,
    /// `HH:MM:SS`, unset when either end is missing or the end precedes the start
    pub mbrt_total_time: Option<String>,
    pub in_time: Option<String>,
    pub out_time: Option<String>,
    pub net_weight: Option<Decimal>,
    #[serde(flatten)]
    pub parameters: BTreeMap<&'static str, String>,
    pub remarks: Option<String>,
}

/// Report column values keyed by column name; untested parameters are blank
pub fn test_parameters(readings: &[QualityInspectionReading]) -> BTreeMap<&'static str, String> {
    let mut values: BTreeMap<&'static str, String> =
        TEST_PARAMETERS.iter().map(|(_, column)| (*column, String::new())).collect();
    for reading in readings {
        let column = TEST_PARAMETERS
            .iter()
            .find(|(specification, _)| *specification == reading.specification)
            .map(|(_, column)| *column);
        if let Some(column) = column {
            values.insert(column, reading.display_value().to_string());
        }
    }
    values
}

/// MBRT test duration from the start and end entered on the inspection
pub fn mbrt_total_time(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let (start, end) = (start.filter(|s| !s.is_empty())?, end.filter(|s| !s.is_empty())?);
    elapsed_seconds_str(start, end).ok().map(format_duration)
}

/// Build the report row for an inspection and its receipt, if any
pub fn raw_milk_test_row(inspection: &QualityInspection, receipt: Option<&ReceiptSummary>) -> RawMilkTestRow {
    RawMilkTestRow {
        qi_id: inspection.name.clone(),
        pr_id: receipt.map(|r| r.name.clone()),
        tanker_no: receipt.and_then(|r| r.tanker_no.clone()),
        supplier: receipt.map(|r| r.supplier.clone()),
        supplier_code: receipt.and_then(|r| r.supplier_code.clone()),
        mbrt_start_time: inspection.mbrt_start_time.clone(),
        mbrt_end_time: inspection.mbrt_end_time.clone(),
        mbrt_total_time: mbrt_total_time(
            inspection.mbrt_start_time.as_deref(),
            inspection.mbrt_end_time.as_deref(),
        ),
        in_time: inspection.in_time.clone(),
        out_time: inspection.out_time.clone(),
        net_weight: receipt.and_then(|r| r.net_weight),
        parameters: test_parameters(&inspection.readings),
        remarks: inspection.remarks.clone(),
    }
}
