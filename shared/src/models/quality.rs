//! Quality inspection readings and FAT/SNF metrics

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{parse_reading, round3};

/// Accept/reject status on an inspection reading row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReadingStatus {
    Accepted,
    Rejected,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl ReadingStatus {
    /// Qualitative reading value derived for non-numeric rows
    pub fn reading_value(self) -> &'static str {
        match self {
            ReadingStatus::Accepted => "Ok",
            ReadingStatus::Rejected => "Not Ok",
            ReadingStatus::Unset => "",
        }
    }
}

/// Edits on a reading row that re-derive `reading_value`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum ReadingEvent {
    StatusChanged(ReadingStatus),
    NumericToggled(bool),
}

/// One row of a quality inspection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualityInspectionReading {
    #[serde(default)]
    pub specification: String,
    #[serde(default)]
    pub numeric: bool,
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(default)]
    pub reading_value: String,
    /// First numeric reading as entered on the form
    #[serde(default)]
    pub reading_1: Option<String>,
}

impl QualityInspectionReading {
    pub fn numeric(specification: impl Into<String>, reading: impl Into<String>) -> Self {
        Self {
            specification: specification.into(),
            numeric: true,
            reading_1: Some(reading.into()),
            ..Default::default()
        }
    }

    pub fn qualitative(specification: impl Into<String>, status: ReadingStatus) -> Self {
        let mut reading = Self {
            specification: specification.into(),
            status,
            ..Default::default()
        };
        reading.derive_reading_value();
        reading
    }

    /// Apply an edit and re-derive `reading_value`.
    ///
    /// | numeric | event                 | reading_value        |
    /// |---------|-----------------------|----------------------|
    /// | false   | status changed        | status mapping       |
    /// | true    | status changed        | unchanged            |
    /// | any     | numeric → false       | status mapping       |
    /// | any     | numeric → true        | cleared              |
    pub fn apply(&mut self, event: ReadingEvent) {
        match (self.numeric, event) {
            (false, ReadingEvent::StatusChanged(status)) => {
                self.status = status;
                self.derive_reading_value();
            }
            (true, ReadingEvent::StatusChanged(status)) => {
                self.status = status;
            }
            (_, ReadingEvent::NumericToggled(false)) => {
                self.numeric = false;
                self.derive_reading_value();
            }
            (_, ReadingEvent::NumericToggled(true)) => {
                self.numeric = true;
                self.reading_value.clear();
            }
        }
    }

    /// The value as shown on reports: the numeric reading when entered,
    /// otherwise the qualitative value
    pub fn display_value(&self) -> &str {
        match self.reading_1.as_deref() {
            Some(reading) if !reading.is_empty() => reading,
            _ => &self.reading_value,
        }
    }

    /// Bring `reading_value` in line with `numeric` and `status`
    pub fn derive_reading_value(&mut self) {
        self.reading_value = if self.numeric {
            String::new()
        } else {
            self.status.reading_value().to_string()
        };
    }
}

/// Re-derive every reading of an inspection, as done when it is saved
pub fn normalize_readings(readings: &mut [QualityInspectionReading]) {
    for reading in readings.iter_mut() {
        reading.derive_reading_value();
    }
}

/// What an inspection was raised against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InspectionType {
    #[default]
    Incoming,
    Outgoing,
    #[serde(rename = "In Process")]
    InProcess,
    /// Re-test of milk already held in a warehouse
    Internal,
}

/// Lifecycle of an inspection document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

impl DocStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocStatus::Draft => "draft",
            DocStatus::Submitted => "submitted",
            DocStatus::Cancelled => "cancelled",
        }
    }

    /// Unknown values read back as a draft
    pub fn parse(raw: &str) -> Self {
        match raw {
            "submitted" => DocStatus::Submitted,
            "cancelled" => DocStatus::Cancelled,
            _ => DocStatus::Draft,
        }
    }
}

/// A quality inspection with its readings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualityInspection {
    pub name: String,
    #[serde(default)]
    pub inspection_type: InspectionType,
    #[serde(default)]
    pub docstatus: DocStatus,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default, rename = "custom_warehouse", alias = "warehouse")]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub reference_type: Option<String>,
    /// The Purchase Receipt for incoming raw milk
    #[serde(default)]
    pub reference_name: Option<String>,
    #[serde(default)]
    pub report_date: Option<NaiveDate>,
    #[serde(default, rename = "custom_in_time")]
    pub in_time: Option<String>,
    #[serde(default, rename = "custom_out_time")]
    pub out_time: Option<String>,
    #[serde(default, rename = "custom_mbrt_start_time")]
    pub mbrt_start_time: Option<String>,
    #[serde(default, rename = "custom_mbrt_end_time")]
    pub mbrt_end_time: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub readings: Vec<QualityInspectionReading>,
}

/// Measured parameter a reading row stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityParameter {
    Fat,
    Snf,
    LactometerReading,
}

impl QualityParameter {
    /// Recognise a specification name, ignoring case and surrounding spaces
    pub fn from_specification(specification: &str) -> Option<Self> {
        match specification.trim().to_uppercase().as_str() {
            "FAT" => Some(QualityParameter::Fat),
            "SNF" | "S.N.F." | "S N F" => Some(QualityParameter::Snf),
            "LR" | "L.R." => Some(QualityParameter::LactometerReading),
            _ => None,
        }
    }
}

/// FAT/SNF percentages read off an inspection, before scaling to a quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityPercentages {
    pub fat: Decimal,
    pub snf: Decimal,
    pub lr: Decimal,
}

impl QualityInspection {
    /// Scan readings in order; later rows for the same parameter win.
    /// When SNF was not measured it is derived from FAT and LR.
    pub fn percentages(&self) -> QualityPercentages {
        let mut fat = Decimal::ZERO;
        let mut snf = None;
        let mut lr = Decimal::ZERO;

        for reading in &self.readings {
            let value = parse_reading(reading.reading_1.as_deref());
            match QualityParameter::from_specification(&reading.specification) {
                Some(QualityParameter::Fat) => fat = value,
                Some(QualityParameter::Snf) => snf = Some(value),
                Some(QualityParameter::LactometerReading) => lr = value,
                None => {}
            }
        }

        let snf = match snf {
            Some(snf) => snf,
            None if !fat.is_zero() && !lr.is_zero() => snf_from_lactometer(fat, lr),
            None => Decimal::ZERO,
        };

        QualityPercentages { fat, snf, lr }
    }
}

/// SNF % from FAT % and lactometer reading: `fat/4 + 0.2*lr + 0.14`
pub fn snf_from_lactometer(fat: Decimal, lr: Decimal) -> Decimal {
    fat / Decimal::from(4) + Decimal::new(2, 1) * lr + Decimal::new(14, 2)
}

/// FAT/SNF figures for one line, scaled to its quantity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QualityMetrics {
    #[serde(rename = "fat")]
    pub fat_percent: Decimal,
    #[serde(rename = "snf")]
    pub snf_percent: Decimal,
    pub fat_kg: Decimal,
    pub snf_kg: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr: Option<Decimal>,
}

impl QualityMetrics {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale percentages to `quantity`, rounding every field to 3 dp
    pub fn from_percentages(percentages: QualityPercentages, quantity: Decimal, with_lr: bool) -> Self {
        let line = crate::aggregation::aggregate_line(quantity, percentages.fat, percentages.snf);
        Self {
            fat_percent: round3(percentages.fat),
            snf_percent: round3(percentages.snf),
            fat_kg: round3(line.fat_kg),
            snf_kg: round3(line.snf_kg),
            lr: with_lr.then(|| round3(percentages.lr)),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.fat_percent.is_zero()
            && self.snf_percent.is_zero()
            && self.fat_kg.is_zero()
            && self.snf_kg.is_zero()
    }
}
