//! Transaction documents (Purchase Receipt, Stock Entry, Work Order, BOM)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::QualityMetrics;
use crate::types::{lenient_decimal, lenient_decimal_opt, DocumentKind};

/// Whether quality values on a line came from an inspection fetch yet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityFetchState {
    #[default]
    NotFetched,
    Fetched,
}

/// One item row of a transaction document.
///
/// Field names on the wire follow the ERP's custom fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionLine {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub uom: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default, alias = "qty", alias = "required_qty", deserialize_with = "lenient_decimal")]
    pub quantity: Decimal,
    #[serde(default)]
    pub quality_inspection: Option<String>,
    #[serde(default)]
    pub is_finished_item: bool,
    #[serde(default, rename = "custom_is_milk_type")]
    pub is_milk_type: bool,
    #[serde(default, rename = "custom_milk_type")]
    pub milk_type: Option<String>,
    #[serde(default, rename = "custom_fat", deserialize_with = "lenient_decimal")]
    pub fat_percent: Decimal,
    #[serde(default, rename = "custom_snf", deserialize_with = "lenient_decimal")]
    pub snf_percent: Decimal,
    #[serde(default, rename = "custom_fat_kg", deserialize_with = "lenient_decimal")]
    pub fat_kg: Decimal,
    #[serde(default, rename = "custom_snf_kg", deserialize_with = "lenient_decimal")]
    pub snf_kg: Decimal,
    #[serde(default, rename = "custom_lr", deserialize_with = "lenient_decimal")]
    pub lr: Decimal,
    #[serde(default, rename = "custom_actual_qty", deserialize_with = "lenient_decimal_opt")]
    pub actual_qty: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub primary_uom_qty: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub secondary_uom_qty: Option<Decimal>,
    #[serde(default)]
    pub quality_fetch: QualityFetchState,
    /// Sequence number of the latest lookup issued for this line
    #[serde(default)]
    pub request_seq: u64,
}

impl Default for TransactionLine {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            item_code: None,
            uom: None,
            warehouse: None,
            quantity: Decimal::ZERO,
            quality_inspection: None,
            is_finished_item: false,
            is_milk_type: false,
            milk_type: None,
            fat_percent: Decimal::ZERO,
            snf_percent: Decimal::ZERO,
            fat_kg: Decimal::ZERO,
            snf_kg: Decimal::ZERO,
            lr: Decimal::ZERO,
            actual_qty: None,
            primary_uom_qty: None,
            secondary_uom_qty: None,
            quality_fetch: QualityFetchState::NotFetched,
            request_seq: 0,
        }
    }
}

impl TransactionLine {
    pub fn new(item_code: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            item_code: Some(item_code.into()),
            quantity,
            ..Default::default()
        }
    }

    /// True when any quality figure has already been set on the line
    pub fn has_quality_values(&self) -> bool {
        !self.fat_percent.is_zero() || !self.fat_kg.is_zero() || !self.snf_kg.is_zero()
    }

    /// Overwrite the line's quality fields with fetched metrics
    pub fn set_quality(&mut self, metrics: &QualityMetrics) {
        self.fat_percent = metrics.fat_percent;
        self.snf_percent = metrics.snf_percent;
        self.fat_kg = metrics.fat_kg;
        self.snf_kg = metrics.snf_kg;
        self.lr = metrics.lr.unwrap_or(Decimal::ZERO);
    }

    /// Reset every quality field to zero
    pub fn clear_quality(&mut self) {
        self.set_quality(&QualityMetrics::zero());
        self.quality_fetch = QualityFetchState::NotFetched;
    }

    /// Whether a quality refresh from the linked inspection may run.
    ///
    /// Stock Entry finished items are fetched once: values already on the
    /// line, entered or fetched, are kept.
    pub fn accepts_quality_fetch(&self, kind: DocumentKind) -> bool {
        if kind == DocumentKind::StockEntry && self.is_finished_item {
            return !self.has_quality_values() && self.quality_fetch == QualityFetchState::NotFetched;
        }
        true
    }

    /// Recompute `fat_kg`/`snf_kg` from quantity and percentages
    pub fn recalculate_masses(&mut self) {
        let masses = crate::aggregation::aggregate_line(self.quantity, self.fat_percent, self.snf_percent);
        self.fat_kg = masses.fat_kg;
        self.snf_kg = masses.snf_kg;
    }
}

/// Which totals a document kind emits and how they are rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationProfile {
    /// Emit unweighted sums of per-line percentages next to the weighted pair
    pub emit_percentage_sums: bool,
    /// Round totals to this many places
    pub round_dp: Option<u32>,
}

impl DocumentKind {
    pub fn aggregation_profile(&self) -> AggregationProfile {
        match self {
            DocumentKind::PurchaseReceipt | DocumentKind::StockEntry | DocumentKind::QualityInspection => {
                AggregationProfile {
                    emit_percentage_sums: false,
                    round_dp: None,
                }
            }
            DocumentKind::WorkOrder => AggregationProfile {
                emit_percentage_sums: true,
                round_dp: Some(crate::types::QUALITY_PRECISION),
            },
            DocumentKind::Bom => AggregationProfile {
                emit_percentage_sums: true,
                round_dp: None,
            },
        }
    }

    /// Only Purchase Receipt lines carry a lactometer reading
    pub fn carries_lactometer_reading(&self) -> bool {
        matches!(self, DocumentKind::PurchaseReceipt)
    }
}

/// Document-level totals, a pure fold over the current lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DocumentTotals {
    #[serde(rename = "custom_total_quantity", deserialize_with = "lenient_decimal")]
    pub total_quantity: Decimal,
    #[serde(rename = "custom_total_fat_kg", deserialize_with = "lenient_decimal")]
    pub total_fat_kg: Decimal,
    #[serde(rename = "custom_total_snf_kg", deserialize_with = "lenient_decimal")]
    pub total_snf_kg: Decimal,
    #[serde(rename = "custom_fat_percentage", deserialize_with = "lenient_decimal")]
    pub fat_percentage: Decimal,
    #[serde(rename = "custom_snf_percentage", deserialize_with = "lenient_decimal")]
    pub snf_percentage: Decimal,
    #[serde(
        rename = "custom_total_fat_percentage",
        deserialize_with = "lenient_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_fat_percentage: Option<Decimal>,
    #[serde(
        rename = "custom_total_snf_percentage",
        deserialize_with = "lenient_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_snf_percentage: Option<Decimal>,
}

/// Purpose of a Stock Entry, which decides what it posts to the milk ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StockEntryType {
    #[serde(rename = "Manufacture")]
    Manufacture,
    #[serde(rename = "Material Issue")]
    MaterialIssue,
    #[serde(rename = "Material Receipt")]
    MaterialReceipt,
    #[serde(rename = "Material Transfer")]
    MaterialTransfer,
}

/// A transaction document with its lines and derived totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDocument {
    pub kind: DocumentKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_entry_type: Option<StockEntryType>,
    /// Weighbridge net weight in kg, used as the priced weight when present
    #[serde(
        default,
        rename = "custom_net_weight",
        deserialize_with = "lenient_decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub net_weight: Option<Decimal>,
    #[serde(default, alias = "items", alias = "required_items")]
    pub lines: Vec<TransactionLine>,
    #[serde(flatten)]
    pub totals: DocumentTotals,
}

impl TransactionDocument {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            name: None,
            supplier: None,
            stock_entry_type: None,
            net_weight: None,
            lines: Vec::new(),
            totals: DocumentTotals::default(),
        }
    }

    pub fn with_line(mut self, line: TransactionLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn line(&self, id: Uuid) -> Option<&TransactionLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: Uuid) -> Option<&mut TransactionLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    /// Add a line and refresh totals
    pub fn add_line(&mut self, line: TransactionLine) {
        self.lines.push(line);
        self.recalculate_totals();
    }

    /// Remove a line and refresh totals
    pub fn remove_line(&mut self, id: Uuid) -> Option<TransactionLine> {
        let index = self.lines.iter().position(|l| l.id == id)?;
        let removed = self.lines.remove(index);
        self.recalculate_totals();
        Some(removed)
    }

    /// Recompute totals from the full set of lines
    pub fn recalculate_totals(&mut self) {
        self.totals = crate::aggregation::aggregate_document(&self.lines, self.kind.aggregation_profile());
    }
}

/// FAT/SNF percentages carried by one BOM row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BomQuality {
    pub item_code: String,
    #[serde(default, rename = "custom_fat", deserialize_with = "lenient_decimal")]
    pub fat_percent: Decimal,
    #[serde(default, rename = "custom_snf", deserialize_with = "lenient_decimal")]
    pub snf_percent: Decimal,
}

impl TransactionDocument {
    /// Copy BOM percentages onto every raw-material line whose item the BOM
    /// lists, with masses from the quantity rounded to 3 places.
    ///
    /// Returns the number of lines updated.
    pub fn apply_bom_quality(&mut self, bom: &[BomQuality]) -> usize {
        let mut updated = 0;
        for line in self.lines.iter_mut().filter(|l| !l.is_finished_item) {
            let Some(item_code) = line.item_code.as_deref() else {
                continue;
            };
            let Some(row) = bom.iter().find(|b| b.item_code == item_code) else {
                continue;
            };
            let quantity = crate::types::round3(line.quantity);
            let masses = crate::aggregation::aggregate_line(quantity, row.fat_percent, row.snf_percent);
            line.fat_percent = row.fat_percent;
            line.snf_percent = row.snf_percent;
            line.fat_kg = crate::types::round3(masses.fat_kg);
            line.snf_kg = crate::types::round3(masses.snf_kg);
            updated += 1;
        }
        self.recalculate_totals();
        updated
    }
}

/// Severity of a line-level notice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Human-readable message raised while deriving a line's fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineNotice {
    pub line_id: Uuid,
    pub level: NoticeLevel,
    /// Field that was cleared or zeroed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl LineNotice {
    pub fn warning(line_id: Uuid, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line_id,
            level: NoticeLevel::Warning,
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn error(line_id: Uuid, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line_id,
            level: NoticeLevel::Error,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}
