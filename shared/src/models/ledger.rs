//! Milk Quality Ledger
//!
//! Every submitted movement of milk records the FAT/SNF it carried, so the
//! quality of what sits in a warehouse can be traced and reused downstream.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Item, QualityInspection, QualityMetrics, StockEntryType, TransactionDocument, TransactionLine};
use crate::aggregation::aggregate_line;
use crate::conversion::convert_stock_qty;
use crate::error::CoreResult;
use crate::types::{round3, DateRange, DocumentKind};

/// Whether milk entered or left the warehouse
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerDirection {
    Inward,
    Outward,
    /// Stock on hand re-tested in place; nothing moved
    Retest,
}

impl LedgerDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerDirection::Inward => "inward",
            LedgerDirection::Outward => "outward",
            LedgerDirection::Retest => "retest",
        }
    }
}

/// Where a posted entry takes its FAT/SNF from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySource {
    /// The line's own inspected values
    Line,
    /// The latest ledger entry for the same item and warehouse
    LatestEntry,
}

/// One posted ledger row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilkQualityLedgerEntry {
    pub id: Uuid,
    pub item_code: String,
    pub warehouse: String,
    pub voucher_type: DocumentKind,
    pub voucher_no: String,
    /// Source line; inspections post without one
    pub voucher_detail_no: Option<Uuid>,
    pub posting_date: NaiveDate,
    pub posting_time: NaiveTime,
    pub direction: LedgerDirection,
    pub stock_uom: String,
    pub uom: String,
    #[serde(rename = "fat_per")]
    pub fat_percent: Decimal,
    #[serde(rename = "snf_per")]
    pub snf_percent: Decimal,
    #[serde(rename = "fat")]
    pub fat_kg: Decimal,
    #[serde(rename = "snf")]
    pub snf_kg: Decimal,
    pub qty_in_kg: Decimal,
    pub qty_in_litre: Decimal,
    pub qty_after_transaction_in_kg: Decimal,
    pub qty_after_transaction_in_litre: Decimal,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl MilkQualityLedgerEntry {
    /// This entry's percentages applied to another quantity
    pub fn scaled_to(&self, quantity: Decimal) -> QualityMetrics {
        let masses = aggregate_line(quantity, self.fat_percent, self.snf_percent);
        QualityMetrics {
            fat_percent: round3(self.fat_percent),
            snf_percent: round3(self.snf_percent),
            fat_kg: round3(masses.fat_kg),
            snf_kg: round3(masses.snf_kg),
            lr: None,
        }
    }
}

/// Voucher header shared by every entry of one posting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerVoucher {
    pub voucher_no: String,
    pub posting_date: NaiveDate,
    pub posting_time: NaiveTime,
}

/// A line selected for posting
#[derive(Debug, Clone, Copy)]
pub struct LedgerCandidate<'a> {
    pub line: &'a TransactionLine,
    pub direction: LedgerDirection,
    pub source: QualitySource,
}

/// Select the lines of a submitted document that post to the ledger.
///
/// Purchase Receipts post every milk line inward. A Manufacture Stock Entry
/// posts finished milk inward and consumed raw milk outward; a Material Issue
/// posts every milk line outward. Nothing else posts.
pub fn ledger_candidates(doc: &TransactionDocument) -> Vec<LedgerCandidate<'_>> {
    let pick = |line: &TransactionLine| -> Option<(LedgerDirection, QualitySource)> {
        if !line.is_milk_type {
            return None;
        }
        match (doc.kind, doc.stock_entry_type) {
            (DocumentKind::PurchaseReceipt, _) => Some((LedgerDirection::Inward, QualitySource::Line)),
            (DocumentKind::StockEntry, Some(StockEntryType::Manufacture)) if line.is_finished_item => {
                Some((LedgerDirection::Inward, QualitySource::Line))
            }
            (DocumentKind::StockEntry, Some(StockEntryType::Manufacture)) => {
                Some((LedgerDirection::Outward, QualitySource::LatestEntry))
            }
            (DocumentKind::StockEntry, Some(StockEntryType::MaterialIssue)) => {
                Some((LedgerDirection::Outward, QualitySource::LatestEntry))
            }
            _ => None,
        }
    };

    doc.lines
        .iter()
        .filter_map(|line| {
            pick(line).map(|(direction, source)| LedgerCandidate {
                line,
                direction,
                source,
            })
        })
        .collect()
}

/// Inputs gathered from collaborators for one candidate line
#[derive(Debug, Clone)]
pub struct LedgerEntryInput<'a> {
    pub voucher_type: DocumentKind,
    pub voucher: &'a LedgerVoucher,
    pub candidate: LedgerCandidate<'a>,
    pub item: &'a Item,
    pub warehouse: &'a str,
    pub litre_uom: &'a str,
    /// Stock balance in stock UOM after this transaction
    pub balance_after: Decimal,
    /// Latest entry for the same item and warehouse, if any
    pub latest: Option<&'a MilkQualityLedgerEntry>,
}

/// Build the ledger row for one line.
///
/// Fails with `ConfigurationMissing` when the item has no litre conversion.
pub fn build_ledger_entry(input: LedgerEntryInput<'_>) -> CoreResult<MilkQualityLedgerEntry> {
    let line = input.candidate.line;
    let qty_in_kg = line.quantity;
    let qty_in_litre = round3(convert_stock_qty(input.item, qty_in_kg, input.litre_uom)?);
    let balance_litre = round3(convert_stock_qty(input.item, input.balance_after, input.litre_uom)?);

    let quality = match input.candidate.source {
        QualitySource::Line => QualityMetrics {
            fat_percent: line.fat_percent,
            snf_percent: line.snf_percent,
            fat_kg: line.fat_kg,
            snf_kg: line.snf_kg,
            lr: None,
        },
        QualitySource::LatestEntry => input
            .latest
            .map(|entry| entry.scaled_to(qty_in_kg))
            .unwrap_or_else(QualityMetrics::zero),
    };

    Ok(MilkQualityLedgerEntry {
        id: Uuid::new_v4(),
        item_code: input.item.item_code.clone(),
        warehouse: input.warehouse.to_string(),
        voucher_type: input.voucher_type,
        voucher_no: input.voucher.voucher_no.clone(),
        voucher_detail_no: Some(line.id),
        posting_date: input.voucher.posting_date,
        posting_time: input.voucher.posting_time,
        direction: input.candidate.direction,
        stock_uom: input.item.stock_uom.clone(),
        uom: input.litre_uom.to_string(),
        fat_percent: quality.fat_percent,
        snf_percent: quality.snf_percent,
        fat_kg: quality.fat_kg,
        snf_kg: quality.snf_kg,
        qty_in_kg,
        qty_in_litre,
        qty_after_transaction_in_kg: input.balance_after,
        qty_after_transaction_in_litre: balance_litre,
        is_cancelled: false,
        created_at: Utc::now(),
    })
}

/// Inputs for the entry an Internal quality inspection posts
#[derive(Debug, Clone)]
pub struct InspectionEntryInput<'a> {
    pub inspection: &'a QualityInspection,
    pub voucher: &'a LedgerVoucher,
    pub item: &'a Item,
    pub warehouse: &'a str,
    pub litre_uom: &'a str,
    /// Stock on hand in stock UOM when the inspection is submitted
    pub balance: Decimal,
}

/// Build the entry recording re-tested quality on the whole balance held.
///
/// FAT/SNF percentages come from the inspection readings; the masses are
/// those percentages applied to the balance.
pub fn build_inspection_entry(input: InspectionEntryInput<'_>) -> CoreResult<MilkQualityLedgerEntry> {
    let balance = input.balance;
    let balance_litre = round3(convert_stock_qty(input.item, balance, input.litre_uom)?);
    let percentages = input.inspection.percentages();
    let quality = QualityMetrics::from_percentages(percentages, balance, false);

    Ok(MilkQualityLedgerEntry {
        id: Uuid::new_v4(),
        item_code: input.item.item_code.clone(),
        warehouse: input.warehouse.to_string(),
        voucher_type: DocumentKind::QualityInspection,
        voucher_no: input.inspection.name.clone(),
        voucher_detail_no: None,
        posting_date: input.voucher.posting_date,
        posting_time: input.voucher.posting_time,
        direction: LedgerDirection::Retest,
        stock_uom: input.item.stock_uom.clone(),
        uom: input.litre_uom.to_string(),
        fat_percent: quality.fat_percent,
        snf_percent: quality.snf_percent,
        fat_kg: quality.fat_kg,
        snf_kg: quality.snf_kg,
        qty_in_kg: balance,
        qty_in_litre: balance_litre,
        qty_after_transaction_in_kg: balance,
        qty_after_transaction_in_litre: balance_litre,
        is_cancelled: false,
        created_at: Utc::now(),
    })
}

/// Report filters; the date range is mandatory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerFilter {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub voucher_type: Option<DocumentKind>,
    #[serde(default)]
    pub voucher_no: Option<String>,
}

impl LedgerFilter {
    pub fn date_range(&self) -> CoreResult<DateRange> {
        DateRange::new(self.from_date, self.to_date)
    }

    pub fn matches(&self, entry: &MilkQualityLedgerEntry) -> bool {
        fn eq(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |f| f == value)
        }
        entry.posting_date >= self.from_date
            && entry.posting_date <= self.to_date
            && eq(&self.item_code, &entry.item_code)
            && eq(&self.warehouse, &entry.warehouse)
            && eq(&self.voucher_no, &entry.voucher_no)
            && self.voucher_type.map_or(true, |t| t == entry.voucher_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::models::UomConversionEntry;

    fn milk_item() -> Item {
        Item::new("RM-MLK-0001", "Kg").with_conversion(UomConversionEntry::new("Litre", Decimal::new(10339, 4)))
    }

    fn voucher() -> LedgerVoucher {
        LedgerVoucher {
            voucher_no: "MAT-PRE-0001".to_string(),
            posting_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            posting_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        }
    }

    fn milk_line(finished: bool) -> TransactionLine {
        let mut line = TransactionLine::new("RM-MLK-0001", Decimal::from(10339));
        line.is_milk_type = true;
        line.is_finished_item = finished;
        line.warehouse = Some("Stores".to_string());
        line.fat_percent = Decimal::from(4);
        line.snf_percent = Decimal::new(85, 1);
        line.recalculate_masses();
        line
    }

    #[test]
    fn test_candidates_per_document_kind() {
        let pr = TransactionDocument::new(DocumentKind::PurchaseReceipt)
            .with_line(milk_line(false))
            .with_line(TransactionLine::new("PKG-001", Decimal::ONE));
        assert_eq!(ledger_candidates(&pr).len(), 1);

        let mut se = TransactionDocument::new(DocumentKind::StockEntry)
            .with_line(milk_line(true))
            .with_line(milk_line(false));
        assert!(ledger_candidates(&se).is_empty());

        se.stock_entry_type = Some(StockEntryType::Manufacture);
        let candidates = ledger_candidates(&se);
        assert_eq!(candidates[0].direction, LedgerDirection::Inward);
        assert_eq!(candidates[1].direction, LedgerDirection::Outward);
        assert_eq!(candidates[1].source, QualitySource::LatestEntry);
    }

    #[test]
    fn test_build_entry_from_line() {
        let line = milk_line(false);
        let voucher = voucher();
        let item = milk_item();
        let entry = build_ledger_entry(LedgerEntryInput {
            voucher_type: DocumentKind::PurchaseReceipt,
            voucher: &voucher,
            candidate: LedgerCandidate {
                line: &line,
                direction: LedgerDirection::Inward,
                source: QualitySource::Line,
            },
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance_after: Decimal::from(20678),
            latest: None,
        })
        .unwrap();

        assert_eq!(entry.qty_in_litre, Decimal::from(10000));
        assert_eq!(entry.qty_after_transaction_in_litre, Decimal::from(20000));
        assert_eq!(entry.fat_kg, Decimal::new(41356, 2));
        assert_eq!(entry.voucher_detail_no, Some(line.id));
    }

    #[test]
    fn test_build_entry_without_litre_conversion() {
        let line = milk_line(false);
        let voucher = voucher();
        let item = Item::new("RM-MLK-0001", "Kg");
        let err = build_ledger_entry(LedgerEntryInput {
            voucher_type: DocumentKind::PurchaseReceipt,
            voucher: &voucher,
            candidate: LedgerCandidate {
                line: &line,
                direction: LedgerDirection::Inward,
                source: QualitySource::Line,
            },
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance_after: Decimal::ZERO,
            latest: None,
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationMissing { .. }));
    }

    #[test]
    fn test_outward_entry_uses_latest_quality() {
        let inward_line = milk_line(true);
        let voucher = voucher();
        let item = milk_item();
        let latest = build_ledger_entry(LedgerEntryInput {
            voucher_type: DocumentKind::StockEntry,
            voucher: &voucher,
            candidate: LedgerCandidate {
                line: &inward_line,
                direction: LedgerDirection::Inward,
                source: QualitySource::Line,
            },
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance_after: Decimal::from(10339),
            latest: None,
        })
        .unwrap();

        let mut consumed = TransactionLine::new("RM-MLK-0001", Decimal::from(200));
        consumed.is_milk_type = true;
        let entry = build_ledger_entry(LedgerEntryInput {
            voucher_type: DocumentKind::StockEntry,
            voucher: &voucher,
            candidate: LedgerCandidate {
                line: &consumed,
                direction: LedgerDirection::Outward,
                source: QualitySource::LatestEntry,
            },
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance_after: Decimal::from(10139),
            latest: Some(&latest),
        })
        .unwrap();

        assert_eq!(entry.fat_percent, Decimal::from(4));
        assert_eq!(entry.fat_kg, Decimal::from(8));
        assert_eq!(entry.snf_kg, Decimal::from(17));
    }

    fn internal_inspection() -> QualityInspection {
        QualityInspection {
            name: "QI-INT-0001".to_string(),
            inspection_type: crate::models::InspectionType::Internal,
            item_code: Some("RM-MLK-0001".to_string()),
            warehouse: Some("Stores".to_string()),
            readings: vec![
                crate::models::QualityInspectionReading::numeric("Fat", "4.2"),
                crate::models::QualityInspectionReading::numeric("S.N.F.", "8.6"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_inspection_entry_covers_balance() {
        let inspection = internal_inspection();
        let voucher = voucher();
        let item = milk_item();
        let entry = build_inspection_entry(InspectionEntryInput {
            inspection: &inspection,
            voucher: &voucher,
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance: Decimal::from(10339),
        })
        .unwrap();

        assert_eq!(entry.voucher_type, DocumentKind::QualityInspection);
        assert_eq!(entry.voucher_no, "QI-INT-0001");
        assert_eq!(entry.voucher_detail_no, None);
        assert_eq!(entry.direction, LedgerDirection::Retest);
        assert_eq!(entry.fat_percent, Decimal::new(42, 1));
        assert_eq!(entry.snf_percent, Decimal::new(86, 1));
        // 10339 * 4.2 / 100 = 434.238
        assert_eq!(entry.fat_kg, Decimal::new(434238, 3));
        assert_eq!(entry.snf_kg, Decimal::new(889154, 3));
        assert_eq!(entry.qty_in_kg, Decimal::from(10339));
        assert_eq!(entry.qty_in_litre, Decimal::from(10000));
        assert_eq!(entry.qty_after_transaction_in_litre, Decimal::from(10000));
    }

    #[test]
    fn test_inspection_entry_needs_litre_conversion() {
        let inspection = internal_inspection();
        let voucher = voucher();
        let item = Item::new("RM-MLK-0001", "Kg");
        let err = build_inspection_entry(InspectionEntryInput {
            inspection: &inspection,
            voucher: &voucher,
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance: Decimal::from(100),
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationMissing { .. }));
    }

    #[test]
    fn test_filter_matches() {
        let line = milk_line(false);
        let voucher = voucher();
        let item = milk_item();
        let entry = build_ledger_entry(LedgerEntryInput {
            voucher_type: DocumentKind::PurchaseReceipt,
            voucher: &voucher,
            candidate: LedgerCandidate {
                line: &line,
                direction: LedgerDirection::Inward,
                source: QualitySource::Line,
            },
            item: &item,
            warehouse: "Stores",
            litre_uom: "Litre",
            balance_after: Decimal::ZERO,
            latest: None,
        })
        .unwrap();

        let mut filter = LedgerFilter {
            from_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            item_code: Some("RM-MLK-0001".to_string()),
            warehouse: None,
            voucher_type: Some(DocumentKind::PurchaseReceipt),
            voucher_no: None,
        };
        assert!(filter.matches(&entry));

        filter.warehouse = Some("Finished Goods".to_string());
        assert!(!filter.matches(&entry));

        filter.from_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert!(filter.date_range().is_err());
    }
}
