//! PostgreSQL collaborators

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use shared::{
    AdjustmentRates, BomQuality, DocStatus, DocumentKind, InspectionType, Item, LedgerDirection,
    LedgerFilter, MilkQualityLedgerEntry, MilkTypeConfig, QualityInspection, QualityInspectionReading,
    RateType, ReadingStatus, ReceiptSummary, SupplierMilkProfile, UomConversionEntry,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    BomRepository, HealthCheck, InspectionRepository, ItemRepository, MilkLedgerRepository, PricingRepository,
    ReceiptRepository, StockLedger,
};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgRepository {
    db: PgPool,
}

impl PgRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Row for UOM conversion query
#[derive(Debug, FromRow)]
struct ConversionRow {
    uom: String,
    conversion_factor: Decimal,
    is_primary: bool,
    is_secondary: bool,
}

/// Row for inspection reading query
#[derive(Debug, FromRow)]
struct ReadingRow {
    specification: String,
    numeric: bool,
    status: String,
    reading_value: String,
    reading_1: Option<String>,
}

fn reading_status(status: &str) -> ReadingStatus {
    match status {
        "Accepted" => ReadingStatus::Accepted,
        "Rejected" => ReadingStatus::Rejected,
        _ => ReadingStatus::Unset,
    }
}

impl From<ReadingRow> for QualityInspectionReading {
    fn from(row: ReadingRow) -> Self {
        QualityInspectionReading {
            specification: row.specification,
            numeric: row.numeric,
            status: reading_status(&row.status),
            reading_value: row.reading_value,
            reading_1: row.reading_1,
        }
    }
}

/// Row for inspection header query
#[derive(Debug, FromRow)]
struct InspectionRow {
    name: String,
    inspection_type: String,
    docstatus: String,
    item_code: Option<String>,
    warehouse: Option<String>,
    reference_type: Option<String>,
    reference_name: Option<String>,
    report_date: Option<NaiveDate>,
    in_time: Option<String>,
    out_time: Option<String>,
    mbrt_start_time: Option<String>,
    mbrt_end_time: Option<String>,
    remarks: Option<String>,
}

fn inspection_type(raw: &str) -> InspectionType {
    match raw {
        "Outgoing" => InspectionType::Outgoing,
        "In Process" => InspectionType::InProcess,
        "Internal" => InspectionType::Internal,
        _ => InspectionType::Incoming,
    }
}

impl From<InspectionRow> for QualityInspection {
    fn from(row: InspectionRow) -> Self {
        QualityInspection {
            name: row.name,
            inspection_type: inspection_type(&row.inspection_type),
            docstatus: DocStatus::parse(&row.docstatus),
            item_code: row.item_code,
            warehouse: row.warehouse,
            reference_type: row.reference_type,
            reference_name: row.reference_name,
            report_date: row.report_date,
            in_time: row.in_time,
            out_time: row.out_time,
            mbrt_start_time: row.mbrt_start_time,
            mbrt_end_time: row.mbrt_end_time,
            remarks: row.remarks,
            readings: Vec::new(),
        }
    }
}

const INSPECTION_COLUMNS: &str = r#"
    name, inspection_type, docstatus, item_code, warehouse,
    reference_type, reference_name, report_date,
    in_time, out_time, mbrt_start_time, mbrt_end_time, remarks
"#;

#[derive(Debug, FromRow)]
struct ReceiptRow {
    name: String,
    supplier: String,
    supplier_code: Option<String>,
    tanker_no: Option<String>,
    net_weight: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct MilkTypeRow {
    milk_type: String,
    base_rate_type: String,
    fat_addition_enabled: bool,
    fat_addition: Decimal,
    fat_deduction_enabled: bool,
    fat_deduction: Decimal,
    snf_addition_enabled: bool,
    snf_addition: Decimal,
    snf_deduction_enabled: bool,
    snf_deduction: Decimal,
}

impl TryFrom<MilkTypeRow> for MilkTypeConfig {
    type Error = AppError;

    fn try_from(row: MilkTypeRow) -> AppResult<Self> {
        let rate_type = match row.base_rate_type.as_str() {
            "Per Litre" => RateType::PerLitre,
            "Per KG Fat" => RateType::PerKgFat,
            other => {
                return Err(AppError::Internal(format!(
                    "Unknown rate type {} on Milk Type {}",
                    other, row.milk_type
                )))
            }
        };
        Ok(MilkTypeConfig {
            milk_type: row.milk_type,
            rate_type,
            fat: AdjustmentRates {
                addition_enabled: row.fat_addition_enabled,
                addition: row.fat_addition,
                deduction_enabled: row.fat_deduction_enabled,
                deduction: row.fat_deduction,
            },
            snf: AdjustmentRates {
                addition_enabled: row.snf_addition_enabled,
                addition: row.snf_addition,
                deduction_enabled: row.snf_deduction_enabled,
                deduction: row.snf_deduction,
            },
        })
    }
}

/// Row for ledger queries
#[derive(Debug, FromRow)]
struct LedgerRow {
    id: Uuid,
    item_code: String,
    warehouse: String,
    voucher_type: String,
    voucher_no: String,
    voucher_detail_no: Option<Uuid>,
    posting_date: NaiveDate,
    posting_time: NaiveTime,
    direction: String,
    stock_uom: String,
    uom: String,
    fat_per: Decimal,
    snf_per: Decimal,
    fat: Decimal,
    snf: Decimal,
    qty_in_kg: Decimal,
    qty_in_litre: Decimal,
    qty_after_transaction_in_kg: Decimal,
    qty_after_transaction_in_litre: Decimal,
    is_cancelled: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for MilkQualityLedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> AppResult<Self> {
        let voucher_type = DocumentKind::from_doctype(&row.voucher_type)
            .ok_or_else(|| AppError::Internal(format!("Unknown voucher type {}", row.voucher_type)))?;
        let direction = match row.direction.as_str() {
            "outward" => LedgerDirection::Outward,
            "retest" => LedgerDirection::Retest,
            _ => LedgerDirection::Inward,
        };
        Ok(MilkQualityLedgerEntry {
            id: row.id,
            item_code: row.item_code,
            warehouse: row.warehouse,
            voucher_type,
            voucher_no: row.voucher_no,
            voucher_detail_no: row.voucher_detail_no,
            posting_date: row.posting_date,
            posting_time: row.posting_time,
            direction,
            stock_uom: row.stock_uom,
            uom: row.uom,
            fat_percent: row.fat_per,
            snf_percent: row.snf_per,
            fat_kg: row.fat,
            snf_kg: row.snf,
            qty_in_kg: row.qty_in_kg,
            qty_in_litre: row.qty_in_litre,
            qty_after_transaction_in_kg: row.qty_after_transaction_in_kg,
            qty_after_transaction_in_litre: row.qty_after_transaction_in_litre,
            is_cancelled: row.is_cancelled,
            created_at: row.created_at,
        })
    }
}

const LEDGER_COLUMNS: &str = r#"
    id, item_code, warehouse, voucher_type, voucher_no, voucher_detail_no,
    posting_date, posting_time, direction, stock_uom, uom,
    fat_per, snf_per, fat, snf, qty_in_kg, qty_in_litre,
    qty_after_transaction_in_kg, qty_after_transaction_in_litre,
    is_cancelled, created_at
"#;

#[async_trait]
impl HealthCheck for PgRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for PgRepository {
    async fn get_item(&self, item_code: &str) -> AppResult<Option<Item>> {
        let stock_uom = sqlx::query_scalar::<_, String>("SELECT stock_uom FROM items WHERE item_code = $1")
            .bind(item_code)
            .fetch_optional(&self.db)
            .await?;

        let Some(stock_uom) = stock_uom else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, ConversionRow>(
            r#"
            SELECT uom, conversion_factor, is_primary, is_secondary
            FROM item_uom_conversions
            WHERE item_code = $1
            ORDER BY idx, id
            "#,
        )
        .bind(item_code)
        .fetch_all(&self.db)
        .await?;

        let mut item = Item::new(item_code, stock_uom);
        item.uom_conversions = rows
            .into_iter()
            .map(|row| UomConversionEntry {
                uom: row.uom,
                conversion_factor: row.conversion_factor,
                is_primary: row.is_primary,
                is_secondary: row.is_secondary,
            })
            .collect();
        Ok(Some(item))
    }
}

#[async_trait]
impl StockLedger for PgRepository {
    async fn actual_qty(&self, item_code: &str, warehouse: &str) -> AppResult<Option<Decimal>> {
        let qty = sqlx::query_scalar::<_, Decimal>(
            "SELECT actual_qty FROM bins WHERE item_code = $1 AND warehouse = $2",
        )
        .bind(item_code)
        .bind(warehouse)
        .fetch_optional(&self.db)
        .await?;
        Ok(qty)
    }
}

impl PgRepository {
    async fn readings(&self, inspection: &str) -> AppResult<Vec<QualityInspectionReading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT specification, numeric, status, reading_value, reading_1
            FROM quality_inspection_readings
            WHERE inspection = $1
            ORDER BY idx, id
            "#,
        )
        .bind(inspection)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(QualityInspectionReading::from).collect())
    }
}

#[async_trait]
impl InspectionRepository for PgRepository {
    async fn get_inspection(&self, name: &str) -> AppResult<Option<QualityInspection>> {
        let sql = format!("SELECT {INSPECTION_COLUMNS} FROM quality_inspections WHERE name = $1");
        let row = sqlx::query_as::<_, InspectionRow>(&sql)
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut inspection = QualityInspection::from(row);
        inspection.readings = self.readings(name).await?;
        Ok(Some(inspection))
    }

    async fn submitted_inspections(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<QualityInspection>> {
        let sql = format!(
            r#"
            SELECT {INSPECTION_COLUMNS}
            FROM quality_inspections
            WHERE docstatus = 'submitted' AND report_date BETWEEN $1 AND $2
            ORDER BY report_date, name
            "#
        );
        let rows = sqlx::query_as::<_, InspectionRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.db)
            .await?;

        let mut inspections = Vec::with_capacity(rows.len());
        for row in rows {
            let mut inspection = QualityInspection::from(row);
            inspection.readings = self.readings(&inspection.name).await?;
            inspections.push(inspection);
        }
        Ok(inspections)
    }

    async fn set_docstatus(&self, name: &str, status: DocStatus) -> AppResult<bool> {
        let result = sqlx::query("UPDATE quality_inspections SET docstatus = $2 WHERE name = $1")
            .bind(name)
            .bind(status.as_str())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReceiptRepository for PgRepository {
    async fn get_receipt(&self, name: &str) -> AppResult<Option<ReceiptSummary>> {
        let row = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT name, supplier, supplier_code, tanker_no, net_weight
            FROM purchase_receipts
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|row| ReceiptSummary {
            name: row.name,
            supplier: row.supplier,
            supplier_code: row.supplier_code,
            tanker_no: row.tanker_no,
            net_weight: row.net_weight,
        }))
    }
}

#[async_trait]
impl BomRepository for PgRepository {
    async fn get_bom_quality(&self, bom_no: &str) -> AppResult<Option<Vec<BomQuality>>> {
        let rows = sqlx::query_as::<_, (String, Decimal, Decimal)>(
            "SELECT item_code, fat, snf FROM bom_items WHERE bom_no = $1 ORDER BY idx, id",
        )
        .bind(bom_no)
        .fetch_all(&self.db)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            rows.into_iter()
                .map(|(item_code, fat_percent, snf_percent)| BomQuality {
                    item_code,
                    fat_percent,
                    snf_percent,
                })
                .collect(),
        ))
    }
}

#[async_trait]
impl PricingRepository for PgRepository {
    async fn get_milk_type(&self, milk_type: &str) -> AppResult<Option<MilkTypeConfig>> {
        let row = sqlx::query_as::<_, MilkTypeRow>(
            r#"
            SELECT milk_type, base_rate_type,
                   fat_addition_enabled, fat_addition, fat_deduction_enabled, fat_deduction,
                   snf_addition_enabled, snf_addition, snf_deduction_enabled, snf_deduction
            FROM milk_types
            WHERE milk_type = $1
            "#,
        )
        .bind(milk_type)
        .fetch_optional(&self.db)
        .await?;

        row.map(MilkTypeConfig::try_from).transpose()
    }

    async fn get_supplier_profile(
        &self,
        supplier: &str,
        milk_type: &str,
    ) -> AppResult<Option<SupplierMilkProfile>> {
        let row = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
            r#"
            SELECT baseline_fat, baseline_snf, base_rate
            FROM supplier_milk_profiles
            WHERE supplier = $1 AND milk_type = $2 AND is_default
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(supplier)
        .bind(milk_type)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(baseline_fat, baseline_snf, base_rate)| SupplierMilkProfile {
            supplier: supplier.to_string(),
            milk_type: milk_type.to_string(),
            baseline_fat,
            baseline_snf,
            base_rate,
            is_default: true,
        }))
    }

    async fn supplier_milk_types(&self, supplier: &str) -> AppResult<Vec<String>> {
        let types = sqlx::query_scalar::<_, String>(
            r#"
            SELECT milk_type
            FROM supplier_milk_profiles
            WHERE supplier = $1
            GROUP BY milk_type
            ORDER BY MIN(id)
            "#,
        )
        .bind(supplier)
        .fetch_all(&self.db)
        .await?;
        Ok(types)
    }
}

#[async_trait]
impl MilkLedgerRepository for PgRepository {
    async fn insert_entries(&self, entries: &[MilkQualityLedgerEntry]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO milk_quality_ledger_entries (
                    id, item_code, warehouse, voucher_type, voucher_no, voucher_detail_no,
                    posting_date, posting_time, direction, stock_uom, uom,
                    fat_per, snf_per, fat, snf, qty_in_kg, qty_in_litre,
                    qty_after_transaction_in_kg, qty_after_transaction_in_litre,
                    is_cancelled, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
                "#,
            )
            .bind(entry.id)
            .bind(&entry.item_code)
            .bind(&entry.warehouse)
            .bind(entry.voucher_type.doctype())
            .bind(&entry.voucher_no)
            .bind(entry.voucher_detail_no)
            .bind(entry.posting_date)
            .bind(entry.posting_time)
            .bind(entry.direction.as_str())
            .bind(&entry.stock_uom)
            .bind(&entry.uom)
            .bind(entry.fat_percent)
            .bind(entry.snf_percent)
            .bind(entry.fat_kg)
            .bind(entry.snf_kg)
            .bind(entry.qty_in_kg)
            .bind(entry.qty_in_litre)
            .bind(entry.qty_after_transaction_in_kg)
            .bind(entry.qty_after_transaction_in_litre)
            .bind(entry.is_cancelled)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn cancel_voucher(&self, voucher_type: DocumentKind, voucher_no: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE milk_quality_ledger_entries
            SET is_cancelled = TRUE
            WHERE voucher_type = $1 AND voucher_no = $2 AND NOT is_cancelled
            "#,
        )
        .bind(voucher_type.doctype())
        .bind(voucher_no)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, filter: &LedgerFilter) -> AppResult<Vec<MilkQualityLedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {LEDGER_COLUMNS}
            FROM milk_quality_ledger_entries
            WHERE NOT is_cancelled
              AND posting_date BETWEEN $1 AND $2
              AND ($3::TEXT IS NULL OR item_code = $3)
              AND ($4::TEXT IS NULL OR warehouse = $4)
              AND ($5::TEXT IS NULL OR voucher_type = $5)
              AND ($6::TEXT IS NULL OR voucher_no = $6)
            ORDER BY posting_date, posting_time, created_at
            "#
        );
        let rows = sqlx::query_as::<_, LedgerRow>(&sql)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(filter.item_code.as_deref())
            .bind(filter.warehouse.as_deref())
            .bind(filter.voucher_type.map(|t| t.doctype()))
            .bind(filter.voucher_no.as_deref())
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(MilkQualityLedgerEntry::try_from).collect()
    }

    async fn latest(
        &self,
        item_code: &str,
        warehouse: &str,
    ) -> AppResult<Option<MilkQualityLedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {LEDGER_COLUMNS}
            FROM milk_quality_ledger_entries
            WHERE item_code = $1 AND warehouse = $2 AND NOT is_cancelled
            ORDER BY created_at DESC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, LedgerRow>(&sql)
            .bind(item_code)
            .bind(warehouse)
            .fetch_optional(&self.db)
            .await?;

        row.map(MilkQualityLedgerEntry::try_from).transpose()
    }
}
