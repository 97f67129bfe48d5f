//! Milk Quality Ledger posting, cancellation and queries

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    build_inspection_entry, build_ledger_entry, ledger_candidates, CoreError, DocStatus, DocumentKind,
    InspectionEntryInput, InspectionType, LedgerEntryInput, LedgerFilter, LedgerVoucher, LineNotice,
    MilkQualityLedgerEntry, QualityInspection, QualityMetrics, QualitySource, TransactionDocument,
};
use validator::Validate;

use crate::error::AppResult;
use crate::repository::Repositories;

#[derive(Debug, Deserialize)]
pub struct PostLedgerRequest {
    pub document: TransactionDocument,
    #[serde(flatten)]
    pub voucher: LedgerVoucher,
}

#[derive(Debug, Serialize)]
pub struct PostLedgerResponse {
    pub entries: Vec<MilkQualityLedgerEntry>,
    pub notices: Vec<LineNotice>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelLedgerRequest {
    pub voucher_type: DocumentKind,
    #[validate(length(min = 1, message = "Voucher number is required"))]
    pub voucher_no: String,
}

#[derive(Debug, Serialize)]
pub struct CancelLedgerResponse {
    pub cancelled: u64,
}

/// Posting moment for a submitted inspection; defaults to its report date, now
#[derive(Debug, Default, Deserialize)]
pub struct SubmitInspectionRequest {
    #[serde(default)]
    pub posting_date: Option<NaiveDate>,
    #[serde(default)]
    pub posting_time: Option<NaiveTime>,
}

#[derive(Debug, Serialize)]
pub struct InspectionPostingResponse {
    pub inspection: String,
    pub docstatus: DocStatus,
    pub entries: Vec<MilkQualityLedgerEntry>,
}

#[derive(Debug, Serialize)]
pub struct InspectionCancelResponse {
    pub inspection: String,
    pub docstatus: DocStatus,
    pub cancelled: u64,
}

#[derive(Clone)]
pub struct LedgerService {
    repos: Repositories,
    litre_uom: String,
}

impl LedgerService {
    pub fn new(repos: Repositories, litre_uom: impl Into<String>) -> Self {
        Self {
            repos,
            litre_uom: litre_uom.into(),
        }
    }

    /// Post the ledger entries of a submitted document.
    ///
    /// Lines that cannot be posted are reported as notices; the rest post.
    pub async fn post(&self, request: PostLedgerRequest) -> AppResult<PostLedgerResponse> {
        let PostLedgerRequest { document, voucher } = request;
        let mut entries = Vec::new();
        let mut notices = Vec::new();

        for candidate in ledger_candidates(&document) {
            let line = candidate.line;
            let (Some(item_code), Some(warehouse)) = (line.item_code.as_deref(), line.warehouse.as_deref())
            else {
                notices.push(LineNotice::warning(
                    line.id,
                    "warehouse",
                    "Item and warehouse are required to post milk quality",
                ));
                continue;
            };

            let Some(item) = self.repos.items.get_item(item_code).await? else {
                notices.push(LineNotice::error(line.id, "item_code", format!("Item {} not found", item_code)));
                continue;
            };
            let balance_after = self
                .repos
                .stock
                .actual_qty(item_code, warehouse)
                .await?
                .unwrap_or(Decimal::ZERO);
            let latest = match candidate.source {
                QualitySource::LatestEntry => self.repos.ledger.latest(item_code, warehouse).await?,
                QualitySource::Line => None,
            };

            let input = LedgerEntryInput {
                voucher_type: document.kind,
                voucher: &voucher,
                candidate,
                item: &item,
                warehouse,
                litre_uom: &self.litre_uom,
                balance_after,
                latest: latest.as_ref(),
            };
            match build_ledger_entry(input) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(line_id = %line.id, item_code, "{}", err);
                    notices.push(LineNotice::error(line.id, "uom", err.to_string()));
                }
            }
        }

        self.repos.ledger.insert_entries(&entries).await?;
        tracing::info!(
            voucher_type = %document.kind,
            voucher_no = %voucher.voucher_no,
            entries = entries.len(),
            skipped = notices.len(),
            "Posted milk quality ledger entries"
        );

        Ok(PostLedgerResponse { entries, notices })
    }

    /// Cancel every live entry of a voucher
    pub async fn cancel(&self, request: CancelLedgerRequest) -> AppResult<CancelLedgerResponse> {
        request.validate()?;

        let cancelled = self
            .repos
            .ledger
            .cancel_voucher(request.voucher_type, &request.voucher_no)
            .await?;
        tracing::info!(
            voucher_type = %request.voucher_type,
            voucher_no = %request.voucher_no,
            cancelled,
            "Cancelled milk quality ledger entries"
        );
        Ok(CancelLedgerResponse { cancelled })
    }

    async fn inspection(&self, name: &str) -> AppResult<QualityInspection> {
        let inspection = self
            .repos
            .inspections
            .get_inspection(name)
            .await?
            .ok_or_else(|| CoreError::not_found("Quality Inspection", name))?;
        Ok(inspection)
    }

    /// Submit an inspection. An Internal inspection records the re-tested
    /// quality of the whole balance held in its warehouse.
    pub async fn submit_inspection(
        &self,
        name: &str,
        request: SubmitInspectionRequest,
    ) -> AppResult<InspectionPostingResponse> {
        let inspection = self.inspection(name).await?;
        if inspection.docstatus != DocStatus::Draft {
            return Err(CoreError::validation(format!(
                "Quality Inspection {} is already {}",
                name,
                inspection.docstatus.as_str()
            ))
            .into());
        }

        let entries = if inspection.inspection_type == InspectionType::Internal {
            let now = Utc::now().naive_utc();
            let voucher = LedgerVoucher {
                voucher_no: inspection.name.clone(),
                posting_date: request.posting_date.or(inspection.report_date).unwrap_or(now.date()),
                posting_time: request.posting_time.unwrap_or(now.time()),
            };
            let entry = self.inspection_entry(&inspection, &voucher).await?;
            self.repos.ledger.insert_entries(std::slice::from_ref(&entry)).await?;
            vec![entry]
        } else {
            Vec::new()
        };

        self.repos.inspections.set_docstatus(name, DocStatus::Submitted).await?;
        tracing::info!(
            inspection = name,
            inspection_type = ?inspection.inspection_type,
            entries = entries.len(),
            "Submitted quality inspection"
        );

        Ok(InspectionPostingResponse {
            inspection: inspection.name,
            docstatus: DocStatus::Submitted,
            entries,
        })
    }

    async fn inspection_entry(
        &self,
        inspection: &QualityInspection,
        voucher: &LedgerVoucher,
    ) -> AppResult<MilkQualityLedgerEntry> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        let (Some(item_code), Some(warehouse)) = (non_empty(&inspection.item_code), non_empty(&inspection.warehouse))
        else {
            return Err(CoreError::validation(format!(
                "Quality Inspection {} needs an item and a warehouse to post milk quality",
                inspection.name
            ))
            .into());
        };

        let item = self
            .repos
            .items
            .get_item(&item_code)
            .await?
            .ok_or_else(|| CoreError::not_found("Item", item_code.as_str()))?;
        let balance = self
            .repos
            .stock
            .actual_qty(&item_code, &warehouse)
            .await?
            .unwrap_or(Decimal::ZERO);

        let entry = build_inspection_entry(InspectionEntryInput {
            inspection,
            voucher,
            item: &item,
            warehouse: &warehouse,
            litre_uom: &self.litre_uom,
            balance,
        })?;
        Ok(entry)
    }

    /// Cancel a submitted inspection along with any ledger entry it posted
    pub async fn cancel_inspection(&self, name: &str) -> AppResult<InspectionCancelResponse> {
        let inspection = self.inspection(name).await?;
        if inspection.docstatus != DocStatus::Submitted {
            return Err(CoreError::validation(format!("Quality Inspection {} is not submitted", name)).into());
        }

        let cancelled = if inspection.inspection_type == InspectionType::Internal {
            self.repos
                .ledger
                .cancel_voucher(DocumentKind::QualityInspection, name)
                .await?
        } else {
            0
        };
        self.repos.inspections.set_docstatus(name, DocStatus::Cancelled).await?;
        tracing::info!(inspection = name, cancelled, "Cancelled quality inspection");

        Ok(InspectionCancelResponse {
            inspection: inspection.name,
            docstatus: DocStatus::Cancelled,
            cancelled,
        })
    }

    /// Ledger report rows; `from_date` after `to_date` is rejected
    pub async fn query(&self, filter: LedgerFilter) -> AppResult<Vec<MilkQualityLedgerEntry>> {
        filter.date_range()?;
        self.repos.ledger.query(&filter).await
    }

    /// Latest FAT/SNF for an item in a warehouse, scaled to `qty`
    pub async fn latest_quality(
        &self,
        item_code: &str,
        warehouse: &str,
        qty: Decimal,
    ) -> AppResult<Option<QualityMetrics>> {
        let latest = self.repos.ledger.latest(item_code, warehouse).await?;
        Ok(latest.map(|entry| entry.scaled_to(qty)))
    }

    /// Fill lines from the latest ledger quality, as done when a BOM is first saved.
    ///
    /// Lines without item, quantity or warehouse, and lines with no ledger
    /// history, are left untouched.
    pub async fn prefill(&self, mut document: TransactionDocument) -> AppResult<TransactionDocument> {
        for line in document.lines.iter_mut() {
            let (Some(item_code), Some(warehouse)) = (line.item_code.as_deref(), line.warehouse.as_deref())
            else {
                continue;
            };
            if line.quantity.is_zero() {
                continue;
            }
            if let Some(metrics) = self.latest_quality(item_code, warehouse, line.quantity).await? {
                line.set_quality(&metrics);
            }
        }
        document.recalculate_totals();
        Ok(document)
    }
}
