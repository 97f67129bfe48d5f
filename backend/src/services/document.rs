//! Line event orchestration on transaction documents
//!
//! A field edit on one line runs validation, conversion and quality lookups,
//! writes their results back as sequenced patches, and refreshes the totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    lenient_decimal, lenient_decimal_opt, validate_line, CoreError, DocumentKind, LineChange,
    LineNotice, LinePatch, PatchOutcome, QualityMetrics, StalePolicy, TransactionDocument,
    TransactionLine,
};
use uuid::Uuid;

use super::quality::{QualityRefresh, QualityService};
use super::uom::UomService;
use crate::error::{AppError, AppResult};
use crate::repository::Repositories;

/// A field edit on one line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LineEvent {
    ItemChanged {
        item_code: Option<String>,
    },
    UomChanged {
        uom: Option<String>,
    },
    WarehouseChanged {
        warehouse: Option<String>,
    },
    QuantityChanged {
        #[serde(default, alias = "qty", deserialize_with = "lenient_decimal")]
        quantity: Decimal,
    },
    QualityInspectionChanged {
        quality_inspection: Option<String>,
    },
    QualityValuesEdited {
        #[serde(default, alias = "custom_fat", deserialize_with = "lenient_decimal_opt")]
        fat_percent: Option<Decimal>,
        #[serde(default, alias = "custom_snf", deserialize_with = "lenient_decimal_opt")]
        snf_percent: Option<Decimal>,
    },
}

#[derive(Debug, Deserialize)]
pub struct LineEventRequest {
    pub document: TransactionDocument,
    pub line_id: Uuid,
    #[serde(flatten)]
    pub event: LineEvent,
}

#[derive(Debug, Serialize)]
pub struct AppliedPatch {
    pub patch: LinePatch,
    pub outcome: PatchOutcome,
}

#[derive(Debug, Serialize)]
pub struct LineEventResponse {
    pub document: TransactionDocument,
    pub notices: Vec<LineNotice>,
    pub patches: Vec<AppliedPatch>,
    /// Present when the UOM was rejected; the form clears it after this delay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uom_clear_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPatchRequest {
    pub document: TransactionDocument,
    pub patch: LinePatch,
}

#[derive(Debug, Serialize)]
pub struct ApplyPatchResponse {
    pub document: TransactionDocument,
    pub outcome: PatchOutcome,
}

/// Lookups a line event triggers, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    ValidateUom,
    StockInUom,
    UomQuantities,
    Quality,
    /// Re-scale inspection metrics to a new quantity; unlinked lines are left alone
    RescaleQuality,
}

impl LineEvent {
    /// Write the edited field onto the line
    fn apply_edit(&self, line: &mut TransactionLine) {
        match self {
            LineEvent::ItemChanged { item_code } => {
                line.item_code = item_code.clone();
                line.actual_qty = None;
                line.primary_uom_qty = None;
                line.secondary_uom_qty = None;
            }
            LineEvent::UomChanged { uom } => line.uom = uom.clone(),
            LineEvent::WarehouseChanged { warehouse } => line.warehouse = warehouse.clone(),
            LineEvent::QuantityChanged { quantity } => line.quantity = *quantity,
            LineEvent::QualityInspectionChanged { quality_inspection } => {
                line.quality_inspection = quality_inspection.clone();
            }
            LineEvent::QualityValuesEdited {
                fat_percent,
                snf_percent,
            } => {
                if let Some(fat) = fat_percent {
                    line.fat_percent = *fat;
                }
                if let Some(snf) = snf_percent {
                    line.snf_percent = *snf;
                }
            }
        }
    }

    fn lookups(&self, kind: DocumentKind) -> Vec<Lookup> {
        let uom_quantities = kind == DocumentKind::WorkOrder;
        match self {
            LineEvent::ItemChanged { .. } => {
                let mut lookups = vec![Lookup::ValidateUom, Lookup::StockInUom];
                if uom_quantities {
                    lookups.push(Lookup::UomQuantities);
                }
                lookups
            }
            LineEvent::UomChanged { .. } => vec![Lookup::ValidateUom, Lookup::StockInUom],
            LineEvent::WarehouseChanged { .. } => vec![Lookup::StockInUom],
            LineEvent::QuantityChanged { .. } => {
                let mut lookups = vec![Lookup::RescaleQuality];
                if uom_quantities {
                    lookups.push(Lookup::UomQuantities);
                }
                lookups
            }
            LineEvent::QualityInspectionChanged { .. } => vec![Lookup::Quality],
            LineEvent::QualityValuesEdited { .. } => Vec::new(),
        }
    }
}

/// Turn a recoverable core error into a line notice; anything else propagates
fn notice_or_err(line_id: Uuid, field: &str, err: AppError) -> AppResult<LineNotice> {
    match err {
        AppError::Core(core) => {
            tracing::warn!(line_id = %line_id, field, "{}", core);
            Ok(LineNotice::warning(line_id, field, core.to_string()))
        }
        other => Err(other),
    }
}

#[derive(Clone)]
pub struct DocumentService {
    repos: Repositories,
    uom: UomService,
    quality: QualityService,
    stale_policy: StalePolicy,
    uom_clear_delay_ms: u64,
}

impl DocumentService {
    pub fn new(repos: Repositories, stale_policy: StalePolicy, uom_clear_delay_ms: u64) -> Self {
        Self {
            uom: UomService::new(repos.clone()),
            quality: QualityService::new(repos.clone()),
            repos,
            stale_policy,
            uom_clear_delay_ms,
        }
    }

    /// Run one line event through validation, lookups and aggregation
    pub async fn handle_line_event(&self, request: LineEventRequest) -> AppResult<LineEventResponse> {
        let LineEventRequest {
            mut document,
            line_id,
            event,
        } = request;

        let kind = document.kind;
        let line = document
            .line_mut(line_id)
            .ok_or_else(|| AppError::NotFound(format!("Line {}", line_id)))?;
        event.apply_edit(line);
        tracing::debug!(line_id = %line_id, event = ?event, "Handling line event");

        let mut notices = Vec::new();
        if matches!(
            event,
            LineEvent::QualityValuesEdited { .. } | LineEvent::QuantityChanged { .. }
        ) {
            match validate_line(line) {
                Ok(()) => line.recalculate_masses(),
                Err(err) => {
                    tracing::warn!(line_id = %line_id, field = err.field, "{}", err.message);
                    line.fat_kg = Decimal::ZERO;
                    line.snf_kg = Decimal::ZERO;
                    notices.push(LineNotice::warning(line_id, err.field, err.message));
                }
            }
        }

        let lookups = event.lookups(kind);
        // One sequence number per event; every patch it produces carries it
        let seq = if lookups.is_empty() {
            None
        } else {
            document.begin_request(line_id)
        };

        let mut patches = Vec::new();
        let mut uom_cleared = false;

        for lookup in lookups {
            let (Some(seq), Some(line)) = (seq, document.line(line_id).cloned()) else {
                break;
            };
            let changes = match self.run_lookup(lookup, kind, &line, &mut notices).await? {
                Some(changes) if !changes.is_empty() => changes,
                _ => continue,
            };
            uom_cleared |= changes.contains(&LineChange::ClearUom);

            let patch = LinePatch { line_id, seq, changes };
            let outcome = document.apply_patch(&patch, self.stale_policy);
            patches.push(AppliedPatch { patch, outcome });
        }

        document.recalculate_totals();

        Ok(LineEventResponse {
            document,
            notices,
            patches,
            uom_clear_delay_ms: uom_cleared.then_some(self.uom_clear_delay_ms),
        })
    }

    async fn run_lookup(
        &self,
        lookup: Lookup,
        kind: DocumentKind,
        line: &TransactionLine,
        notices: &mut Vec<LineNotice>,
    ) -> AppResult<Option<Vec<LineChange>>> {
        let item_code = line.item_code.as_deref().filter(|c| !c.is_empty());

        match lookup {
            Lookup::ValidateUom => {
                let Some(uom) = line.uom.as_deref() else {
                    return Ok(None);
                };
                let result = self.uom.validate_item_uom(item_code, uom).await?;
                if result.valid {
                    return Ok(None);
                }
                notices.push(LineNotice::warning(line.id, "uom", result.message));
                Ok(Some(vec![LineChange::ClearUom]))
            }
            Lookup::StockInUom => {
                let (Some(item_code), Some(uom), Some(warehouse)) =
                    (item_code, line.uom.as_deref(), line.warehouse.as_deref())
                else {
                    return Ok(None);
                };
                match self.uom.convert_stock_to_uom(item_code, warehouse, uom).await {
                    Ok(stock) => {
                        if let Some(message) = stock.message {
                            notices.push(LineNotice::error(line.id, "custom_actual_qty", message));
                        }
                        Ok(Some(vec![LineChange::ActualQty { qty: stock.qty }]))
                    }
                    Err(err) => {
                        notices.push(notice_or_err(line.id, "custom_actual_qty", err)?);
                        Ok(Some(vec![LineChange::ActualQty { qty: Decimal::ZERO }]))
                    }
                }
            }
            Lookup::UomQuantities => {
                let Some(item_code) = item_code else {
                    return Ok(None);
                };
                match self.uom.resolve_uom_quantities(item_code, line.quantity).await {
                    Ok(quantities) => Ok(Some(vec![LineChange::UomQuantities {
                        primary: quantities.primary_uom_qty,
                        secondary: quantities.secondary_uom_qty,
                    }])),
                    Err(err) => {
                        notices.push(notice_or_err(line.id, "primary_uom_qty", err)?);
                        Ok(None)
                    }
                }
            }
            Lookup::RescaleQuality if line.quality_inspection.as_deref().map_or(true, str::is_empty) => {
                Ok(None)
            }
            Lookup::Quality | Lookup::RescaleQuality => match self.quality.refresh_line(kind, line).await {
                Ok(QualityRefresh::Update(metrics)) => Ok(Some(vec![LineChange::Quality { metrics }])),
                Ok(QualityRefresh::Kept) => Ok(None),
                Err(err) => {
                    notices.push(notice_or_err(line.id, "quality_inspection", err)?);
                    Ok(Some(vec![LineChange::Quality {
                        metrics: QualityMetrics::zero(),
                    }]))
                }
            },
        }
    }

    /// Merge a lookup result that came back after the document moved on.
    ///
    /// The configured stale policy decides whether a superseded result
    /// still lands.
    pub fn apply_patch(&self, request: ApplyPatchRequest) -> AppResult<ApplyPatchResponse> {
        let ApplyPatchRequest { mut document, patch } = request;
        let outcome = document.apply_patch(&patch, self.stale_policy);
        match outcome {
            PatchOutcome::UnknownLine => {
                return Err(AppError::NotFound(format!("Line {}", patch.line_id)));
            }
            PatchOutcome::DroppedStale => {
                tracing::debug!(line_id = %patch.line_id, seq = patch.seq, "Dropped superseded lookup result");
            }
            PatchOutcome::Applied => {}
        }
        Ok(ApplyPatchResponse { document, outcome })
    }

    /// Recompute totals from the lines as given
    pub fn recalculate(&self, mut document: TransactionDocument) -> TransactionDocument {
        document.recalculate_totals();
        document
    }

    /// Copy a BOM's FAT/SNF onto a Work Order's required items
    pub async fn apply_bom_quality(
        &self,
        mut document: TransactionDocument,
        bom_no: &str,
    ) -> AppResult<TransactionDocument> {
        let bom = self
            .repos
            .boms
            .get_bom_quality(bom_no)
            .await?
            .ok_or_else(|| CoreError::not_found("BOM", bom_no))?;
        let updated = document.apply_bom_quality(&bom);
        tracing::debug!(bom_no, updated, "Applied BOM quality");
        Ok(document)
    }
}
