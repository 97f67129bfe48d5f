//! HTTP handlers for quality inspections

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{DocumentKind, QualityInspectionReading, QualityMetrics, RawMilkTestFilter, RawMilkTestRow};

use crate::error::AppResult;
use crate::services::ledger::{
    InspectionCancelResponse, InspectionPostingResponse, SubmitInspectionRequest,
};
use crate::AppState;

/// Query parameters for metrics computation
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub qty: Decimal,
    #[serde(default = "default_kind")]
    pub kind: DocumentKind,
}

fn default_kind() -> DocumentKind {
    DocumentKind::PurchaseReceipt
}

#[derive(Debug, Deserialize)]
pub struct NormalizeReadingsRequest {
    pub readings: Vec<QualityInspectionReading>,
}

#[derive(Debug, Serialize)]
pub struct NormalizeReadingsResponse {
    pub readings: Vec<QualityInspectionReading>,
}

/// FAT/SNF metrics of an inspection scaled to a quantity
pub async fn compute_quality_metrics(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> AppResult<Json<QualityMetrics>> {
    let metrics = state
        .quality_service()
        .compute_quality_metrics(Some(&name), query.qty, query.kind)
        .await?;
    Ok(Json(metrics))
}

/// Re-derive reading values before an inspection is saved
pub async fn normalize_readings(
    State(state): State<AppState>,
    Json(input): Json<NormalizeReadingsRequest>,
) -> AppResult<Json<NormalizeReadingsResponse>> {
    let readings = state.quality_service().normalize(input.readings);
    Ok(Json(NormalizeReadingsResponse { readings }))
}

/// Submit an inspection, posting milk quality for Internal ones
pub async fn submit_inspection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    input: Option<Json<SubmitInspectionRequest>>,
) -> AppResult<Json<InspectionPostingResponse>> {
    let input = input.map(|Json(input)| input).unwrap_or_default();
    let response = state.ledger_service().submit_inspection(&name, input).await?;
    Ok(Json(response))
}

/// Cancel a submitted inspection and its ledger entry
pub async fn cancel_inspection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<InspectionCancelResponse>> {
    let response = state.ledger_service().cancel_inspection(&name).await?;
    Ok(Json(response))
}

/// Raw Milk Testing Report
pub async fn raw_milk_testing_report(
    State(state): State<AppState>,
    Query(filter): Query<RawMilkTestFilter>,
) -> AppResult<Json<Vec<RawMilkTestRow>>> {
    let rows = state.quality_service().raw_milk_testing_report(filter).await?;
    Ok(Json(rows))
}
