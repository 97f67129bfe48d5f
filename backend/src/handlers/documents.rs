//! HTTP handlers for transaction document events

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::TransactionDocument;

use crate::error::AppResult;
use crate::services::document::{
    ApplyPatchRequest, ApplyPatchResponse, LineEventRequest, LineEventResponse,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BomQualityRequest {
    pub document: TransactionDocument,
    pub bom_no: String,
}

/// Recompute document totals from the full set of lines
pub async fn recalculate_totals(
    State(state): State<AppState>,
    Json(document): Json<TransactionDocument>,
) -> AppResult<Json<TransactionDocument>> {
    Ok(Json(state.document_service().recalculate(document)))
}

/// Run the lookups a field edit triggers on one line
pub async fn handle_line_event(
    State(state): State<AppState>,
    Json(request): Json<LineEventRequest>,
) -> AppResult<Json<LineEventResponse>> {
    let response = state.document_service().handle_line_event(request).await?;
    Ok(Json(response))
}

/// Merge a late lookup result under the configured stale policy
pub async fn apply_line_patch(
    State(state): State<AppState>,
    Json(request): Json<ApplyPatchRequest>,
) -> AppResult<Json<ApplyPatchResponse>> {
    Ok(Json(state.document_service().apply_patch(request)?))
}

/// Copy BOM FAT/SNF onto a Work Order's required items
pub async fn apply_bom_quality(
    State(state): State<AppState>,
    Json(request): Json<BomQualityRequest>,
) -> AppResult<Json<TransactionDocument>> {
    let document = state
        .document_service()
        .apply_bom_quality(request.document, &request.bom_no)
        .await?;
    Ok(Json(document))
}

/// Fill BOM lines from the latest ledger quality
pub async fn prefill_from_ledger(
    State(state): State<AppState>,
    Json(document): Json<TransactionDocument>,
) -> AppResult<Json<TransactionDocument>> {
    let document = state.ledger_service().prefill(document).await?;
    Ok(Json(document))
}
