//! HTTP handlers for the Milk Quality Ledger

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{LedgerFilter, MilkQualityLedgerEntry, QualityMetrics};

use crate::error::AppResult;
use crate::services::ledger::{
    CancelLedgerRequest, CancelLedgerResponse, PostLedgerRequest, PostLedgerResponse,
};
use crate::AppState;

/// Query parameters for the latest quality lookup
#[derive(Debug, Deserialize)]
pub struct LatestQualityQuery {
    pub item_code: String,
    pub warehouse: String,
    #[serde(default)]
    pub qty: Decimal,
}

/// Post ledger entries for a submitted document
pub async fn post_entries(
    State(state): State<AppState>,
    Json(input): Json<PostLedgerRequest>,
) -> AppResult<Json<PostLedgerResponse>> {
    let response = state.ledger_service().post(input).await?;
    Ok(Json(response))
}

/// Mark a cancelled voucher's entries as cancelled
pub async fn cancel_entries(
    State(state): State<AppState>,
    Json(input): Json<CancelLedgerRequest>,
) -> AppResult<Json<CancelLedgerResponse>> {
    let response = state.ledger_service().cancel(input).await?;
    Ok(Json(response))
}

/// Ledger report
pub async fn query_entries(
    State(state): State<AppState>,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<Json<Vec<MilkQualityLedgerEntry>>> {
    let entries = state.ledger_service().query(filter).await?;
    Ok(Json(entries))
}

/// Latest FAT/SNF for an item in a warehouse, scaled to `qty`
pub async fn latest_quality(
    State(state): State<AppState>,
    Query(query): Query<LatestQualityQuery>,
) -> AppResult<Json<Option<QualityMetrics>>> {
    let metrics = state
        .ledger_service()
        .latest_quality(&query.item_code, &query.warehouse, query.qty)
        .await?;
    Ok(Json(metrics))
}
