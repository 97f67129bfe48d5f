//! HTTP handlers for milk procurement pricing

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{MilkRateBreakdown, MilkRateRequest, TransactionDocument};

use crate::error::AppResult;
use crate::services::pricing::DocumentPricing;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MilkTypeCheck {
    pub valid: bool,
}

/// Rate and amount for one delivery
pub async fn calculate_milk_rate(
    State(state): State<AppState>,
    Json(input): Json<MilkRateRequest>,
) -> AppResult<Json<MilkRateBreakdown>> {
    let breakdown = state.pricing_service().milk_rate(&input).await?;
    Ok(Json(breakdown))
}

/// Price every milk line of a Purchase Receipt
pub async fn price_document(
    State(state): State<AppState>,
    Json(document): Json<TransactionDocument>,
) -> AppResult<Json<DocumentPricing>> {
    let pricing = state.pricing_service().price_document(&document).await?;
    Ok(Json(pricing))
}

/// Reject milk lines whose milk type the supplier does not deliver
pub async fn validate_milk_types(
    State(state): State<AppState>,
    Json(document): Json<TransactionDocument>,
) -> AppResult<Json<MilkTypeCheck>> {
    state.pricing_service().validate_milk_types(&document).await?;
    Ok(Json(MilkTypeCheck { valid: true }))
}
