//! HTTP handlers for stock on hand

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::uom::StockInUom;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InUomQuery {
    pub uom: String,
}

#[derive(Debug, Serialize)]
pub struct StockOnHand {
    pub item_code: String,
    pub warehouse: String,
    pub actual_qty: Decimal,
}

/// Stock on hand in stock UOM
pub async fn get_stock_on_hand(
    State(state): State<AppState>,
    Path((item_code, warehouse)): Path<(String, String)>,
) -> AppResult<Json<StockOnHand>> {
    let actual_qty = state
        .uom_service()
        .get_stock_on_hand(&item_code, &warehouse)
        .await?;
    Ok(Json(StockOnHand {
        item_code,
        warehouse,
        actual_qty,
    }))
}

/// Stock on hand converted to a line's UOM
pub async fn get_stock_in_uom(
    State(state): State<AppState>,
    Path((item_code, warehouse)): Path<(String, String)>,
    Query(query): Query<InUomQuery>,
) -> AppResult<Json<StockInUom>> {
    let stock = state
        .uom_service()
        .convert_stock_to_uom(&item_code, &warehouse, &query.uom)
        .await?;
    Ok(Json(stock))
}
