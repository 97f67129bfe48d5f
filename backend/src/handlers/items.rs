//! HTTP handlers for item UOM endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{ItemUomConversions, UomValidation};

use crate::error::AppResult;
use crate::services::uom::UomQuantities;
use crate::AppState;

/// Query parameters for UOM validation
#[derive(Debug, Deserialize)]
pub struct ValidateUomQuery {
    pub uom: String,
}

/// Query parameters carrying a quantity
#[derive(Debug, Deserialize)]
pub struct QtyQuery {
    pub qty: Decimal,
}

#[derive(Debug, Serialize)]
pub struct UomResponse {
    pub uom: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QtyResponse {
    pub qty: Option<Decimal>,
}

/// List the UOMs a line may use for an item
pub async fn get_allowed_uoms(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let uoms = state.uom_service().get_allowed_uoms(Some(&item_code)).await?;
    Ok(Json(uoms))
}

/// Check a UOM choice for an item
pub async fn validate_item_uom(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
    Query(query): Query<ValidateUomQuery>,
) -> AppResult<Json<UomValidation>> {
    let result = state
        .uom_service()
        .validate_item_uom(Some(&item_code), &query.uom)
        .await?;
    Ok(Json(result))
}

/// Get the stock UOM and conversion table of an item
pub async fn get_item_uom_conversions(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> AppResult<Json<ItemUomConversions>> {
    let conversions = state.uom_service().get_item_uom_conversions(&item_code).await?;
    Ok(Json(conversions))
}

pub async fn get_primary_uom(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> AppResult<Json<UomResponse>> {
    let uom = state.uom_service().get_primary_uom(&item_code).await?;
    Ok(Json(UomResponse { uom }))
}

pub async fn get_secondary_uom(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> AppResult<Json<UomResponse>> {
    let uom = state.uom_service().get_secondary_uom(&item_code).await?;
    Ok(Json(UomResponse { uom }))
}

/// Document quantity expressed in the primary UOM
pub async fn get_primary_uom_qty(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
    Query(query): Query<QtyQuery>,
) -> AppResult<Json<QtyResponse>> {
    let qty = state
        .uom_service()
        .get_primary_uom_qty(&item_code, query.qty)
        .await?;
    Ok(Json(QtyResponse { qty }))
}

/// Primary-UOM quantity expressed in the secondary UOM
pub async fn get_secondary_uom_qty(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
    Query(query): Query<QtyQuery>,
) -> AppResult<Json<QtyResponse>> {
    let qty = state
        .uom_service()
        .get_secondary_uom_qty(&item_code, query.qty)
        .await?;
    Ok(Json(QtyResponse { qty }))
}

/// Both derived quantities, resolved in sequence
pub async fn get_uom_quantities(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
    Query(query): Query<QtyQuery>,
) -> AppResult<Json<UomQuantities>> {
    let quantities = state
        .uom_service()
        .resolve_uom_quantities(&item_code, query.qty)
        .await?;
    Ok(Json(quantities))
}
