//! Route definitions for the Milk Quality Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Item UOM lookups
        .nest("/items", item_routes())
        // Stock on hand
        .nest("/stock", stock_routes())
        // Quality inspections
        .nest("/quality-inspections", quality_routes())
        // Document events and totals
        .nest("/documents", document_routes())
        // Milk pricing
        .nest("/pricing", pricing_routes())
        // Milk Quality Ledger
        .nest("/ledger", ledger_routes())
        // Reports
        .route("/reports/raw-milk-testing", get(handlers::raw_milk_testing_report))
        // Stateless form calculations
        .route("/mbrt/duration", post(handlers::mbrt_duration))
        .route("/weighbridge/net-weight", post(handlers::net_weight))
}

/// Item UOM routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/:item_code/uoms", get(handlers::get_allowed_uoms))
        .route("/:item_code/uoms/validate", get(handlers::validate_item_uom))
        .route("/:item_code/uom-conversions", get(handlers::get_item_uom_conversions))
        .route("/:item_code/primary-uom", get(handlers::get_primary_uom))
        .route("/:item_code/secondary-uom", get(handlers::get_secondary_uom))
        .route("/:item_code/primary-uom-qty", get(handlers::get_primary_uom_qty))
        .route("/:item_code/secondary-uom-qty", get(handlers::get_secondary_uom_qty))
        .route("/:item_code/uom-quantities", get(handlers::get_uom_quantities))
}

/// Stock routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/:item_code/:warehouse", get(handlers::get_stock_on_hand))
        .route("/:item_code/:warehouse/in-uom", get(handlers::get_stock_in_uom))
}

/// Quality inspection routes
fn quality_routes() -> Router<AppState> {
    Router::new()
        .route("/readings/normalize", post(handlers::normalize_readings))
        .route("/:name/metrics", get(handlers::compute_quality_metrics))
        .route("/:name/submit", post(handlers::submit_inspection))
        .route("/:name/cancel", post(handlers::cancel_inspection))
}

/// Document routes
fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/totals", post(handlers::recalculate_totals))
        .route("/line-event", post(handlers::handle_line_event))
        .route("/apply-patch", post(handlers::apply_line_patch))
        .route("/bom-quality", post(handlers::apply_bom_quality))
        .route("/ledger-prefill", post(handlers::prefill_from_ledger))
}

/// Pricing routes
fn pricing_routes() -> Router<AppState> {
    Router::new()
        .route("/milk-rate", post(handlers::calculate_milk_rate))
        .route("/document", post(handlers::price_document))
        .route("/validate-milk-types", post(handlers::validate_milk_types))
}

/// Ledger routes
fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::query_entries))
        .route("/post", post(handlers::post_entries))
        .route("/cancel", post(handlers::cancel_entries))
        .route("/latest", get(handlers::latest_quality))
}
