//! WebAssembly module for the Milk Quality Platform
//!
//! Lets the ERP form scripts run the pure calculations client-side:
//! - FAT/SNF line masses and document totals
//! - Quality reading value derivation
//! - Sequenced lookup results applied to a document
//! - MBRT test duration and weighbridge net weight
//! - UOM checks against an item's conversion table
//!
//! Structured inputs and outputs cross the boundary as JSON strings using the
//! ERP's field names.

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;
use wasm_bindgen::prelude::*;

use shared::{
    aggregate_line, allowed_uoms, elapsed_seconds_str, format_duration, net_weight, validate_item_uoms,
    validate_uom, Item, LinePatch, QualityInspectionReading, ReadingEvent, StalePolicy,
    TransactionDocument,
};

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {}

// ============================================================================
// Aggregation
// ============================================================================

fn line_masses(quantity: f64, fat_percent: f64, snf_percent: f64) -> Result<String, String> {
    to_json(&aggregate_line(
        to_decimal(quantity),
        to_decimal(fat_percent),
        to_decimal(snf_percent),
    ))
}

/// FAT and SNF kilograms carried by one line, as `{fat_kg, snf_kg}` JSON
#[wasm_bindgen]
pub fn calculate_line_masses(quantity: f64, fat_percent: f64, snf_percent: f64) -> Result<String, JsValue> {
    line_masses(quantity, fat_percent, snf_percent).map_err(js_error)
}

fn document_totals(document_json: &str) -> Result<String, String> {
    let mut document: TransactionDocument = parse("document", document_json)?;
    document.recalculate_totals();
    to_json(&document.totals)
}

/// Document totals recomputed from every line
#[wasm_bindgen]
pub fn calculate_document_totals(document_json: &str) -> Result<String, JsValue> {
    document_totals(document_json).map_err(js_error)
}

// ============================================================================
// Quality readings
// ============================================================================

fn reading_event(reading_json: &str, event_json: &str) -> Result<String, String> {
    let mut reading: QualityInspectionReading = parse("reading", reading_json)?;
    let event: ReadingEvent = parse("event", event_json)?;
    reading.apply(event);
    to_json(&reading)
}

/// Apply a status or numeric-flag edit to a reading row
#[wasm_bindgen]
pub fn apply_reading_event(reading_json: &str, event_json: &str) -> Result<String, JsValue> {
    reading_event(reading_json, event_json).map_err(js_error)
}

// ============================================================================
// Lookup results
// ============================================================================

fn line_patch(document_json: &str, patch_json: &str, policy: &str) -> Result<String, String> {
    let mut document: TransactionDocument = parse("document", document_json)?;
    let patch: LinePatch = parse("patch", patch_json)?;
    let policy: StalePolicy = serde_json::from_value(serde_json::Value::String(policy.to_string()))
        .map_err(|_| format!("Unknown stale policy: {}", policy))?;

    let outcome = document.apply_patch(&patch, policy);
    to_json(&serde_json::json!({ "outcome": outcome, "document": document }))
}

/// Apply a lookup result to a document under `policy`
/// (`last_write_wins` or `drop_stale`)
#[wasm_bindgen]
pub fn apply_line_patch(document_json: &str, patch_json: &str, policy: &str) -> Result<String, JsValue> {
    line_patch(document_json, patch_json, policy).map_err(js_error)
}

// ============================================================================
// Form calculations
// ============================================================================

/// MBRT duration as `HH:MM:SS`.
///
/// An end before the start is an error; the form clears the field.
#[wasm_bindgen]
pub fn calculate_mbrt_duration(start: &str, end: &str) -> Result<String, JsValue> {
    match elapsed_seconds_str(start, end) {
        Ok(seconds) => Ok(format_duration(seconds)),
        Err(err) => {
            web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
            Err(js_error(err.to_string()))
        }
    }
}

fn weighbridge_net(first_weight: f64, second_weight: f64, kg_per_litre: f64) -> Result<String, String> {
    to_json(&net_weight(
        to_decimal(first_weight),
        to_decimal(second_weight),
        to_decimal(kg_per_litre),
    ))
}

/// Net weight in kg and litres, as `{net_weight, net_weight_litre}` JSON
#[wasm_bindgen]
pub fn calculate_net_weight(first_weight: f64, second_weight: f64, kg_per_litre: f64) -> Result<String, JsValue> {
    weighbridge_net(first_weight, second_weight, kg_per_litre).map_err(js_error)
}

// ============================================================================
// UOM
// ============================================================================

fn item_uom_check(item_json: &str, uom: &str) -> Result<String, String> {
    let item: Item = parse("item", item_json)?;
    to_json(&validate_uom(Some(&item), Some(&item.item_code), uom))
}

/// Check a UOM choice against the item's conversion table
#[wasm_bindgen]
pub fn validate_item_uom(item_json: &str, uom: &str) -> Result<String, JsValue> {
    item_uom_check(item_json, uom).map_err(js_error)
}

fn item_uoms(item_json: &str) -> Result<String, String> {
    let item: Item = parse("item", item_json)?;
    to_json(&allowed_uoms(Some(&item)))
}

/// UOMs a line may use for the item, as a JSON array
#[wasm_bindgen]
pub fn get_allowed_uoms(item_json: &str) -> Result<String, JsValue> {
    item_uoms(item_json).map_err(js_error)
}

fn uom_table_check(item_json: &str) -> Result<(), String> {
    let item: Item = parse("item", item_json)?;
    item.validate().map_err(|e| e.to_string())?;
    validate_item_uoms(&item).map_err(str::to_string)
}

/// Validate the item's conversion table before save
#[wasm_bindgen]
pub fn validate_uom_table(item_json: &str) -> Result<(), JsValue> {
    uom_table_check(item_json).map_err(js_error)
}
