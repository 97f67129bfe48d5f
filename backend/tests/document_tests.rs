//! Line event orchestration tests
//!
//! Tests for:
//! - Validator / converter / fetcher lookups triggered by field edits
//! - Sequenced patches and the stale-result policy
//! - Document totals recomputed from every line
//! - Work Order BOM quality fetch

mod common;

use common::*;
use milk_quality_backend::config::Config;
use milk_quality_backend::error::AppError;
use milk_quality_backend::services::document::{ApplyPatchRequest, LineEvent, LineEventRequest};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    round3, CoreError, DocumentKind, LineChange, LinePatch, NoticeLevel, PatchOutcome,
    QualityFetchState, StalePolicy, TransactionDocument, TransactionLine,
};
use uuid::Uuid;

fn receipt_line(item_code: &str, quantity: &str) -> TransactionLine {
    let mut line = TransactionLine::new(item_code, dec(quantity));
    line.is_milk_type = item_code == RAW_MILK;
    line
}

fn request(document: &TransactionDocument, line_id: Uuid, event: LineEvent) -> LineEventRequest {
    LineEventRequest {
        document: document.clone(),
        line_id,
        event,
    }
}

// ============================================================================
// UOM lookups
// ============================================================================

#[tokio::test]
async fn test_rejected_uom_is_cleared_after_delay() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.uom = Some("Box".to_string());
    line.warehouse = Some(SILO.to_string());
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::PurchaseReceipt).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::ItemChanged {
                item_code: Some(RAW_MILK.to_string()),
            },
        ))
        .await
        .unwrap();

    assert_eq!(response.uom_clear_delay_ms, Some(500));
    assert_eq!(response.patches.len(), 1);
    assert_eq!(response.patches[0].patch.changes, vec![LineChange::ClearUom]);
    assert_eq!(response.notices.len(), 1);
    assert_eq!(response.notices[0].level, NoticeLevel::Warning);
    assert_eq!(response.notices[0].field.as_deref(), Some("uom"));

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.uom, None);
    assert_eq!(line.actual_qty, None);
}

#[tokio::test]
async fn test_clear_delay_follows_configuration() {
    let mut config = Config::default();
    config.documents.uom_clear_delay_ms = 1200;
    let state = state_with(seeded_store().await, config);

    let line = receipt_line(CUP, "10");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::UomChanged {
                uom: Some("Litre".to_string()),
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.uom_clear_delay_ms, Some(1200));
}

#[tokio::test]
async fn test_uom_change_converts_stock_on_hand() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.warehouse = Some(SILO.to_string());
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::UomChanged {
                uom: Some("Litre".to_string()),
            },
        ))
        .await
        .unwrap();

    assert!(response.notices.is_empty());
    assert_eq!(response.uom_clear_delay_ms, None);
    assert_eq!(response.patches.len(), 1);
    assert_eq!(response.patches[0].outcome, PatchOutcome::Applied);
    assert_eq!(response.patches[0].patch.seq, 1);

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.uom.as_deref(), Some("Litre"));
    assert_eq!(line.actual_qty, Some(dec("10000")));
    assert_eq!(line.request_seq, 1);
}

#[tokio::test]
async fn test_warehouse_change_refreshes_stock() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(CUP, "48");
    line.uom = Some("Box".to_string());
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::WarehouseChanged {
                warehouse: Some(STORE.to_string()),
            },
        ))
        .await
        .unwrap();

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.actual_qty, Some(dec("20")));
}

#[tokio::test]
async fn test_missing_conversion_zeroes_stock_with_error_notice() {
    let store = seeded_store().await;
    let mut curd_with_litre = curd();
    curd_with_litre
        .uom_conversions
        .push(shared::UomConversionEntry::new("Litre", Decimal::ZERO));
    store.put_item(curd_with_litre).await;
    store.set_actual_qty(CURD, STORE, dec("25")).await;
    let state = state(store);

    let mut line = receipt_line(CURD, "5");
    line.warehouse = Some(STORE.to_string());
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::UomChanged {
                uom: Some("Litre".to_string()),
            },
        ))
        .await
        .unwrap();

    assert_eq!(response.notices.len(), 1);
    assert_eq!(response.notices[0].level, NoticeLevel::Error);
    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.actual_qty, Some(Decimal::ZERO));
}

#[tokio::test]
async fn test_work_order_quantity_resolves_primary_then_secondary() {
    let state = state(seeded_store().await);
    let line = receipt_line(CUP, "0");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::WorkOrder).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QuantityChanged { quantity: dec("480") },
        ))
        .await
        .unwrap();

    assert_eq!(
        response.patches[0].patch.changes,
        vec![LineChange::UomQuantities {
            primary: Some(dec("20")),
            secondary: Some(dec("2")),
        }]
    );
    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.primary_uom_qty, Some(dec("20")));
    assert_eq!(line.secondary_uom_qty, Some(dec("2")));
}

#[tokio::test]
async fn test_quantity_change_outside_work_order_skips_uom_quantities() {
    let state = state(seeded_store().await);
    let line = receipt_line(CUP, "0");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QuantityChanged { quantity: dec("480") },
        ))
        .await
        .unwrap();

    assert!(response.patches.is_empty());
    assert_eq!(response.document.line(line_id).unwrap().primary_uom_qty, None);
    assert_eq!(response.document.totals.total_quantity, dec("480"));
}

// ============================================================================
// Quality lookups and totals
// ============================================================================

#[tokio::test]
async fn test_inspection_link_fetches_quality_and_totals() {
    let state = state(seeded_store().await);
    let line = receipt_line(RAW_MILK, "100");
    let line_id = line.id;
    let mut other = receipt_line(RAW_MILK, "50");
    other.fat_kg = dec("1.5");
    other.snf_kg = dec("4");
    let doc = TransactionDocument::new(DocumentKind::PurchaseReceipt)
        .with_line(line)
        .with_line(other);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QualityInspectionChanged {
                quality_inspection: Some("QI-0001".to_string()),
            },
        ))
        .await
        .unwrap();

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.fat_kg, dec("4.5"));
    assert_eq!(line.snf_kg, dec("8.5"));
    assert_eq!(line.lr, dec("28"));
    assert_eq!(line.quality_fetch, QualityFetchState::Fetched);

    let totals = response.document.totals;
    assert_eq!(totals.total_quantity, dec("150"));
    assert_eq!(totals.total_fat_kg, dec("6"));
    assert_eq!(totals.total_snf_kg, dec("12.5"));
    assert_eq!(totals.fat_percentage, dec("4"));
    assert_eq!(round3(totals.snf_percentage), dec("8.333"));
    assert_eq!(totals.total_fat_percentage, None);
}

#[tokio::test]
async fn test_removing_inspection_resets_quality() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.quality_inspection = Some("QI-0001".to_string());
    line.fat_percent = dec("4.5");
    line.fat_kg = dec("4.5");
    line.quality_fetch = QualityFetchState::Fetched;
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::PurchaseReceipt).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QualityInspectionChanged {
                quality_inspection: None,
            },
        ))
        .await
        .unwrap();

    let line = response.document.line(line_id).unwrap();
    assert!(!line.has_quality_values());
    assert_eq!(line.quality_fetch, QualityFetchState::NotFetched);
    assert_eq!(response.document.totals.fat_percentage, Decimal::ZERO);
}

#[tokio::test]
async fn test_unknown_inspection_zeroes_line_with_notice() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.fat_percent = dec("4");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::PurchaseReceipt).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QualityInspectionChanged {
                quality_inspection: Some("QI-9999".to_string()),
            },
        ))
        .await
        .unwrap();

    assert_eq!(response.notices.len(), 1);
    assert_eq!(response.notices[0].field.as_deref(), Some("quality_inspection"));
    assert!(!response.document.line(line_id).unwrap().has_quality_values());
}

#[tokio::test]
async fn test_finished_item_quality_fetched_once() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.is_finished_item = true;
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);
    let event = LineEvent::QualityInspectionChanged {
        quality_inspection: Some("QI-0001".to_string()),
    };

    let service = state.document_service();
    let first = service
        .handle_line_event(request(&doc, line_id, event.clone()))
        .await
        .unwrap();
    let after_first = first.document.line(line_id).unwrap().clone();
    assert_eq!(after_first.fat_kg, dec("4.5"));

    let mut relinked = first.document.clone();
    relinked.line_mut(line_id).unwrap().quality_inspection = Some("QI-0002".to_string());
    let second = service
        .handle_line_event(request(&relinked, line_id, event))
        .await
        .unwrap();

    assert!(second.patches.is_empty());
    let after_second = second.document.line(line_id).unwrap();
    assert_eq!(after_second.fat_percent, after_first.fat_percent);
    assert_eq!(after_second.fat_kg, after_first.fat_kg);
    assert_eq!(after_second.snf_kg, after_first.snf_kg);
}

#[tokio::test]
async fn test_quantity_change_rescales_linked_quality() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.quality_inspection = Some("QI-0001".to_string());
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::PurchaseReceipt).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QuantityChanged { quantity: dec("200") },
        ))
        .await
        .unwrap();

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.fat_kg, dec("9"));
    assert_eq!(line.snf_kg, dec("17"));
    assert_eq!(response.document.totals.fat_percentage, dec("4.5"));
}

#[tokio::test]
async fn test_quantity_change_keeps_manual_quality_on_unlinked_line() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.fat_percent = dec("5");
    line.snf_percent = dec("9");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QuantityChanged { quantity: dec("40") },
        ))
        .await
        .unwrap();

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.fat_percent, dec("5"));
    assert_eq!(line.fat_kg, dec("2"));
    assert_eq!(line.snf_kg, dec("3.6"));
}

#[tokio::test]
async fn test_quality_values_edited_recomputes_masses() {
    let state = state(seeded_store().await);
    let line = receipt_line(RAW_MILK, "200");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::Bom).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QualityValuesEdited {
                fat_percent: Some(dec("4")),
                snf_percent: Some(dec("8.5")),
            },
        ))
        .await
        .unwrap();

    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.fat_kg, dec("8"));
    assert_eq!(line.snf_kg, dec("17"));
    let totals = response.document.totals;
    assert_eq!(totals.total_fat_percentage, Some(dec("4")));
    assert_eq!(totals.total_snf_percentage, Some(dec("8.5")));
}

#[tokio::test]
async fn test_unknown_line_is_not_found() {
    let state = state(seeded_store().await);
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(receipt_line(RAW_MILK, "1"));

    let err = state
        .document_service()
        .handle_line_event(request(
            &doc,
            Uuid::new_v4(),
            LineEvent::QuantityChanged { quantity: dec("2") },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_out_of_range_fat_zeroes_masses_with_notice() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.fat_percent = dec("4");
    line.snf_percent = dec("8");
    line.recalculate_masses();
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QualityValuesEdited {
                fat_percent: Some(dec("140")),
                snf_percent: None,
            },
        ))
        .await
        .unwrap();

    assert_eq!(response.notices.len(), 1);
    assert_eq!(response.notices[0].level, NoticeLevel::Warning);
    assert_eq!(response.notices[0].field.as_deref(), Some("custom_fat"));
    let line = response.document.line(line_id).unwrap();
    assert_eq!(line.fat_kg, Decimal::ZERO);
    assert_eq!(line.snf_kg, Decimal::ZERO);
    assert_eq!(response.document.totals.total_fat_kg, Decimal::ZERO);
}

#[tokio::test]
async fn test_negative_quantity_reported_on_qty() {
    let state = state(seeded_store().await);
    let mut line = receipt_line(RAW_MILK, "100");
    line.fat_percent = dec("4");
    line.snf_percent = dec("8");
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::QuantityChanged { quantity: dec("-5") },
        ))
        .await
        .unwrap();

    assert_eq!(response.notices.len(), 1);
    assert_eq!(response.notices[0].field.as_deref(), Some("qty"));
    assert_eq!(response.notices[0].message, "Quantity cannot be negative");
    assert_eq!(response.document.line(line_id).unwrap().fat_kg, Decimal::ZERO);
}

// ============================================================================
// Stale results
// ============================================================================

#[tokio::test]
async fn test_drop_stale_policy_applies_current_results() {
    let mut config = Config::default();
    config.documents.stale_policy = StalePolicy::DropStale;
    let state = state_with(seeded_store().await, config);

    let mut line = receipt_line(RAW_MILK, "100");
    line.warehouse = Some(SILO.to_string());
    line.request_seq = 7;
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    let response = state
        .document_service()
        .handle_line_event(request(
            &doc,
            line_id,
            LineEvent::UomChanged {
                uom: Some("Kg".to_string()),
            },
        ))
        .await
        .unwrap();

    assert_eq!(response.patches[0].patch.seq, 8);
    assert_eq!(response.patches[0].outcome, PatchOutcome::Applied);
    assert_eq!(response.document.line(line_id).unwrap().actual_qty, Some(dec("10339")));
}

#[tokio::test]
async fn test_drop_stale_discards_superseded_lookup() {
    let mut config = Config::default();
    config.documents.stale_policy = StalePolicy::DropStale;
    let service = state_with(seeded_store().await, config).document_service();

    let mut line = receipt_line(RAW_MILK, "100");
    line.warehouse = Some(SILO.to_string());
    let line_id = line.id;
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(line);

    // Kg lookup goes out first, the user switches to Litre before it lands
    let in_kg = service
        .handle_line_event(request(&doc, line_id, LineEvent::UomChanged { uom: Some("Kg".to_string()) }))
        .await
        .unwrap();
    let late_patch = in_kg.patches[0].patch.clone();
    assert_eq!(late_patch.seq, 1);

    let in_litre = service
        .handle_line_event(request(
            &in_kg.document,
            line_id,
            LineEvent::UomChanged {
                uom: Some("Litre".to_string()),
            },
        ))
        .await
        .unwrap();
    assert_eq!(in_litre.patches[0].patch.seq, 2);

    let merged = service
        .apply_patch(ApplyPatchRequest {
            document: in_litre.document.clone(),
            patch: late_patch.clone(),
        })
        .unwrap();
    assert_eq!(merged.outcome, PatchOutcome::DroppedStale);
    assert_eq!(merged.document.line(line_id).unwrap().actual_qty, Some(dec("10000")));

    // The same late result lands under last-write-wins
    let lenient = state(seeded_store().await).document_service();
    let merged = lenient
        .apply_patch(ApplyPatchRequest {
            document: in_litre.document,
            patch: late_patch,
        })
        .unwrap();
    assert_eq!(merged.outcome, PatchOutcome::Applied);
    assert_eq!(merged.document.line(line_id).unwrap().actual_qty, Some(dec("10339")));
}

#[tokio::test]
async fn test_patch_for_unknown_line_not_found() {
    let state = state(seeded_store().await);
    let doc = TransactionDocument::new(DocumentKind::StockEntry).with_line(receipt_line(RAW_MILK, "1"));
    let err = state
        .document_service()
        .apply_patch(ApplyPatchRequest {
            document: doc,
            patch: LinePatch {
                line_id: Uuid::new_v4(),
                seq: 1,
                changes: vec![LineChange::ClearUom],
            },
        })
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Work Order BOM quality
// ============================================================================

#[tokio::test]
async fn test_bom_quality_copied_to_required_items() {
    let state = state(seeded_store().await);
    let raw = receipt_line(RAW_MILK, "100");
    let raw_id = raw.id;
    let mut finished = receipt_line(CURD, "50");
    finished.is_finished_item = true;
    let doc = TransactionDocument::new(DocumentKind::WorkOrder)
        .with_line(raw)
        .with_line(finished);

    let doc = state
        .document_service()
        .apply_bom_quality(doc, "BOM-CURD-001")
        .await
        .unwrap();

    let raw = doc.line(raw_id).unwrap();
    assert_eq!(raw.fat_percent, dec("4.5"));
    assert_eq!(raw.fat_kg, dec("4.5"));
    assert_eq!(raw.snf_kg, dec("8.5"));
    assert_eq!(doc.totals.total_quantity, dec("150"));
    assert_eq!(doc.totals.fat_percentage, dec("3"));
    assert_eq!(doc.totals.snf_percentage, dec("5.667"));
    assert_eq!(doc.totals.total_fat_percentage, Some(dec("4.5")));
}

#[tokio::test]
async fn test_unknown_bom_not_found() {
    let state = state(seeded_store().await);
    let doc = TransactionDocument::new(DocumentKind::WorkOrder);
    let err = state
        .document_service()
        .apply_bom_quality(doc, "BOM-NONE")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Core(CoreError::NotFound { entity: "BOM", .. })));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Totals always equal the fold of the current lines, whatever order they were edited in
    #[test]
    fn prop_totals_follow_line_edits(
        quantities in prop::collection::vec(0u32..5000, 1..5),
        fat_tenths in 0u32..80,
    ) {
        tokio_test::block_on(async {
            let state = state(seeded_store().await);
            let service = state.document_service();
            let fat = Decimal::new(i64::from(fat_tenths), 1);

            let mut doc = TransactionDocument::new(DocumentKind::StockEntry);
            for _ in &quantities {
                let mut line = receipt_line(RAW_MILK, "0");
                line.fat_percent = fat;
                line.snf_percent = dec("8.5");
                doc.lines.push(line);
            }

            let ids: Vec<Uuid> = doc.lines.iter().map(|l| l.id).collect();
            for (id, qty) in ids.iter().rev().zip(quantities.iter().rev()) {
                let response = service
                    .handle_line_event(request(
                        &doc,
                        *id,
                        LineEvent::QuantityChanged { quantity: Decimal::from(*qty) },
                    ))
                    .await
                    .unwrap();
                doc = response.document;
            }

            let total_qty: Decimal = quantities.iter().map(|q| Decimal::from(*q)).sum();
            let total_fat_kg: Decimal = doc.lines.iter().map(|l| l.fat_kg).sum();
            assert_eq!(doc.totals.total_quantity, total_qty);
            assert_eq!(doc.totals.total_fat_kg, total_fat_kg);
            assert_eq!(total_fat_kg, total_qty * fat / Decimal::ONE_HUNDRED);
        });
    }
}
