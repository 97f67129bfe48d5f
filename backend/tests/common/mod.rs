//! Fixtures shared by the backend integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use milk_quality_backend::{config::Config, AppState, Repositories};
use milk_quality_backend::repository::MemoryStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    AdjustmentRates, BomQuality, DocStatus, InspectionType, Item, MilkTypeConfig, QualityInspection,
    QualityInspectionReading, RateType, ReadingStatus, ReceiptSummary, SupplierMilkProfile,
    UomConversionEntry,
};

pub const RAW_MILK: &str = "RM-MLK-0001";
pub const CURD: &str = "FG-CURD-0001";
pub const CUP: &str = "PKG-CUP-0001";
pub const SILO: &str = "Milk Silo - MQ";
pub const STORE: &str = "Stores - MQ";

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Raw milk: stocked in Kg, primary Kg, secondary Litre at 1.0339 kg/L
pub fn raw_milk() -> Item {
    let mut kg = UomConversionEntry::new("Kg", Decimal::ONE);
    kg.set_primary(true);
    let mut litre = UomConversionEntry::new("Litre", dec("1.0339"));
    litre.set_secondary(true);
    Item::new(RAW_MILK, "Kg").with_conversion(kg).with_conversion(litre)
}

/// Curd: stocked in Kg with no litre conversion
pub fn curd() -> Item {
    Item::new(CURD, "Kg").with_conversion(UomConversionEntry::new("Kg", Decimal::ONE))
}

/// Cups: stocked in Nos, primary Box of 24, secondary Carton of 240
pub fn cup() -> Item {
    let mut boxed = UomConversionEntry::new("Box", dec("24"));
    boxed.set_primary(true);
    let mut carton = UomConversionEntry::new("Carton", dec("240"));
    carton.set_secondary(true);
    Item::new(CUP, "Nos")
        .with_conversion(UomConversionEntry::new("Nos", Decimal::ONE))
        .with_conversion(boxed)
        .with_conversion(carton)
}

/// FAT 4.5, SNF 8.5, LR 28
pub fn full_inspection() -> QualityInspection {
    QualityInspection {
        name: "QI-0001".to_string(),
        readings: vec![
            QualityInspectionReading::numeric("FAT", "4.5"),
            QualityInspectionReading::numeric("SNF", "8.5"),
            QualityInspectionReading::numeric("LR", "28"),
        ],
        ..Default::default()
    }
}

/// FAT 4 and LR 28 only; SNF is derived as 6.74
pub fn lactometer_inspection() -> QualityInspection {
    QualityInspection {
        name: "QI-0002".to_string(),
        readings: vec![
            QualityInspectionReading::numeric("FAT", "4"),
            QualityInspectionReading::numeric("L.R.", "28"),
        ],
        ..Default::default()
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

/// Draft re-test of the raw milk in the silo: FAT 4.2, S.N.F. 8.6
pub fn internal_inspection() -> QualityInspection {
    QualityInspection {
        name: "QI-INT-0001".to_string(),
        inspection_type: InspectionType::Internal,
        item_code: Some(RAW_MILK.to_string()),
        warehouse: Some(SILO.to_string()),
        report_date: Some(day(12)),
        readings: vec![
            QualityInspectionReading::numeric("Fat", "4.2"),
            QualityInspectionReading::numeric("S.N.F.", "8.6"),
        ],
        ..Default::default()
    }
}

/// Submitted tanker inspection against a purchase receipt
pub fn tanker_inspection(name: &str, receipt: &str, report_day: u32) -> QualityInspection {
    QualityInspection {
        name: name.to_string(),
        docstatus: DocStatus::Submitted,
        reference_type: Some("Purchase Receipt".to_string()),
        reference_name: Some(receipt.to_string()),
        report_date: Some(day(report_day)),
        in_time: Some("06:10:00".to_string()),
        out_time: Some("07:05:00".to_string()),
        mbrt_start_time: Some("07:00:00".to_string()),
        mbrt_end_time: Some("12:45:00".to_string()),
        remarks: Some("Sealed".to_string()),
        readings: vec![
            QualityInspectionReading::numeric("Temp", "4"),
            QualityInspectionReading::numeric("Fat", "4.4"),
            QualityInspectionReading::numeric("SNF", "8.6"),
            QualityInspectionReading::qualitative("Urea", ReadingStatus::Rejected),
        ],
        ..Default::default()
    }
}

pub fn tanker_receipt(name: &str, supplier: &str) -> ReceiptSummary {
    ReceiptSummary {
        name: name.to_string(),
        supplier: supplier.to_string(),
        supplier_code: Some("SUP-0001".to_string()),
        tanker_no: Some("GJ-01-AB-1234".to_string()),
        net_weight: Some(dec("10339")),
    }
}

pub fn cow_milk(rate_type: RateType) -> MilkTypeConfig {
    let rates = AdjustmentRates {
        addition_enabled: true,
        addition: dec("2"),
        deduction_enabled: true,
        deduction: dec("3"),
    };
    MilkTypeConfig {
        milk_type: "Cow".to_string(),
        rate_type,
        fat: rates,
        snf: rates,
    }
}

pub fn cow_profile(supplier: &str) -> SupplierMilkProfile {
    SupplierMilkProfile {
        supplier: supplier.to_string(),
        milk_type: "Cow".to_string(),
        baseline_fat: dec("3.5"),
        baseline_snf: dec("8.5"),
        base_rate: dec("40"),
        is_default: true,
    }
}

/// A store holding the three items, two inspections, one BOM and cow milk pricing
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put_item(raw_milk()).await;
    store.put_item(curd()).await;
    store.put_item(cup()).await;
    store.set_actual_qty(RAW_MILK, SILO, dec("10339")).await;
    store.set_actual_qty(CUP, STORE, dec("480")).await;
    store.put_inspection(full_inspection()).await;
    store.put_inspection(lactometer_inspection()).await;
    store.put_inspection(internal_inspection()).await;
    store
        .put_bom(
            "BOM-CURD-001",
            vec![BomQuality {
                item_code: RAW_MILK.to_string(),
                fat_percent: dec("4.5"),
                snf_percent: dec("8.5"),
            }],
        )
        .await;
    store.put_milk_type(cow_milk(RateType::PerLitre)).await;
    store.put_supplier_profile(cow_profile("SUP-0001")).await;
    store
}

pub fn state_with(store: Arc<MemoryStore>, config: Config) -> AppState {
    AppState::new(Repositories::in_memory(store), config)
}

pub fn state(store: Arc<MemoryStore>) -> AppState {
    state_with(store, Config::default())
}
