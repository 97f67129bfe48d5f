//! In-memory collaborators for tests and local runs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    BomQuality, DocStatus, DocumentKind, Item, LedgerFilter, MilkQualityLedgerEntry, MilkTypeConfig,
    QualityInspection, ReceiptSummary, SupplierMilkProfile,
};
use tokio::sync::RwLock;

use super::{
    BomRepository, HealthCheck, InspectionRepository, ItemRepository, MilkLedgerRepository, PricingRepository,
    ReceiptRepository, StockLedger,
};
use crate::error::AppResult;

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Item>>,
    bins: RwLock<HashMap<(String, String), Decimal>>,
    inspections: RwLock<HashMap<String, QualityInspection>>,
    receipts: RwLock<HashMap<String, ReceiptSummary>>,
    boms: RwLock<HashMap<String, Vec<BomQuality>>>,
    milk_types: RwLock<HashMap<String, MilkTypeConfig>>,
    profiles: RwLock<Vec<SupplierMilkProfile>>,
    ledger: RwLock<Vec<MilkQualityLedgerEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_item(&self, item: Item) {
        self.items.write().await.insert(item.item_code.clone(), item);
    }

    pub async fn set_actual_qty(&self, item_code: &str, warehouse: &str, qty: Decimal) {
        self.bins
            .write()
            .await
            .insert((item_code.to_string(), warehouse.to_string()), qty);
    }

    pub async fn put_inspection(&self, inspection: QualityInspection) {
        self.inspections
            .write()
            .await
            .insert(inspection.name.clone(), inspection);
    }

    pub async fn put_receipt(&self, receipt: ReceiptSummary) {
        self.receipts.write().await.insert(receipt.name.clone(), receipt);
    }

    pub async fn put_bom(&self, bom_no: &str, rows: Vec<BomQuality>) {
        self.boms.write().await.insert(bom_no.to_string(), rows);
    }

    pub async fn put_milk_type(&self, config: MilkTypeConfig) {
        self.milk_types
            .write()
            .await
            .insert(config.milk_type.clone(), config);
    }

    pub async fn put_supplier_profile(&self, profile: SupplierMilkProfile) {
        self.profiles.write().await.push(profile);
    }

    /// Every ledger entry, cancelled ones included, in insertion order
    pub async fn ledger_entries(&self) -> Vec<MilkQualityLedgerEntry> {
        self.ledger.read().await.clone()
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn get_item(&self, item_code: &str) -> AppResult<Option<Item>> {
        Ok(self.items.read().await.get(item_code).cloned())
    }
}

#[async_trait]
impl StockLedger for MemoryStore {
    async fn actual_qty(&self, item_code: &str, warehouse: &str) -> AppResult<Option<Decimal>> {
        let key = (item_code.to_string(), warehouse.to_string());
        Ok(self.bins.read().await.get(&key).copied())
    }
}

#[async_trait]
impl InspectionRepository for MemoryStore {
    async fn get_inspection(&self, name: &str) -> AppResult<Option<QualityInspection>> {
        Ok(self.inspections.read().await.get(name).cloned())
    }

    async fn submitted_inspections(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<QualityInspection>> {
        let mut inspections: Vec<QualityInspection> = self
            .inspections
            .read()
            .await
            .values()
            .filter(|qi| qi.docstatus == DocStatus::Submitted)
            .filter(|qi| qi.report_date.map_or(false, |d| d >= from && d <= to))
            .cloned()
            .collect();
        inspections.sort_by(|a, b| (a.report_date, &a.name).cmp(&(b.report_date, &b.name)));
        Ok(inspections)
    }

    async fn set_docstatus(&self, name: &str, status: DocStatus) -> AppResult<bool> {
        match self.inspections.write().await.get_mut(name) {
            Some(inspection) => {
                inspection.docstatus = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ReceiptRepository for MemoryStore {
    async fn get_receipt(&self, name: &str) -> AppResult<Option<ReceiptSummary>> {
        Ok(self.receipts.read().await.get(name).cloned())
    }
}

#[async_trait]
impl BomRepository for MemoryStore {
    async fn get_bom_quality(&self, bom_no: &str) -> AppResult<Option<Vec<BomQuality>>> {
        Ok(self.boms.read().await.get(bom_no).cloned())
    }
}

#[async_trait]
impl PricingRepository for MemoryStore {
    async fn get_milk_type(&self, milk_type: &str) -> AppResult<Option<MilkTypeConfig>> {
        Ok(self.milk_types.read().await.get(milk_type).cloned())
    }

    async fn get_supplier_profile(
        &self,
        supplier: &str,
        milk_type: &str,
    ) -> AppResult<Option<SupplierMilkProfile>> {
        Ok(self
            .profiles
            .read()
            .await
            .iter()
            .find(|p| p.supplier == supplier && p.milk_type == milk_type && p.is_default)
            .cloned())
    }

    async fn supplier_milk_types(&self, supplier: &str) -> AppResult<Vec<String>> {
        let mut types: Vec<String> = Vec::new();
        for profile in self.profiles.read().await.iter().filter(|p| p.supplier == supplier) {
            if !types.contains(&profile.milk_type) {
                types.push(profile.milk_type.clone());
            }
        }
        Ok(types)
    }
}

#[async_trait]
impl MilkLedgerRepository for MemoryStore {
    async fn insert_entries(&self, entries: &[MilkQualityLedgerEntry]) -> AppResult<()> {
        self.ledger.write().await.extend_from_slice(entries);
        Ok(())
    }

    async fn cancel_voucher(&self, voucher_type: DocumentKind, voucher_no: &str) -> AppResult<u64> {
        let mut cancelled = 0;
        for entry in self.ledger.write().await.iter_mut() {
            if entry.voucher_type == voucher_type && entry.voucher_no == voucher_no && !entry.is_cancelled {
                entry.is_cancelled = true;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn query(&self, filter: &LedgerFilter) -> AppResult<Vec<MilkQualityLedgerEntry>> {
        let mut entries: Vec<MilkQualityLedgerEntry> = self
            .ledger
            .read()
            .await
            .iter()
            .filter(|e| !e.is_cancelled && filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.posting_date, e.posting_time));
        Ok(entries)
    }

    async fn latest(
        &self,
        item_code: &str,
        warehouse: &str,
    ) -> AppResult<Option<MilkQualityLedgerEntry>> {
        Ok(self
            .ledger
            .read()
            .await
            .iter()
            .rev()
            .find(|e| !e.is_cancelled && e.item_code == item_code && e.warehouse == warehouse)
            .cloned())
    }
}
