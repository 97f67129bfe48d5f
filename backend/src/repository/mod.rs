//! Collaborator interfaces
//!
//! The ERP's item master, stock ledger, quality inspections, BOMs, milk
//! pricing masters and the milk quality ledger are reached through these
//! traits, so services run unchanged against PostgreSQL or in memory.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    BomQuality, DocStatus, DocumentKind, Item, LedgerFilter, MilkQualityLedgerEntry, MilkTypeConfig,
    QualityInspection, ReceiptSummary, SupplierMilkProfile,
};
use sqlx::PgPool;

use crate::error::AppResult;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgRepository;

/// Connectivity check for the health endpoint
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Short name of the backing store
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;
}

// =============================================================================
// MASTER DATA
// =============================================================================

/// Item master with UOM conversion tables
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn get_item(&self, item_code: &str) -> AppResult<Option<Item>>;
}

/// Warehouse stock on hand, in stock UOM
#[async_trait]
pub trait StockLedger: Send + Sync {
    async fn actual_qty(&self, item_code: &str, warehouse: &str) -> AppResult<Option<Decimal>>;
}

/// Quality inspections with their readings in row order
#[async_trait]
pub trait InspectionRepository: Send + Sync {
    async fn get_inspection(&self, name: &str) -> AppResult<Option<QualityInspection>>;

    /// Submitted inspections reported between the two dates, inclusive,
    /// ordered by report date then name
    async fn submitted_inspections(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<QualityInspection>>;

    /// Move an inspection to `status`; false when it does not exist
    async fn set_docstatus(&self, name: &str, status: DocStatus) -> AppResult<bool>;
}

/// Purchase Receipt headers
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn get_receipt(&self, name: &str) -> AppResult<Option<ReceiptSummary>>;
}

/// Bills of material with per-row FAT/SNF
#[async_trait]
pub trait BomRepository: Send + Sync {
    async fn get_bom_quality(&self, bom_no: &str) -> AppResult<Option<Vec<BomQuality>>>;
}

/// Milk type masters and supplier milk profiles
#[async_trait]
pub trait PricingRepository: Send + Sync {
    async fn get_milk_type(&self, milk_type: &str) -> AppResult<Option<MilkTypeConfig>>;

    /// The supplier's default profile for a milk type
    async fn get_supplier_profile(
        &self,
        supplier: &str,
        milk_type: &str,
    ) -> AppResult<Option<SupplierMilkProfile>>;

    /// Every milk type the supplier has a profile for
    async fn supplier_milk_types(&self, supplier: &str) -> AppResult<Vec<String>>;
}

// =============================================================================
// MILK QUALITY LEDGER
// =============================================================================

#[async_trait]
pub trait MilkLedgerRepository: Send + Sync {
    async fn insert_entries(&self, entries: &[MilkQualityLedgerEntry]) -> AppResult<()>;

    /// Mark every live entry of a voucher cancelled, returning how many were
    async fn cancel_voucher(&self, voucher_type: DocumentKind, voucher_no: &str) -> AppResult<u64>;

    /// Live entries matching the filter, oldest posting first
    async fn query(&self, filter: &LedgerFilter) -> AppResult<Vec<MilkQualityLedgerEntry>>;

    /// Most recently created live entry for an item in a warehouse
    async fn latest(
        &self,
        item_code: &str,
        warehouse: &str,
    ) -> AppResult<Option<MilkQualityLedgerEntry>>;
}

/// Every collaborator a service may need
#[derive(Clone)]
pub struct Repositories {
    pub health: Arc<dyn HealthCheck>,
    pub items: Arc<dyn ItemRepository>,
    pub stock: Arc<dyn StockLedger>,
    pub inspections: Arc<dyn InspectionRepository>,
    pub receipts: Arc<dyn ReceiptRepository>,
    pub boms: Arc<dyn BomRepository>,
    pub pricing: Arc<dyn PricingRepository>,
    pub ledger: Arc<dyn MilkLedgerRepository>,
}

impl Repositories {
    /// All collaborators backed by one PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        let repo = Arc::new(PgRepository::new(pool));
        Self {
            health: repo.clone(),
            items: repo.clone(),
            stock: repo.clone(),
            inspections: repo.clone(),
            receipts: repo.clone(),
            boms: repo.clone(),
            pricing: repo.clone(),
            ledger: repo,
        }
    }

    /// All collaborators backed by one in-memory store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            health: store.clone(),
            items: store.clone(),
            stock: store.clone(),
            inspections: store.clone(),
            receipts: store.clone(),
            boms: store.clone(),
            pricing: store.clone(),
            ledger: store,
        }
    }
}
