//! Business logic services for the Milk Quality Platform

pub mod document;
pub mod ledger;
pub mod pricing;
pub mod quality;
pub mod uom;

pub use document::DocumentService;
pub use ledger::LedgerService;
pub use pricing::PricingService;
pub use quality::QualityService;
pub use uom::UomService;
