//! Domain models for the Milk Quality Platform

mod document;
mod item;
mod ledger;
mod pricing;
mod quality;
mod raw_milk;
mod weighbridge;

pub use document::*;
pub use item::*;
pub use ledger::*;
pub use pricing::*;
pub use quality::*;
pub use raw_milk::*;
pub use weighbridge::*;
