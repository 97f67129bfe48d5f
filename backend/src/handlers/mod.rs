//! HTTP request handlers

pub mod documents;
pub mod health;
pub mod items;
pub mod ledger;
pub mod pricing;
pub mod quality;
pub mod stock;
pub mod tools;

pub use documents::*;
pub use health::*;
pub use items::*;
pub use ledger::*;
pub use pricing::*;
pub use quality::*;
pub use stock::*;
pub use tools::*;
