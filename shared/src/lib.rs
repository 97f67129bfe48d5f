//! Shared types and calculations for the Milk Quality Platform
//!
//! This crate holds the unit-of-measure and FAT/SNF aggregation core that is
//! shared between the backend, the ERP form scripts (via WASM), and tests.
//! Nothing in here performs I/O.

pub mod aggregation;
pub mod conversion;
pub mod duration;
pub mod error;
pub mod models;
pub mod sequencing;
pub mod types;
pub mod validation;

pub use aggregation::*;
pub use conversion::*;
pub use duration::*;
pub use error::*;
pub use models::*;
pub use sequencing::*;
pub use types::*;
pub use validation::*;
