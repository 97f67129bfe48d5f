//! Error kinds raised by the calculation core

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by the UOM and quality core.
///
/// None of these are fatal: callers recover at the line level by clearing or
/// zeroing the affected derived field and surfacing the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conversion factor not defined for {uom} in Item {item_code}")]
    ConfigurationMissing { item_code: String, uom: String },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("End time {end} is before start time {start}")]
    InvalidRange { start: String, end: String },

    #[error("From Date {from} cannot be greater than To Date {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::ValidationFailed(message.into())
    }

    /// Stable machine-readable code, used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::ConfigurationMissing { .. } => "CONFIGURATION_MISSING",
            CoreError::ValidationFailed(_) => "VALIDATION_FAILED",
            CoreError::InvalidRange { .. } => "INVALID_RANGE",
            CoreError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
