//! Item master UOM models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An item with its stock UOM and the alternate UOMs it may be transacted in
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Item {
    #[validate(length(min = 1))]
    pub item_code: String,
    #[validate(length(min = 1))]
    pub stock_uom: String,
    #[serde(default, alias = "uoms")]
    pub uom_conversions: Vec<UomConversionEntry>,
}

/// One row of the item's UOM conversion table
///
/// `conversion_factor` follows the ERP convention: a quantity held in stock
/// UOM is expressed in this UOM as `stock_qty / conversion_factor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UomConversionEntry {
    pub uom: String,
    pub conversion_factor: Decimal,
    #[serde(default, alias = "custom_is_primary_uom")]
    pub is_primary: bool,
    #[serde(default, alias = "custom_is_secondary_uom")]
    pub is_secondary: bool,
}

impl UomConversionEntry {
    pub fn new(uom: impl Into<String>, conversion_factor: Decimal) -> Self {
        Self {
            uom: uom.into(),
            conversion_factor,
            is_primary: false,
            is_secondary: false,
        }
    }

    /// Flag this row as primary; a primary row cannot also be secondary
    pub fn set_primary(&mut self, primary: bool) {
        self.is_primary = primary;
        if primary {
            self.is_secondary = false;
        }
    }

    /// Flag this row as secondary; a secondary row cannot also be primary
    pub fn set_secondary(&mut self, secondary: bool) {
        self.is_secondary = secondary;
        if secondary {
            self.is_primary = false;
        }
    }
}

impl Item {
    pub fn new(item_code: impl Into<String>, stock_uom: impl Into<String>) -> Self {
        Self {
            item_code: item_code.into(),
            stock_uom: stock_uom.into(),
            uom_conversions: Vec::new(),
        }
    }

    pub fn with_conversion(mut self, entry: UomConversionEntry) -> Self {
        self.uom_conversions.push(entry);
        self
    }

    /// Conversion row for `uom`, if configured
    pub fn conversion_for(&self, uom: &str) -> Option<&UomConversionEntry> {
        self.uom_conversions.iter().find(|c| c.uom == uom)
    }

    pub fn primary_conversion(&self) -> Option<&UomConversionEntry> {
        self.uom_conversions.iter().find(|c| c.is_primary)
    }

    pub fn secondary_conversion(&self) -> Option<&UomConversionEntry> {
        self.uom_conversions.iter().find(|c| c.is_secondary)
    }

    pub fn primary_uom(&self) -> Option<&str> {
        self.primary_conversion().map(|c| c.uom.as_str())
    }

    pub fn secondary_uom(&self) -> Option<&str> {
        self.secondary_conversion().map(|c| c.uom.as_str())
    }
}

/// Read model returned by `get_item_uom_conversions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemUomConversions {
    pub stock_uom: String,
    pub conversions: Vec<UomConversionEntry>,
}

impl From<&Item> for ItemUomConversions {
    fn from(item: &Item) -> Self {
        Self {
            stock_uom: item.stock_uom.clone(),
            conversions: item.uom_conversions.clone(),
        }
    }
}

/// Outcome of validating a UOM choice against an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UomValidation {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

impl UomValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}
