//! UOM registry, validation and stock conversion over the item master

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    allowed_uoms, convert_stock_qty, primary_uom_qty, secondary_uom_qty, validate_uom, CoreError,
    Item, ItemUomConversions, UomValidation,
};

use validator::Validate;

use crate::error::AppResult;
use crate::repository::Repositories;

/// UOM service answering item-level unit questions
#[derive(Clone)]
pub struct UomService {
    repos: Repositories,
}

/// Stock on hand expressed in a requested UOM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockInUom {
    pub qty: Decimal,
    /// Set when the item lacks a conversion for the UOM and `qty` was zeroed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Primary and secondary quantities resolved together
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UomQuantities {
    pub primary_uom_qty: Option<Decimal>,
    pub secondary_uom_qty: Option<Decimal>,
}

impl UomService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Fetch an item, failing with `NotFound`, or `ValidationFailed` when its
    /// master record is incomplete
    pub async fn get_item(&self, item_code: &str) -> AppResult<Item> {
        let item = self
            .repos
            .items
            .get_item(item_code)
            .await?
            .ok_or_else(|| CoreError::not_found("Item", item_code))?;
        item.validate()
            .map_err(|e| CoreError::validation(format!("Item {}: {}", item_code, e)))?;
        Ok(item)
    }

    async fn find_item(&self, item_code: Option<&str>) -> AppResult<Option<Item>> {
        match item_code.filter(|c| !c.is_empty()) {
            Some(code) => self.repos.items.get_item(code).await,
            None => Ok(None),
        }
    }

    /// Allowed UOMs; empty for a missing or unknown item
    pub async fn get_allowed_uoms(&self, item_code: Option<&str>) -> AppResult<Vec<String>> {
        let item = self.find_item(item_code).await?;
        Ok(allowed_uoms(item.as_ref()))
    }

    pub async fn validate_item_uom(&self, item_code: Option<&str>, uom: &str) -> AppResult<UomValidation> {
        let item = self.find_item(item_code).await?;
        let result = validate_uom(item.as_ref(), item_code, uom);
        if !result.valid {
            tracing::warn!(item_code = ?item_code, uom, "{}", result.message);
        }
        Ok(result)
    }

    pub async fn get_item_uom_conversions(&self, item_code: &str) -> AppResult<ItemUomConversions> {
        let item = self.get_item(item_code).await?;
        Ok(ItemUomConversions::from(&item))
    }

    /// Stock on hand in stock UOM; no bin reads as zero
    pub async fn get_stock_on_hand(&self, item_code: &str, warehouse: &str) -> AppResult<Decimal> {
        Ok(self
            .repos
            .stock
            .actual_qty(item_code, warehouse)
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    /// Stock on hand expressed in `target_uom`.
    ///
    /// A missing conversion factor is reported in the result with a zero
    /// quantity instead of failing the request.
    pub async fn convert_stock_to_uom(
        &self,
        item_code: &str,
        warehouse: &str,
        target_uom: &str,
    ) -> AppResult<StockInUom> {
        let item = self.get_item(item_code).await?;
        let actual_qty = self.get_stock_on_hand(item_code, warehouse).await?;

        match convert_stock_qty(&item, actual_qty, target_uom) {
            Ok(qty) => Ok(StockInUom { qty, message: None }),
            Err(err @ CoreError::ConfigurationMissing { .. }) => {
                tracing::warn!(item_code, uom = target_uom, "{}", err);
                Ok(StockInUom {
                    qty: Decimal::ZERO,
                    message: Some(err.to_string()),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_primary_uom(&self, item_code: &str) -> AppResult<Option<String>> {
        let item = self.get_item(item_code).await?;
        Ok(item.primary_uom().map(str::to_string))
    }

    pub async fn get_secondary_uom(&self, item_code: &str) -> AppResult<Option<String>> {
        let item = self.get_item(item_code).await?;
        Ok(item.secondary_uom().map(str::to_string))
    }

    pub async fn get_primary_uom_qty(&self, item_code: &str, doc_qty: Decimal) -> AppResult<Option<Decimal>> {
        let item = self.get_item(item_code).await?;
        Ok(primary_uom_qty(&item, doc_qty)?)
    }

    pub async fn get_secondary_uom_qty(
        &self,
        item_code: &str,
        primary_qty: Decimal,
    ) -> AppResult<Option<Decimal>> {
        let item = self.get_item(item_code).await?;
        Ok(secondary_uom_qty(&item, primary_qty)?)
    }

    /// Primary then secondary quantity for a document quantity.
    ///
    /// The secondary stage runs on the primary result; either both values
    /// come back or the whole resolution fails.
    pub async fn resolve_uom_quantities(&self, item_code: &str, doc_qty: Decimal) -> AppResult<UomQuantities> {
        let primary = self.get_primary_uom_qty(item_code, doc_qty).await?;
        let secondary = match primary {
            Some(primary_qty) => self.get_secondary_uom_qty(item_code, primary_qty).await?,
            None => None,
        };
        Ok(UomQuantities {
            primary_uom_qty: primary,
            secondary_uom_qty: secondary,
        })
    }
}
