//! Milk procurement pricing
//!
//! A supplier is paid a base rate adjusted by how far the delivered FAT and
//! SNF sit above or below the supplier's contracted baseline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{round3, round_to, AMOUNT_PRECISION};

/// How the base rate is quoted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RateType {
    #[serde(rename = "Per Litre")]
    PerLitre,
    #[serde(rename = "Per KG Fat")]
    PerKgFat,
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateType::PerLitre => write!(f, "Per Litre"),
            RateType::PerKgFat => write!(f, "Per KG Fat"),
        }
    }
}

/// Per-unit adjustment rates for one quality component
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AdjustmentRates {
    #[serde(default)]
    pub addition_enabled: bool,
    #[serde(default)]
    pub addition: Decimal,
    #[serde(default)]
    pub deduction_enabled: bool,
    #[serde(default)]
    pub deduction: Decimal,
}

impl AdjustmentRates {
    /// Returns `(addition, deduction)` for a reading against its baseline.
    /// A zero baseline disables the adjustment.
    fn adjust(&self, reading: Decimal, baseline: Decimal) -> (Decimal, Decimal) {
        if baseline.is_zero() {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let diff = reading - baseline;
        let addition = if self.addition_enabled && diff > Decimal::ZERO {
            diff * self.addition
        } else {
            Decimal::ZERO
        };
        let deduction = if self.deduction_enabled && diff < Decimal::ZERO {
            diff.abs() * self.deduction
        } else {
            Decimal::ZERO
        };
        (addition, deduction)
    }
}

/// Milk type master
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilkTypeConfig {
    pub milk_type: String,
    pub rate_type: RateType,
    #[serde(default)]
    pub fat: AdjustmentRates,
    #[serde(default)]
    pub snf: AdjustmentRates,
}

/// A supplier's contracted terms for one milk type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierMilkProfile {
    pub supplier: String,
    pub milk_type: String,
    #[serde(default)]
    pub baseline_fat: Decimal,
    #[serde(default)]
    pub baseline_snf: Decimal,
    #[serde(default)]
    pub base_rate: Decimal,
    /// The profile used for pricing when a supplier has several per milk type
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilkRateRequest {
    #[serde(default)]
    pub supplier: String,
    #[serde(default, alias = "custom_milk_type")]
    pub milk_type: String,
    #[serde(default, alias = "custom_fat")]
    pub fat_percent: Decimal,
    #[serde(default, alias = "custom_snf")]
    pub snf_percent: Decimal,
    #[serde(default)]
    pub weight_kg: Decimal,
}

impl MilkRateRequest {
    /// Every input is mandatory
    pub fn validate(&self) -> CoreResult<()> {
        if self.supplier.trim().is_empty() {
            return Err(CoreError::validation("Supplier is required to calculate milk rate."));
        }
        if self.milk_type.trim().is_empty() {
            return Err(CoreError::validation("Milk Type is required to calculate milk rate."));
        }
        if self.weight_kg.is_zero() {
            return Err(CoreError::validation("Weight (KG) is required to calculate milk rate."));
        }
        if self.fat_percent.is_zero() {
            return Err(CoreError::validation("FAT % is required to calculate milk rate."));
        }
        if self.snf_percent.is_zero() {
            return Err(CoreError::validation("SNF is required to calculate milk rate."));
        }
        Ok(())
    }
}

/// Itemised result of a rate calculation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilkRateBreakdown {
    pub rate_type: RateType,
    pub qty_litre: Decimal,
    pub kg_per_litre: Decimal,
    pub base_rate: Decimal,
    pub fat_addition: Decimal,
    pub fat_deduction: Decimal,
    pub snf_addition: Decimal,
    pub snf_deduction: Decimal,
    pub final_rate: Decimal,
    pub payable_fat_kg: Decimal,
    pub rate_per_litre_display: Decimal,
    pub amount: Decimal,
}

/// Price a milk receipt line
pub fn calculate_milk_rate(
    request: &MilkRateRequest,
    milk_type: &MilkTypeConfig,
    profile: &SupplierMilkProfile,
    kg_per_litre: Decimal,
) -> CoreResult<MilkRateBreakdown> {
    request.validate()?;
    if profile.base_rate.is_zero() {
        return Err(CoreError::validation(format!(
            "Base Rate not defined for Supplier {} & Milk Type {}",
            request.supplier, request.milk_type
        )));
    }

    let qty_litre = if kg_per_litre.is_zero() {
        Decimal::ZERO
    } else {
        request.weight_kg / kg_per_litre
    };

    let (fat_addition, fat_deduction) = milk_type.fat.adjust(request.fat_percent, profile.baseline_fat);
    let (snf_addition, snf_deduction) = milk_type.snf.adjust(request.snf_percent, profile.baseline_snf);
    let final_rate = profile.base_rate + fat_addition + snf_addition - fat_deduction - snf_deduction;

    let (payable_fat_kg, amount, rate_per_litre_display) = match milk_type.rate_type {
        RateType::PerLitre => (Decimal::ZERO, final_rate * qty_litre, final_rate),
        RateType::PerKgFat => {
            let payable_fat_kg = request.fat_percent / Decimal::ONE_HUNDRED * request.weight_kg;
            let amount = payable_fat_kg * final_rate;
            let display = if qty_litre.is_zero() {
                Decimal::ZERO
            } else {
                amount / qty_litre
            };
            (payable_fat_kg, amount, display)
        }
    };

    Ok(MilkRateBreakdown {
        rate_type: milk_type.rate_type,
        qty_litre: round3(qty_litre),
        kg_per_litre,
        base_rate: round3(profile.base_rate),
        fat_addition: round3(fat_addition),
        fat_deduction: round3(fat_deduction),
        snf_addition: round3(snf_addition),
        snf_deduction: round3(snf_deduction),
        final_rate: round3(final_rate),
        payable_fat_kg: round3(payable_fat_kg),
        rate_per_litre_display: round3(rate_per_litre_display),
        amount: round_to(amount, AMOUNT_PRECISION),
    })
}

/// Check every milk line's milk type against the supplier's profiles.
///
/// A supplier without any milk profile is unrestricted.
pub fn validate_supplier_milk_types(
    supplier: &str,
    allowed: &[String],
    lines: &[crate::models::TransactionLine],
) -> CoreResult<()> {
    if allowed.is_empty() {
        return Ok(());
    }
    for (idx, line) in lines.iter().enumerate().filter(|(_, l)| l.is_milk_type) {
        let item_code = line.item_code.as_deref().unwrap_or_default();
        let Some(milk_type) = line.milk_type.as_deref().filter(|m| !m.is_empty()) else {
            return Err(CoreError::validation(format!(
                "Milk Type is required for milk item {item_code}."
            )));
        };
        if !allowed.iter().any(|a| a == milk_type) {
            return Err(CoreError::validation(format!(
                "Milk Type {milk_type} in row {} is not allowed for Supplier {supplier}. Allowed Milk Types: {}",
                idx + 1,
                allowed.join(", ")
            )));
        }
    }
    Ok(())
}
