//! Line and document FAT/SNF aggregation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AggregationProfile, DocumentTotals, TransactionLine};
use crate::types::round_to;

/// FAT/SNF mass carried by one line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LineMasses {
    pub fat_kg: Decimal,
    pub snf_kg: Decimal,
}

/// Convert a line's percentages to kilograms
pub fn aggregate_line(quantity: Decimal, fat_percent: Decimal, snf_percent: Decimal) -> LineMasses {
    if quantity.is_zero() {
        return LineMasses::default();
    }
    let hundred = Decimal::ONE_HUNDRED;
    LineMasses {
        fat_kg: quantity * fat_percent / hundred,
        snf_kg: quantity * snf_percent / hundred,
    }
}

/// Quantity-weighted percentage: `mass / quantity * 100`, zero for zero quantity
pub fn weighted_percentage(mass: Decimal, quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        mass / quantity * Decimal::ONE_HUNDRED
    }
}

/// Fold every line into document totals.
///
/// Always recomputed from the full set of lines, never patched incrementally.
pub fn aggregate_document(lines: &[TransactionLine], profile: AggregationProfile) -> DocumentTotals {
    let mut total_quantity = Decimal::ZERO;
    let mut total_fat_kg = Decimal::ZERO;
    let mut total_snf_kg = Decimal::ZERO;
    let mut total_fat_percent = Decimal::ZERO;
    let mut total_snf_percent = Decimal::ZERO;

    for line in lines {
        total_quantity += line.quantity;
        total_fat_kg += line.fat_kg;
        total_snf_kg += line.snf_kg;
        total_fat_percent += line.fat_percent;
        total_snf_percent += line.snf_percent;
    }

    let round = |value: Decimal| match profile.round_dp {
        Some(dp) => round_to(value, dp),
        None => value,
    };

    DocumentTotals {
        total_quantity: round(total_quantity),
        total_fat_kg: round(total_fat_kg),
        total_snf_kg: round(total_snf_kg),
        fat_percentage: round(weighted_percentage(total_fat_kg, total_quantity)),
        snf_percentage: round(weighted_percentage(total_snf_kg, total_quantity)),
        total_fat_percentage: profile.emit_percentage_sums.then(|| round(total_fat_percent)),
        total_snf_percentage: profile.emit_percentage_sums.then(|| round(total_snf_percent)),
    }
}
