//! Validation utilities for item master data and quality figures

use rust_decimal::Decimal;

use crate::models::{Item, TransactionLine, UomConversionEntry};

// ============================================================================
// UOM Conversion Table
// ============================================================================

/// At most one row may be flagged primary and at most one secondary
pub fn validate_uom_flags(item: &Item) -> Result<(), &'static str> {
    let primaries = item.uom_conversions.iter().filter(|c| c.is_primary).count();
    if primaries > 1 {
        return Err("Only one Primary UOM is allowed in UOM Conversion table.");
    }
    let secondaries = item.uom_conversions.iter().filter(|c| c.is_secondary).count();
    if secondaries > 1 {
        return Err("Only one Secondary UOM is allowed in UOM Conversion table.");
    }
    if item.uom_conversions.iter().any(|c| c.is_primary && c.is_secondary) {
        return Err("A UOM cannot be both Primary and Secondary.");
    }
    Ok(())
}

/// Conversion factors must be strictly positive
pub fn validate_conversion_factor(entry: &UomConversionEntry) -> Result<(), &'static str> {
    if entry.conversion_factor <= Decimal::ZERO {
        return Err("Conversion factor must be greater than zero");
    }
    Ok(())
}

/// Full check of an item's UOM table
pub fn validate_item_uoms(item: &Item) -> Result<(), &'static str> {
    for entry in &item.uom_conversions {
        validate_conversion_factor(entry)?;
    }
    validate_uom_flags(item)
}

// ============================================================================
// Quality Figures
// ============================================================================

/// FAT and SNF percentages lie in 0..=100
pub fn validate_percentage(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO || value > Decimal::from(100) {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Quantity may be zero but never negative
pub fn validate_quantity(qty: Decimal) -> Result<(), &'static str> {
    if qty < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// A failed line check and the ERP field it concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Sanity check a line before its masses are recomputed
pub fn validate_line(line: &TransactionLine) -> Result<(), FieldError> {
    let check = |field: &'static str, result: Result<(), &'static str>| {
        result.map_err(|message| FieldError { field, message })
    };
    check("qty", validate_quantity(line.quantity))?;
    check("custom_fat", validate_percentage(line.fat_percent))?;
    check("custom_snf", validate_percentage(line.snf_percent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milk_item() -> Item {
        let mut litre = UomConversionEntry::new("Litre", Decimal::new(10339, 4));
        litre.set_primary(true);
        let mut can = UomConversionEntry::new("Can", Decimal::from(40));
        can.set_secondary(true);
        Item::new("RM-MLK-0001", "Kg")
            .with_conversion(UomConversionEntry::new("Kg", Decimal::ONE))
            .with_conversion(litre)
            .with_conversion(can)
    }

    // ========================================================================
    // UOM Conversion Table Tests
    // ========================================================================

    #[test]
    fn test_validate_uom_flags_valid() {
        assert!(validate_uom_flags(&milk_item()).is_ok());
        assert!(validate_item_uoms(&milk_item()).is_ok());
    }

    #[test]
    fn test_validate_uom_flags_two_primary() {
        let mut extra = UomConversionEntry::new("Ml", Decimal::new(1, 3));
        extra.set_primary(true);
        let item = milk_item().with_conversion(extra);
        assert_eq!(
            validate_uom_flags(&item),
            Err("Only one Primary UOM is allowed in UOM Conversion table.")
        );
    }

    #[test]
    fn test_validate_uom_flags_two_secondary() {
        let mut extra = UomConversionEntry::new("Crate", Decimal::from(12));
        extra.set_secondary(true);
        let item = milk_item().with_conversion(extra);
        assert_eq!(
            validate_uom_flags(&item),
            Err("Only one Secondary UOM is allowed in UOM Conversion table.")
        );
    }

    #[test]
    fn test_validate_uom_flags_both_on_one_row() {
        let mut entry = UomConversionEntry::new("Litre", Decimal::ONE);
        entry.is_primary = true;
        entry.is_secondary = true;
        let item = Item::new("X", "Kg").with_conversion(entry);
        assert!(validate_uom_flags(&item).is_err());
    }

    #[test]
    fn test_validate_conversion_factor() {
        assert!(validate_conversion_factor(&UomConversionEntry::new("Kg", Decimal::ONE)).is_ok());
        assert!(validate_conversion_factor(&UomConversionEntry::new("Kg", Decimal::ZERO)).is_err());
        assert!(validate_conversion_factor(&UomConversionEntry::new("Kg", Decimal::from(-2))).is_err());
    }

    // ========================================================================
    // Quality Figure Tests
    // ========================================================================

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(Decimal::ZERO).is_ok());
        assert!(validate_percentage(Decimal::new(45, 1)).is_ok());
        assert!(validate_percentage(Decimal::from(100)).is_ok());
        assert!(validate_percentage(Decimal::from(101)).is_err());
        assert!(validate_percentage(Decimal::new(-1, 1)).is_err());
    }

    #[test]
    fn test_validate_line() {
        let mut line = TransactionLine::new("RM-MLK-0001", Decimal::from(100));
        line.fat_percent = Decimal::from(4);
        assert!(validate_line(&line).is_ok());

        line.snf_percent = Decimal::from(120);
        assert_eq!(validate_line(&line).unwrap_err().field, "custom_snf");

        line.quantity = Decimal::from(-1);
        assert_eq!(
            validate_line(&line),
            Err(FieldError {
                field: "qty",
                message: "Quantity cannot be negative"
            })
        );
    }
}
