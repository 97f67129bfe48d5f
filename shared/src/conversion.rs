//! UOM validation and quantity conversion against an item's conversion table

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::models::{Item, UomConversionEntry, UomValidation};

/// UOMs a line may use for `item`, in the order they are configured.
///
/// No item (or an item without conversions) yields an empty list: the UOM
/// field offers nothing to pick rather than every UOM.
pub fn allowed_uoms(item: Option<&Item>) -> Vec<String> {
    let mut uoms: Vec<String> = Vec::new();
    for entry in item.map(|i| i.uom_conversions.as_slice()).unwrap_or_default() {
        if !uoms.contains(&entry.uom) {
            uoms.push(entry.uom.clone());
        }
    }
    uoms
}

/// Check a UOM choice against the item's allowed set
pub fn validate_uom(item: Option<&Item>, item_code: Option<&str>, uom: &str) -> UomValidation {
    let Some(item_code) = item_code.filter(|c| !c.is_empty()) else {
        return UomValidation::rejected("Select an item before choosing a UOM.");
    };

    let allowed = allowed_uoms(item);
    if allowed.iter().any(|u| u == uom) {
        return UomValidation::ok();
    }

    if allowed.is_empty() {
        UomValidation::rejected(format!(
            "UOM {uom} is not allowed for Item {item_code}. No UOMs are configured for this item."
        ))
    } else {
        UomValidation::rejected(format!(
            "UOM {uom} is not allowed for Item {item_code}. Allowed UOMs: {}",
            allowed.join(", ")
        ))
    }
}

fn usable_factor<'a>(item: &'a Item, entry: Option<&'a UomConversionEntry>, uom: &str) -> CoreResult<Decimal> {
    match entry {
        Some(e) if e.conversion_factor > Decimal::ZERO => Ok(e.conversion_factor),
        _ => Err(CoreError::ConfigurationMissing {
            item_code: item.item_code.clone(),
            uom: uom.to_string(),
        }),
    }
}

/// Express a stock-UOM quantity in `target_uom`: `actual_qty / conversion_factor`.
///
/// The stock UOM itself converts 1:1. A UOM without a (positive) factor on the
/// item is a configuration error; there is no implicit factor of 1.
pub fn convert_stock_qty(item: &Item, actual_qty: Decimal, target_uom: &str) -> CoreResult<Decimal> {
    if target_uom == item.stock_uom {
        return Ok(actual_qty);
    }
    let factor = usable_factor(item, item.conversion_for(target_uom), target_uom)?;
    Ok(actual_qty / factor)
}

/// Quantity in the item's primary UOM for a document quantity held in stock UOM.
///
/// `Ok(None)` when the item has no primary UOM.
pub fn primary_uom_qty(item: &Item, doc_qty: Decimal) -> CoreResult<Option<Decimal>> {
    match item.primary_uom() {
        Some(uom) => convert_stock_qty(item, doc_qty, uom).map(Some),
        None => Ok(None),
    }
}

/// Quantity in the item's secondary UOM, derived from a primary-UOM quantity.
///
/// `Ok(None)` when the item lacks either a primary or a secondary UOM.
pub fn secondary_uom_qty(item: &Item, primary_qty: Decimal) -> CoreResult<Option<Decimal>> {
    let (Some(primary), Some(secondary)) = (item.primary_conversion(), item.secondary_conversion()) else {
        return Ok(None);
    };

    let stock_qty = if primary.uom == item.stock_uom {
        primary_qty
    } else {
        primary_qty * usable_factor(item, Some(primary), &primary.uom)?
    };
    convert_stock_qty(item, stock_qty, &secondary.uom).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Raw milk stocked in Kg; 1 Litre = 1.0339 Kg, 1 Can = 40 Kg
    fn milk() -> Item {
        let mut litre = UomConversionEntry::new("Litre", dec("1.0339"));
        litre.set_primary(true);
        let mut can = UomConversionEntry::new("Can", dec("40"));
        can.set_secondary(true);
        Item::new("RM-MLK-0001", "Kg")
            .with_conversion(UomConversionEntry::new("Kg", Decimal::ONE))
            .with_conversion(litre)
            .with_conversion(can)
    }

    #[test]
    fn test_allowed_uoms() {
        let item = milk();
        assert_eq!(allowed_uoms(Some(&item)), vec!["Kg", "Litre", "Can"]);
        assert!(allowed_uoms(None).is_empty());
        assert!(allowed_uoms(Some(&Item::new("X", "Nos"))).is_empty());
    }

    #[test]
    fn test_validate_uom() {
        let item = milk();
        assert!(validate_uom(Some(&item), Some("RM-MLK-0001"), "Litre").valid);

        let rejected = validate_uom(Some(&item), Some("RM-MLK-0001"), "Crate");
        assert!(!rejected.valid);
        assert!(rejected.message.contains("Crate"));
        assert!(rejected.message.contains("Kg, Litre, Can"));

        assert!(!validate_uom(Some(&item), None, "Litre").valid);
    }

    #[test]
    fn test_convert_stock_uom_is_identity() {
        assert_eq!(convert_stock_qty(&milk(), dec("250"), "Kg").unwrap(), dec("250"));
    }

    /// Factors are "target units per stock unit" inverted: stock / factor
    #[test]
    fn test_convert_divides_by_factor() {
        let qty = convert_stock_qty(&milk(), dec("400"), "Can").unwrap();
        assert_eq!(qty, dec("10"));
        assert_ne!(qty, dec("16000"), "factor must divide, not multiply");
    }

    #[test]
    fn test_convert_missing_factor_is_configuration_error() {
        let err = convert_stock_qty(&milk(), dec("10"), "Crate").unwrap_err();
        assert_eq!(
            err,
            CoreError::ConfigurationMissing {
                item_code: "RM-MLK-0001".into(),
                uom: "Crate".into()
            }
        );
        assert_eq!(err.to_string(), "Conversion factor not defined for Crate in Item RM-MLK-0001");
    }

    #[test]
    fn test_zero_factor_is_configuration_error() {
        let item = Item::new("FG-CRD-0001", "Kg").with_conversion(UomConversionEntry::new("Cup", Decimal::ZERO));
        assert!(matches!(
            convert_stock_qty(&item, dec("1"), "Cup"),
            Err(CoreError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn test_primary_then_secondary() {
        let item = milk();
        let primary = primary_uom_qty(&item, dec("1033.9")).unwrap().unwrap();
        assert_eq!(primary, dec("1000"));
        let secondary = secondary_uom_qty(&item, primary).unwrap().unwrap();
        assert_eq!(round_secondary(secondary), dec("25.848"));
    }

    fn round_secondary(d: Decimal) -> Decimal {
        crate::types::round3(d)
    }

    #[test]
    fn test_primary_secondary_absent() {
        let item = Item::new("PK-BOX-0001", "Nos");
        assert_eq!(primary_uom_qty(&item, dec("5")).unwrap(), None);
        assert_eq!(secondary_uom_qty(&item, dec("5")).unwrap(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// validate() accepts exactly the UOMs in allowed_uoms()
        #[test]
        fn prop_validate_iff_allowed(uom in prop_oneof![
            Just("Kg"), Just("Litre"), Just("Can"), Just("Crate"), Just("Nos"), Just("")
        ]) {
            let item = milk();
            let allowed = allowed_uoms(Some(&item));
            let result = validate_uom(Some(&item), Some(&item.item_code), uom);
            prop_assert_eq!(result.valid, allowed.iter().any(|u| u == uom));
        }

        /// Converting to a UOM and scaling back by its factor returns the stock quantity
        #[test]
        fn prop_conversion_inverts(stock in 0i64..1_000_000i64) {
            let item = milk();
            let stock = Decimal::new(stock, 2);
            let cans = convert_stock_qty(&item, stock, "Can").unwrap();
            prop_assert_eq!(cans * dec("40"), stock);
        }
    }
}
