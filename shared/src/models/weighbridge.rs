//! Weighbridge readings on a Purchase Receipt
//!
//! A tanker is weighed loaded and again empty; the difference is the milk
//! received, also expressed in litres using the milk density.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net weight derived from two weighings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetWeight {
    pub net_weight: Decimal,
    pub net_weight_litre: Decimal,
}

/// Compute net weight in kg and litres
pub fn net_weight(first_weight: Decimal, second_weight: Decimal, kg_per_litre: Decimal) -> NetWeight {
    let net = first_weight - second_weight;
    let litres = if kg_per_litre.is_zero() {
        Decimal::ZERO
    } else {
        crate::types::round3(net / kg_per_litre)
    };
    NetWeight {
        net_weight: net,
        net_weight_litre: litres,
    }
}

/// Weighbridge fields of a receipt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WeighbridgeReading {
    #[serde(default, rename = "custom_first_weight")]
    pub first_weight: Option<Decimal>,
    #[serde(default, rename = "custom_second_weight")]
    pub second_weight: Option<Decimal>,
    #[serde(default, rename = "custom_net_weight")]
    pub net_weight: Option<Decimal>,
    #[serde(default, rename = "custom_net_weight_litre")]
    pub net_weight_litre: Option<Decimal>,
}

/// Which weighing was just edited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeighingField {
    First,
    Second,
}

impl WeighbridgeReading {
    /// Record an edit and refresh the derived net weight.
    ///
    /// Editing the second weight always recomputes. Editing the first weight
    /// recomputes only once a second weight exists.
    pub fn record(&mut self, field: WeighingField, value: Decimal, kg_per_litre: Decimal) {
        match field {
            WeighingField::First => self.first_weight = Some(value),
            WeighingField::Second => self.second_weight = Some(value),
        }
        let recompute = match field {
            WeighingField::Second => true,
            WeighingField::First => self.second_weight.is_some(),
        };
        if recompute {
            let first = self.first_weight.unwrap_or(Decimal::ZERO);
            let second = self.second_weight.unwrap_or(Decimal::ZERO);
            let net = net_weight(first, second, kg_per_litre);
            self.net_weight = Some(net.net_weight);
            self.net_weight_litre = Some(net.net_weight_litre);
        }
    }
}
