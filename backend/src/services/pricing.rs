//! Milk procurement pricing against milk type masters and supplier profiles

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    calculate_milk_rate, round_to, validate_supplier_milk_types, CoreError, DocumentKind,
    LineNotice, MilkRateBreakdown, MilkRateRequest, RateType, TransactionDocument,
    AMOUNT_PRECISION,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::Repositories;

/// Price computed for one receipt line
#[derive(Debug, Serialize)]
pub struct LinePrice {
    pub line_id: Uuid,
    pub rate: Decimal,
    pub amount: Decimal,
    pub breakdown: MilkRateBreakdown,
}

#[derive(Debug, Serialize)]
pub struct DocumentPricing {
    pub lines: Vec<LinePrice>,
    pub notices: Vec<LineNotice>,
}

#[derive(Clone)]
pub struct PricingService {
    repos: Repositories,
    kg_per_litre: Decimal,
}

impl PricingService {
    pub fn new(repos: Repositories, kg_per_litre: Decimal) -> Self {
        Self { repos, kg_per_litre }
    }

    /// Rate and amount for one delivery
    pub async fn milk_rate(&self, request: &MilkRateRequest) -> AppResult<MilkRateBreakdown> {
        request.validate()?;

        let milk_type = self
            .repos
            .pricing
            .get_milk_type(&request.milk_type)
            .await?
            .ok_or_else(|| CoreError::not_found("Milk Type", request.milk_type.as_str()))?;
        let profile = self
            .repos
            .pricing
            .get_supplier_profile(&request.supplier, &request.milk_type)
            .await?
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "Base Rate not defined for Supplier {} & Milk Type {}",
                    request.supplier, request.milk_type
                ))
            })?;

        Ok(calculate_milk_rate(request, &milk_type, &profile, self.kg_per_litre)?)
    }

    /// Reject milk lines whose milk type the supplier has no profile for
    pub async fn validate_milk_types(&self, document: &TransactionDocument) -> AppResult<()> {
        let Some(supplier) = document.supplier.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let allowed = self.repos.pricing.supplier_milk_types(supplier).await?;
        validate_supplier_milk_types(supplier, &allowed, &document.lines)?;
        Ok(())
    }

    /// Price every milk line of a Purchase Receipt.
    ///
    /// The weighbridge net weight is the priced weight when present, else the
    /// line quantity. Lines missing milk type, FAT or SNF are skipped.
    pub async fn price_document(&self, document: &TransactionDocument) -> AppResult<DocumentPricing> {
        if document.kind != DocumentKind::PurchaseReceipt {
            return Err(AppError::validation("kind", "Milk pricing applies to Purchase Receipts only"));
        }
        let Some(supplier) = document.supplier.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(DocumentPricing {
                lines: Vec::new(),
                notices: Vec::new(),
            });
        };

        let mut lines = Vec::new();
        let mut notices = Vec::new();
        for line in document.lines.iter().filter(|l| l.is_milk_type) {
            let Some(milk_type) = line.milk_type.as_deref().filter(|m| !m.is_empty()) else {
                continue;
            };
            if line.fat_percent.is_zero() || line.snf_percent.is_zero() {
                continue;
            }

            let weight_kg = document
                .net_weight
                .filter(|w| !w.is_zero())
                .unwrap_or(line.quantity);
            let request = MilkRateRequest {
                supplier: supplier.to_string(),
                milk_type: milk_type.to_string(),
                fat_percent: line.fat_percent,
                snf_percent: line.snf_percent,
                weight_kg,
            };

            match self.milk_rate(&request).await {
                Ok(breakdown) => {
                    let amount = match breakdown.rate_type {
                        RateType::PerLitre => round_to(line.quantity * breakdown.final_rate, AMOUNT_PRECISION),
                        RateType::PerKgFat => breakdown.amount,
                    };
                    lines.push(LinePrice {
                        line_id: line.id,
                        rate: breakdown.final_rate,
                        amount,
                        breakdown,
                    });
                }
                Err(AppError::Core(err)) => {
                    tracing::warn!(line_id = %line.id, "{}", err);
                    notices.push(LineNotice::error(line.id, "rate", err.to_string()));
                }
                Err(other) => return Err(other),
            }
        }

        Ok(DocumentPricing { lines, notices })
    }
}
