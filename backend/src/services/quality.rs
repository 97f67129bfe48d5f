//! Quality metrics fetched from inspections

use rust_decimal::Decimal;
use shared::{
    normalize_readings, raw_milk_test_row, CoreError, DocumentKind, QualityInspectionReading,
    QualityMetrics, RawMilkTestFilter, RawMilkTestRow, TransactionLine,
};

use crate::error::AppResult;
use crate::repository::Repositories;

/// Outcome of refreshing one line's quality
#[derive(Debug, Clone, PartialEq)]
pub enum QualityRefresh {
    /// Metrics to write onto the line (zero when the inspection link is gone)
    Update(QualityMetrics),
    /// Fetch-once line already carries values
    Kept,
}

#[derive(Clone)]
pub struct QualityService {
    repos: Repositories,
}

impl QualityService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// FAT/SNF metrics of an inspection scaled to `quantity`.
    ///
    /// No inspection yields zero metrics. `lr` is only reported for
    /// document kinds that carry a lactometer reading.
    pub async fn compute_quality_metrics(
        &self,
        quality_inspection: Option<&str>,
        quantity: Decimal,
        kind: DocumentKind,
    ) -> AppResult<QualityMetrics> {
        let Some(name) = quality_inspection.filter(|n| !n.is_empty()) else {
            return Ok(QualityMetrics::zero());
        };

        let inspection = self
            .repos
            .inspections
            .get_inspection(name)
            .await?
            .ok_or_else(|| CoreError::not_found("Quality Inspection", name))?;

        let metrics = QualityMetrics::from_percentages(
            inspection.percentages(),
            quantity,
            kind.carries_lactometer_reading(),
        );
        tracing::debug!(
            inspection = name,
            fat = %metrics.fat_percent,
            snf = %metrics.snf_percent,
            "Computed quality metrics"
        );
        Ok(metrics)
    }

    /// Metrics to apply to a line, honouring the fetch-once rule.
    ///
    /// An unlinked line is always reset to zero first, so it cannot keep
    /// quality values after its inspection is removed.
    pub async fn refresh_line(&self, kind: DocumentKind, line: &TransactionLine) -> AppResult<QualityRefresh> {
        if line.quality_inspection.as_deref().map_or(true, str::is_empty) {
            return Ok(QualityRefresh::Update(QualityMetrics::zero()));
        }
        if !line.accepts_quality_fetch(kind) {
            tracing::debug!(line_id = %line.id, "Keeping existing quality values on finished item");
            return Ok(QualityRefresh::Kept);
        }
        let metrics = self
            .compute_quality_metrics(line.quality_inspection.as_deref(), line.quantity, kind)
            .await?;
        Ok(QualityRefresh::Update(metrics))
    }

    /// Re-derive `reading_value` on every row
    pub fn normalize(&self, mut readings: Vec<QualityInspectionReading>) -> Vec<QualityInspectionReading> {
        normalize_readings(&mut readings);
        readings
    }

    /// Raw Milk Testing Report rows, in report date order
    pub async fn raw_milk_testing_report(&self, filter: RawMilkTestFilter) -> AppResult<Vec<RawMilkTestRow>> {
        filter.date_range()?;
        let inspections = self
            .repos
            .inspections
            .submitted_inspections(filter.from_date, filter.to_date)
            .await?;

        let mut rows = Vec::new();
        for inspection in inspections.iter().filter(|qi| filter.matches_inspection(qi)) {
            let receipt = match inspection.reference_name.as_deref().filter(|r| !r.is_empty()) {
                Some(name) => self.repos.receipts.get_receipt(name).await?,
                None => None,
            };
            if !filter.matches_receipt(receipt.as_ref()) {
                continue;
            }
            rows.push(raw_milk_test_row(inspection, receipt.as_ref()));
        }
        tracing::debug!(rows = rows.len(), "Built raw milk testing report");
        Ok(rows)
    }
}
