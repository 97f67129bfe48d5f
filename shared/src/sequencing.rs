//! Sequenced write-back of asynchronous lookup results onto document lines
//!
//! Every lookup issued for a line takes the next value of the line's
//! `request_seq`. Its result comes back as a [`LinePatch`] carrying that
//! number, and [`StalePolicy`] decides what happens when a newer lookup was
//! issued in the meantime.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{QualityFetchState, QualityMetrics, TransactionDocument, TransactionLine};

/// What to do with a patch whose lookup has been superseded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Apply every result as it arrives; the last one to land wins
    #[default]
    LastWriteWins,
    /// Discard results from lookups older than the line's latest
    DropStale,
}

/// One derived-field write produced by a lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum LineChange {
    /// UOM rejected for the item
    ClearUom,
    /// Stock on hand expressed in the line's UOM
    ActualQty { qty: Decimal },
    /// Fetched quality metrics (zero metrics reset the line)
    Quality { metrics: QualityMetrics },
    /// Primary and secondary UOM quantities, always written together
    UomQuantities {
        primary: Option<Decimal>,
        secondary: Option<Decimal>,
    },
}

/// Result of one lookup for one line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinePatch {
    pub line_id: Uuid,
    pub seq: u64,
    pub changes: Vec<LineChange>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    Applied,
    DroppedStale,
    UnknownLine,
}

impl TransactionLine {
    fn apply_change(&mut self, change: &LineChange) {
        match change {
            LineChange::ClearUom => {
                self.uom = None;
                self.actual_qty = None;
            }
            LineChange::ActualQty { qty } => self.actual_qty = Some(*qty),
            LineChange::Quality { metrics } => {
                self.set_quality(metrics);
                self.quality_fetch = if metrics.is_zero() {
                    QualityFetchState::NotFetched
                } else {
                    QualityFetchState::Fetched
                };
            }
            LineChange::UomQuantities { primary, secondary } => {
                self.primary_uom_qty = *primary;
                self.secondary_uom_qty = *secondary;
            }
        }
    }
}

impl TransactionDocument {
    /// Reserve the next request sequence number for a line
    pub fn begin_request(&mut self, line_id: Uuid) -> Option<u64> {
        let line = self.line_mut(line_id)?;
        line.request_seq += 1;
        Some(line.request_seq)
    }

    /// Apply a lookup result, then refresh document totals
    pub fn apply_patch(&mut self, patch: &LinePatch, policy: StalePolicy) -> PatchOutcome {
        let Some(line) = self.line_mut(patch.line_id) else {
            return PatchOutcome::UnknownLine;
        };
        if policy == StalePolicy::DropStale && patch.seq < line.request_seq {
            return PatchOutcome::DroppedStale;
        }
        for change in &patch.changes {
            line.apply_change(change);
        }
        self.recalculate_totals();
        PatchOutcome::Applied
    }
}
