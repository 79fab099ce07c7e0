//! Per-head totals across all sources.

use crate::records::LineItem;
use crate::vocab::{self, Head, HeadKind};
use crate::warnings::Warning;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summed amounts per head, in exact decimal arithmetic. Built once per run
/// and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTotals {
    totals: BTreeMap<Head, Decimal>,
}

impl AggregateTotals {
    pub fn get(&self, head: Head) -> Decimal {
        self.totals.get(&head).copied().unwrap_or(Decimal::ZERO)
    }

    /// Heads with a non-empty total, in enum order.
    pub fn iter(&self) -> impl Iterator<Item = (Head, Decimal)> + '_ {
        self.totals.iter().map(|(h, d)| (*h, *d))
    }

    pub fn sum_kind(&self, kind: HeadKind) -> Decimal {
        self.totals
            .iter()
            .filter(|(h, _)| h.kind() == kind)
            .map(|(_, d)| *d)
            .sum()
    }
}

/// Fold line items into per-head totals. A category outside the vocabulary
/// yields an `UnknownCategory` warning and the item is excluded; all other
/// items are counted exactly once.
pub fn aggregate(items: &[LineItem]) -> (AggregateTotals, Vec<Warning>) {
    let mut warnings = Vec::new();
    let totals = items.iter().fold(BTreeMap::new(), |mut acc, item| {
        match vocab::lookup(&item.category) {
            Some(head) => {
                *acc.entry(head).or_insert(Decimal::ZERO) += item.amount;
            }
            None => warnings.push(Warning::UnknownCategory {
                source_kind: item.source,
                row: item.row,
                category: item.category.clone(),
            }),
        }
        acc
    });
    (AggregateTotals { totals }, warnings)
}
