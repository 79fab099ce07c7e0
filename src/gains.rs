//! Capital-gains classification of brokerage line items.

use crate::records::{LineItem, SourceKind};
use crate::vocab::{self, Head};
use crate::warnings::Warning;
use rust_decimal::Decimal;
use serde::Serialize;

/// Signed bucket totals. A negative bucket is a net loss: reported as-is
/// for audit, clamped to zero only when a tax rate is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GainsBuckets {
    pub short_term: Decimal,
    pub long_term: Decimal,
    pub speculative: Decimal,
    pub non_speculative: Decimal,
}

impl GainsBuckets {
    /// Sum over all four buckets. Over fully classified input this equals
    /// the sum of all brokerage line-item amounts (the partition property).
    pub fn classified_total(&self) -> Decimal {
        self.short_term + self.long_term + self.speculative + self.non_speculative
    }
}

/// Partition brokerage line items into the four buckets via the head
/// vocabulary. Items from other sources are ignored; a brokerage tag that
/// resolves to no gains head is an `UnclassifiedGain` warning and enters
/// no bucket. Such an amount is not dropped from the run: if the tag maps
/// to an ordinary income head (a dividend tag, say) the aggregator still
/// counts it there, so the buckets partition only the classified items.
pub fn classify(items: &[LineItem]) -> (GainsBuckets, Vec<Warning>) {
    let mut buckets = GainsBuckets::default();
    let mut warnings = Vec::new();

    for item in items.iter().filter(|i| i.source == SourceKind::Brokerage) {
        match vocab::lookup(&item.category) {
            Some(Head::StcgEquity) => buckets.short_term += item.amount,
            Some(Head::LtcgEquity) => buckets.long_term += item.amount,
            Some(Head::SpeculativeIncome) => buckets.speculative += item.amount,
            Some(Head::NonSpeculativeIncome) => buckets.non_speculative += item.amount,
            _ => warnings.push(Warning::UnclassifiedGain {
                row: item.row,
                tag: item.category.clone(),
            }),
        }
    }
    (buckets, warnings)
}
