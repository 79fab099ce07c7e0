//! Liability computation: a pure function of totals, buckets and rules.
//!
//! All values stay unrounded `Decimal`s here; rounding to the currency unit
//! happens once, at presentation.

use crate::aggregate::AggregateTotals;
use crate::gains::GainsBuckets;
use crate::tax::rules::TaxRules;
use crate::vocab::{Head, HeadKind};
use rust_decimal::Decimal;
use serde::Serialize;

/// Computed tax liability. Fully reproducible from its inputs; identical
/// inputs yield an identical breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiabilityBreakdown {
    /// Slab base: ordinary income plus business-income buckets, net of
    /// capped deductions, excluding special-rate gains.
    pub taxable_income: Decimal,
    pub slab_tax: Decimal,
    pub rebate: Decimal,
    pub stcg_tax: Decimal,
    pub ltcg_tax: Decimal,
    pub cess: Decimal,
    pub total_tax: Decimal,
}

const DEDUCTION_HEADS: [Head; 4] = [
    Head::SalaryExemptions,
    Head::Deduction80c,
    Head::Deduction80d,
    Head::DeductionOther,
];

/// Apply a fiscal year's rule table to the aggregated totals and gains
/// buckets. Negative buckets contribute zero taxable gain; their signed
/// totals survive in the summary for manual set-off.
pub fn calculate(
    totals: &AggregateTotals,
    buckets: &GainsBuckets,
    rules: &TaxRules,
) -> LiabilityBreakdown {
    let ordinary_income = totals.sum_kind(HeadKind::OrdinaryIncome);

    let deductions: Decimal = DEDUCTION_HEADS
        .iter()
        .map(|head| {
            let claimed = totals.get(*head).max(Decimal::ZERO);
            match rules.deduction_cap(*head) {
                Some(cap) => claimed.min(cap),
                None => claimed,
            }
        })
        .sum();

    // Speculative and non-speculative business income are ordinary income;
    // short/long-term gains are taxed outside the slabs.
    let business_income =
        buckets.speculative.max(Decimal::ZERO) + buckets.non_speculative.max(Decimal::ZERO);

    let taxable_income = (ordinary_income + business_income - deductions).max(Decimal::ZERO);
    let slab_tax = slab_tax(taxable_income, rules);

    let rebate = if taxable_income <= rules.rebate_threshold {
        slab_tax.min(rules.rebate_cap)
    } else {
        Decimal::ZERO
    };

    let stcg_tax = buckets.short_term.max(Decimal::ZERO) * rules.stcg_rate;
    let ltcg_taxable = (buckets.long_term.max(Decimal::ZERO) - rules.ltcg_exemption)
        .max(Decimal::ZERO);
    let ltcg_tax = ltcg_taxable * rules.ltcg_rate;

    let cess = (slab_tax - rebate + stcg_tax + ltcg_tax) * rules.cess_rate;
    let total_tax = slab_tax - rebate + stcg_tax + ltcg_tax + cess;

    log::debug!(
        "taxable {taxable_income}, slab {slab_tax}, rebate {rebate}, \
         stcg {stcg_tax}, ltcg {ltcg_tax}, cess {cess}, total {total_tax}"
    );

    LiabilityBreakdown {
        taxable_income,
        slab_tax,
        rebate,
        stcg_tax,
        ltcg_tax,
        cess,
        total_tax,
    }
}

/// Progressive marginal schedule: income in each bracket taxed at that
/// bracket's rate.
fn slab_tax(taxable: Decimal, rules: &TaxRules) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    for slab in &rules.slabs {
        let upper = slab.upper_bound.unwrap_or(taxable.max(lower));
        let span = (taxable.min(upper) - lower).max(Decimal::ZERO);
        tax += span * slab.rate;
        if taxable <= upper {
            break;
        }
        lower = upper;
    }
    tax
}
