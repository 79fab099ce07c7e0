//! The fixed category→head vocabulary.
//!
//! Every category slug a normalizer can emit maps to exactly one head here,
//! many-to-one. Centralizing the mapping keeps the aggregator and the gains
//! classifier independently testable and the vocabulary auditable against
//! the rule table in use.

use serde::Serialize;
use std::fmt;

/// How a head participates in the tax computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadKind {
    /// Taxed through the slab schedule.
    OrdinaryIncome,
    /// Reduces the slab base, subject to per-head caps from the rule table.
    Deduction,
    /// TDS / advance tax; offsets the final liability, never the base.
    TaxesPaid,
    /// Brokerage gains; taxed via the gains buckets, kept in the totals
    /// for audit only.
    CapitalGains,
}

/// The enumerated income/deduction heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Head {
    GrossSalary,
    SalaryExemptions,
    InterestIncome,
    DividendIncome,
    RentalIncome,
    OtherIncome,
    Deduction80c,
    Deduction80d,
    DeductionOther,
    TaxesPaid,
    StcgEquity,
    LtcgEquity,
    SpeculativeIncome,
    NonSpeculativeIncome,
}

impl Head {
    pub const ALL: [Head; 14] = [
        Head::GrossSalary,
        Head::SalaryExemptions,
        Head::InterestIncome,
        Head::DividendIncome,
        Head::RentalIncome,
        Head::OtherIncome,
        Head::Deduction80c,
        Head::Deduction80d,
        Head::DeductionOther,
        Head::TaxesPaid,
        Head::StcgEquity,
        Head::LtcgEquity,
        Head::SpeculativeIncome,
        Head::NonSpeculativeIncome,
    ];

    pub fn kind(&self) -> HeadKind {
        match self {
            Head::GrossSalary
            | Head::InterestIncome
            | Head::DividendIncome
            | Head::RentalIncome
            | Head::OtherIncome => HeadKind::OrdinaryIncome,
            Head::SalaryExemptions
            | Head::Deduction80c
            | Head::Deduction80d
            | Head::DeductionOther => HeadKind::Deduction,
            Head::TaxesPaid => HeadKind::TaxesPaid,
            Head::StcgEquity
            | Head::LtcgEquity
            | Head::SpeculativeIncome
            | Head::NonSpeculativeIncome => HeadKind::CapitalGains,
        }
    }

    /// Stable snake_case key, used for rule-table cap lookups and JSON.
    pub fn key(&self) -> &'static str {
        match self {
            Head::GrossSalary => "gross_salary",
            Head::SalaryExemptions => "salary_exemptions",
            Head::InterestIncome => "interest_income",
            Head::DividendIncome => "dividend_income",
            Head::RentalIncome => "rental_income",
            Head::OtherIncome => "other_income",
            Head::Deduction80c => "deduction_80c",
            Head::Deduction80d => "deduction_80d",
            Head::DeductionOther => "deduction_other",
            Head::TaxesPaid => "taxes_paid",
            Head::StcgEquity => "stcg_equity",
            Head::LtcgEquity => "ltcg_equity",
            Head::SpeculativeIncome => "speculative_income",
            Head::NonSpeculativeIncome => "non_speculative_income",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Head::GrossSalary => "Gross Salary",
            Head::SalaryExemptions => "Salary Exemptions",
            Head::InterestIncome => "Interest Income",
            Head::DividendIncome => "Dividend Income",
            Head::RentalIncome => "Rental Income",
            Head::OtherIncome => "Other Income",
            Head::Deduction80c => "Deductions u/s 80C",
            Head::Deduction80d => "Deductions u/s 80D",
            Head::DeductionOther => "Other Chapter VI-A Deductions",
            Head::TaxesPaid => "Taxes Paid (TDS/Advance)",
            Head::StcgEquity => "STCG (111A)",
            Head::LtcgEquity => "LTCG (112A)",
            Head::SpeculativeIncome => "Speculative Income",
            Head::NonSpeculativeIncome => "Non-Speculative Business Income",
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolve a normalized category slug to its head. `None` means the
/// category is outside the vocabulary and the row becomes an
/// `UnknownCategory` warning.
pub fn lookup(category: &str) -> Option<Head> {
    let head = match category {
        "gross_salary" | "gross_salary_a" | "gross_total_income" | "salary" => Head::GrossSalary,
        "exempt_allowances"
        | "allowances_to_the_extent_exempt_under_section10"
        | "allowances_exempt_under_section_10"
        | "hra_exemption"
        | "lta_exemption"
        | "standard_deduction"
        | "standard_deduction_us_16ia"
        | "professional_tax"
        | "profession_tax"
        | "section_16_iii_professional_tax" => Head::SalaryExemptions,
        "interest" | "interest_income" | "bank_interest" | "savings_interest" | "fd_interest" => {
            Head::InterestIncome
        }
        "dividend" | "dividend_income" => Head::DividendIncome,
        "rent" | "rental_income" | "house_property" => Head::RentalIncome,
        "other_income"
        | "others"
        | "other_income_declared"
        | "other_income_from_house_property_declared"
        | "family_pension" => Head::OtherIncome,
        "tds" | "tax_deducted_at_source" | "tax_deducted" | "taxes_paid" => Head::TaxesPaid,
        _ => return lookup_patterned(category),
    };
    Some(head)
}

/// Section-80 and brokerage categories carry free-form suffixes
/// ("section_80c_pf", "stcg_equity_delivery"), so they match on patterns
/// rather than the exact table above.
fn lookup_patterned(category: &str) -> Option<Head> {
    if let Some(section) = category.strip_prefix("deduction:") {
        return Some(section_head(section));
    }
    if category.starts_with("section_80") || category.starts_with("80") {
        return Some(section_head(category));
    }
    // Gains tags: non-speculative before speculative, the latter is a
    // substring of the former.
    if ["non_speculat", "fno", "futures", "currency", "commodity"]
        .iter()
        .any(|p| category.contains(p))
    {
        return Some(Head::NonSpeculativeIncome);
    }
    if category.contains("speculat") || category.contains("intraday") {
        return Some(Head::SpeculativeIncome);
    }
    if category.contains("stcg") || category.contains("short") {
        return Some(Head::StcgEquity);
    }
    if category.contains("ltcg") || category.contains("long") {
        return Some(Head::LtcgEquity);
    }
    None
}

fn section_head(section: &str) -> Head {
    if section.contains("80c") {
        Head::Deduction80c
    } else if section.contains("80d") {
        Head::Deduction80d
    } else {
        Head::DeductionOther
    }
}
