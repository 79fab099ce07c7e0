//! Rules command - display the rule table in effect for a fiscal year.

use crate::tax::{FiscalYear, TaxRules};
use crate::warnings::RunError;
use clap::Args;
use rust_decimal_macros::dec;
use std::fs::File;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RulesCommand {
    /// Fiscal year key (e.g. 2023-24)
    #[arg(long, default_value = "2023-24")]
    fy: String,

    /// JSON rule table overriding the built-in one
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Tabled)]
struct SlabRow {
    #[tabled(rename = "Upper Bound")]
    upper_bound: String,
    #[tabled(rename = "Rate")]
    rate: String,
}

impl RulesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let fiscal_year = FiscalYear::new(self.fy.clone());
        let rules = match &self.rules {
            Some(path) => TaxRules::from_json(File::open(path)?)?,
            None => TaxRules::builtin(&fiscal_year).ok_or_else(|| RunError::InvalidRuleTable {
                reason: format!(
                    "no built-in rule table for fiscal year {fiscal_year}; pass --rules"
                ),
            })?,
        };

        println!("Rule table for FY {fiscal_year}");
        let slab_rows: Vec<SlabRow> = rules
            .slabs
            .iter()
            .map(|slab| SlabRow {
                upper_bound: slab
                    .upper_bound
                    .map_or("-".to_string(), |b| b.to_string()),
                rate: format!("{}%", (slab.rate * dec!(100)).normalize()),
            })
            .collect();
        let table = Table::new(slab_rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{table}");

        println!(
            "Rebate: up to {} when taxable income <= {}",
            rules.rebate_cap, rules.rebate_threshold
        );
        println!(
            "STCG rate: {}%  LTCG rate: {}% over {} exemption  Cess: {}%",
            (rules.stcg_rate * dec!(100)).normalize(),
            (rules.ltcg_rate * dec!(100)).normalize(),
            rules.ltcg_exemption,
            (rules.cess_rate * dec!(100)).normalize(),
        );
        for (head, cap) in &rules.deduction_caps {
            println!("Cap on {head}: {cap}");
        }
        Ok(())
    }
}
