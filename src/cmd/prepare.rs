//! Prepare command - run the full pipeline and export the summary.

use crate::aggregate;
use crate::gains;
use crate::records::{self, Normalized, RawTable, SourceKind};
use crate::summary::{self, Metadata, Summary};
use crate::tax::{self, FiscalYear, TaxRules};
use crate::warnings::RunError;
use crate::workbook;
use clap::Args;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct PrepareCommand {
    /// Form 16 CSV export
    #[arg(long)]
    form16: PathBuf,

    /// Annual Information Statement CSV export
    #[arg(long)]
    ais: PathBuf,

    /// Taxpayer Information Summary CSV export
    #[arg(long)]
    tis: PathBuf,

    /// Broker tax P&L CSV export
    #[arg(long)]
    brokerage: PathBuf,

    /// Directory for the exported sheets (one CSV per sheet)
    #[arg(short, long, default_value = "itr_summary")]
    out: PathBuf,

    /// Fiscal year key (e.g. 2023-24)
    #[arg(long, default_value = "2023-24")]
    fy: String,

    /// JSON rule table overriding the built-in one for the fiscal year
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON object with filer metadata, e.g. '{"PAN":"ABCDE1234F","Name":"A Filer"}'
    #[arg(long)]
    metadata: Option<String>,

    /// Print the summary as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl PrepareCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let fiscal_year = FiscalYear::new(self.fy.clone());
        let rules = self.load_rules(&fiscal_year)?;
        let metadata = self.parse_metadata(fiscal_year)?;

        let sources: [(SourceKind, &Path); 4] = [
            (SourceKind::Form16, &self.form16),
            (SourceKind::Ais, &self.ais),
            (SourceKind::Tis, &self.tis),
            (SourceKind::Brokerage, &self.brokerage),
        ];

        let mut line_items = Vec::new();
        let mut warnings = Vec::new();
        for (source, path) in sources {
            let table = read_source(path)?;
            let Normalized { items, warnings: w } = records::normalize(source, &table);
            warnings.extend(w);
            if items.is_empty() {
                // Surface what we collected so far: the reason a source came up
                // empty (wrong headers, unreadable amounts) is in the warnings.
                for warning in &warnings {
                    log::warn!("{warning}");
                    eprintln!("warning: {warning}");
                }
                return Err(RunError::EmptySource {
                    source_kind: source,
                }
                .into());
            }
            line_items.extend(items);
        }

        let (totals, aggregate_warnings) = aggregate::aggregate(&line_items);
        warnings.extend(aggregate_warnings);
        let (buckets, gains_warnings) = gains::classify(&line_items);
        warnings.extend(gains_warnings);

        let liability = tax::calculate(&totals, &buckets, &rules);
        let summary = summary::assemble(metadata, line_items, totals, buckets, liability, warnings);

        let paths = workbook::write_sheets(&self.out, &summary.sheets())?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            self.print_summary(&summary);
            println!("Sheets written to {}", self.out.display());
        }
        log::info!("{} sheets exported", paths.len());
        Ok(())
    }

    fn load_rules(&self, fiscal_year: &FiscalYear) -> Result<TaxRules, RunError> {
        match &self.rules {
            Some(path) => {
                let file = File::open(path).map_err(|e| RunError::InvalidRuleTable {
                    reason: format!("{}: {e}", path.display()),
                })?;
                TaxRules::from_json(file)
            }
            None => TaxRules::builtin(fiscal_year).ok_or_else(|| RunError::InvalidRuleTable {
                reason: format!(
                    "no built-in rule table for fiscal year {fiscal_year}; pass --rules"
                ),
            }),
        }
    }

    fn parse_metadata(&self, fiscal_year: FiscalYear) -> anyhow::Result<Metadata> {
        let map: BTreeMap<String, String> = match &self.metadata {
            Some(raw) => serde_json::from_str(raw)?,
            None => BTreeMap::new(),
        };
        Ok(Metadata::from_map(map, fiscal_year)?)
    }

    fn print_summary(&self, summary: &Summary) {
        let rows: Vec<SummaryRow> = summary
            .summary_rows()
            .into_iter()
            .map(|(metric, amount)| SummaryRow { metric, amount })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{table}");

        if !summary.warnings.is_empty() {
            println!();
            println!("WARNINGS ({})", summary.warnings.len());
            for warning in &summary.warnings {
                log::warn!("{warning}");
                println!("  - {warning}");
            }
        }
    }
}

fn read_source(path: &Path) -> anyhow::Result<RawTable> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
    records::read_table(file)
}
