//! Final summary assembly: pure composition of the pipeline's outputs,
//! plus the presentation-side sheet layout.

use crate::aggregate::AggregateTotals;
use crate::gains::GainsBuckets;
use crate::records::{LineItem, SourceKind};
use crate::tax::{FiscalYear, LiabilityBreakdown};
use crate::vocab::Head;
use crate::warnings::{RunError, Warning};
use crate::workbook::Sheet;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// Filer details carried through untouched; only presence is validated.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub pan: String,
    pub name: String,
    pub fiscal_year: FiscalYear,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Build from a free-form key→value mapping; PAN and Name are required.
    pub fn from_map(
        mut map: BTreeMap<String, String>,
        fiscal_year: FiscalYear,
    ) -> Result<Metadata, RunError> {
        let take = |map: &mut BTreeMap<String, String>, key: &str| {
            let found = map.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned();
            found
                .and_then(|k| map.remove(&k))
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| RunError::MissingMetadata {
                    key: key.to_string(),
                })
        };
        let pan = take(&mut map, "pan")?;
        let name = take(&mut map, "name")?;
        Ok(Metadata {
            pan,
            name,
            fiscal_year,
            extra: map,
        })
    }
}

/// The consolidated output of one run, handed to the sink and discarded.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub metadata: Metadata,
    pub totals: AggregateTotals,
    pub buckets: GainsBuckets,
    pub liability: LiabilityBreakdown,
    /// TDS plus advance/self-assessment tax, offset against the liability.
    pub taxes_paid: Decimal,
    /// total_tax minus taxes_paid; negative means a refund is due.
    pub net_payable: Decimal,
    pub line_items: Vec<LineItem>,
    pub warnings: Vec<Warning>,
}

/// Compose the run's outputs. No computation beyond the taxes-paid offset,
/// no failure modes of its own.
pub fn assemble(
    metadata: Metadata,
    line_items: Vec<LineItem>,
    totals: AggregateTotals,
    buckets: GainsBuckets,
    liability: LiabilityBreakdown,
    warnings: Vec<Warning>,
) -> Summary {
    let taxes_paid = totals.get(Head::TaxesPaid);
    let net_payable = liability.total_tax - taxes_paid;
    Summary {
        metadata,
        totals,
        buckets,
        liability,
        taxes_paid,
        net_payable,
        line_items,
        warnings,
    }
}

/// Round to the nearest currency unit. Presentation only; every upstream
/// value stays unrounded.
pub fn to_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

impl Summary {
    /// Metric/Amount rows for the Summary sheet and the console table.
    pub fn summary_rows(&self) -> Vec<(String, String)> {
        let money = |d: Decimal| to_currency(d).to_string();
        let mut rows = vec![
            ("PAN".to_string(), self.metadata.pan.clone()),
            ("Name".to_string(), self.metadata.name.clone()),
            (
                "Fiscal Year".to_string(),
                self.metadata.fiscal_year.to_string(),
            ),
        ];
        for (key, value) in &self.metadata.extra {
            rows.push((key.clone(), value.clone()));
        }
        for (head, total) in self.totals.iter() {
            rows.push((head.label().to_string(), money(total)));
        }
        // Bucket totals stay signed; set-off of losses is manual.
        for (label, total) in [
            ("Short-Term Gains (signed, set-off manual)", self.buckets.short_term),
            ("Long-Term Gains (signed, set-off manual)", self.buckets.long_term),
            ("Speculative (signed, set-off manual)", self.buckets.speculative),
            (
                "Non-Speculative (signed, set-off manual)",
                self.buckets.non_speculative,
            ),
        ] {
            rows.push((label.to_string(), money(total)));
        }
        rows.push((
            "Taxable Income (slab base)".to_string(),
            money(self.liability.taxable_income),
        ));
        rows.push(("Slab Tax".to_string(), money(self.liability.slab_tax)));
        rows.push(("Rebate u/s 87A".to_string(), money(self.liability.rebate)));
        rows.push(("STCG Tax".to_string(), money(self.liability.stcg_tax)));
        rows.push(("LTCG Tax".to_string(), money(self.liability.ltcg_tax)));
        rows.push((
            "Health & Education Cess".to_string(),
            money(self.liability.cess),
        ));
        rows.push((
            "Total Tax Payable".to_string(),
            money(self.liability.total_tax),
        ));
        rows.push(("Taxes Paid (TDS + Advance)".to_string(), money(self.taxes_paid)));
        rows.push((
            "Net Tax Payable/Refund".to_string(),
            money(self.net_payable),
        ));
        rows.push(("Warnings".to_string(), self.warnings.len().to_string()));
        rows
    }

    /// One sheet per source with normalized line items, a Summary sheet,
    /// and a Warnings sheet when anything was flagged.
    pub fn sheets(&self) -> Vec<Sheet> {
        let mut sheets = vec![Sheet {
            name: "Summary".to_string(),
            header: vec!["Metric".to_string(), "Amount".to_string()],
            rows: self
                .summary_rows()
                .into_iter()
                .map(|(metric, amount)| vec![metric, amount])
                .collect(),
        }];

        for source in SourceKind::ALL {
            let rows: Vec<Vec<String>> = self
                .line_items
                .iter()
                .filter(|item| item.source == source)
                .map(|item| {
                    vec![
                        item.row.to_string(),
                        item.category.clone(),
                        item.description.clone().unwrap_or_default(),
                        item.amount.to_string(),
                    ]
                })
                .collect();
            sheets.push(Sheet {
                name: source.label().to_string(),
                header: vec![
                    "Row".to_string(),
                    "Category".to_string(),
                    "Description".to_string(),
                    "Amount".to_string(),
                ],
                rows,
            });
        }

        if !self.warnings.is_empty() {
            sheets.push(Sheet {
                name: "Warnings".to_string(),
                header: vec!["Warning".to_string()],
                rows: self
                    .warnings
                    .iter()
                    .map(|w| vec![w.to_string()])
                    .collect(),
            });
        }
        sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::tax::{self, TaxRules};
    use rust_decimal_macros::dec;

    fn metadata() -> Metadata {
        Metadata::from_map(
            BTreeMap::from([
                ("PAN".to_string(), "ABCDE1234F".to_string()),
                ("Name".to_string(), "A Filer".to_string()),
            ]),
            FiscalYear::new("2023-24"),
        )
        .unwrap()
    }

    fn sample_summary() -> Summary {
        let items = vec![
            LineItem {
                source: SourceKind::Form16,
                row: 1,
                category: "gross_salary".to_string(),
                description: None,
                amount: dec!(800000),
            },
            LineItem {
                source: SourceKind::Form16,
                row: 2,
                category: "tds".to_string(),
                description: None,
                amount: dec!(40000),
            },
            LineItem {
                source: SourceKind::Brokerage,
                row: 1,
                category: "stcg_equity".to_string(),
                description: None,
                amount: dec!(-20000),
            },
        ];
        let (totals, mut warnings) = aggregate(&items);
        let (buckets, gw) = crate::gains::classify(&items);
        warnings.extend(gw);
        let rules = TaxRules::builtin(&FiscalYear::new("2023-24")).unwrap();
        let liability = tax::calculate(&totals, &buckets, &rules);
        assemble(metadata(), items, totals, buckets, liability, warnings)
    }

    #[test]
    fn metadata_requires_pan_and_name() {
        let err = Metadata::from_map(
            BTreeMap::from([("Name".to_string(), "A Filer".to_string())]),
            FiscalYear::new("2023-24"),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::MissingMetadata { ref key } if key == "pan"));
    }

    #[test]
    fn metadata_keys_case_insensitive_extras_kept() {
        let md = Metadata::from_map(
            BTreeMap::from([
                ("pan".to_string(), "ABCDE1234F".to_string()),
                ("NAME".to_string(), "A Filer".to_string()),
                ("Aadhaar".to_string(), "XXXX".to_string()),
            ]),
            FiscalYear::new("2023-24"),
        )
        .unwrap();
        assert_eq!(md.pan, "ABCDE1234F");
        assert_eq!(md.extra.len(), 1);
    }

    #[test]
    fn taxes_paid_offset_in_net_payable() {
        let summary = sample_summary();
        assert_eq!(summary.taxes_paid, dec!(40000));
        assert_eq!(
            summary.net_payable,
            summary.liability.total_tax - dec!(40000)
        );
    }

    #[test]
    fn signed_loss_survives_to_summary_rows() {
        let summary = sample_summary();
        assert_eq!(summary.buckets.short_term, dec!(-20000));
        let rows = summary.summary_rows();
        let stcg_row = rows
            .iter()
            .find(|(m, _)| m.starts_with("Short-Term Gains"))
            .unwrap();
        assert_eq!(stcg_row.1, "-20000");
        // But no tax was charged on the loss.
        assert_eq!(summary.liability.stcg_tax, Decimal::ZERO);
    }

    #[test]
    fn one_sheet_per_source_plus_summary() {
        let summary = sample_summary();
        let sheets = summary.sheets();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Summary", "Form16", "AIS", "TIS", "Brokerage"]);
        assert_eq!(sheets[1].rows.len(), 2);
        assert_eq!(sheets[4].rows.len(), 1);
    }

    #[test]
    fn warnings_sheet_present_when_flagged() {
        let mut summary = sample_summary();
        summary.warnings.push(Warning::UnclassifiedGain {
            row: 9,
            tag: "crypto".to_string(),
        });
        let sheets = summary.sheets();
        assert_eq!(sheets.last().unwrap().name, "Warnings");
    }

    #[test]
    fn rounding_at_presentation_only() {
        assert_eq!(to_currency(dec!(12500.50)), dec!(12501));
        assert_eq!(to_currency(dec!(-12500.50)), dec!(-12501));
        assert_eq!(to_currency(dec!(12500.49)), dec!(12500));
    }
}
