//! Raw row ingestion and normalization into [`LineItem`]s.
//!
//! Each source ships its own column headings; matching is done on slugs so
//! that "Reported Amount", "reported_amount" and "Reported  amount" all
//! resolve to the same column, as long as the user follows the CSV templates.

use crate::warnings::Warning;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::io::Read;

/// The four statement sources consolidated into the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SourceKind {
    Form16,
    Ais,
    Tis,
    Brokerage,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Form16,
        SourceKind::Ais,
        SourceKind::Tis,
        SourceKind::Brokerage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Form16 => "Form16",
            SourceKind::Ais => "AIS",
            SourceKind::Tis => "TIS",
            SourceKind::Brokerage => "Brokerage",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed tabular input: headers plus rows of raw string cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV file into a [`RawTable`] without interpreting any values.
pub fn read_table<R: Read>(reader: R) -> anyhow::Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

/// A normalized line item. Immutable once produced; everything downstream
/// consumes these read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub source: SourceKind,
    /// 1-based data row index in the source file, for warning context.
    pub row: usize,
    /// Slugified semantic category (e.g. "interest_income", "section_80c_pf").
    pub category: String,
    pub description: Option<String>,
    /// Signed amount; losses and negative adjustments keep their sign.
    pub amount: Decimal,
}

/// Lowercase identifier derived from a header or category cell.
/// "Section 80C (PF)" -> "section_80c_pf"
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_underscore = true;
    for ch in value.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
            last_underscore = false;
        } else if !last_underscore {
            slug.push('_');
            last_underscore = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Parse a locale-formatted signed decimal.
///
/// Accepts thousands separators ("1,23,456.78"), parentheses as negative
/// ("(1500)") and a leading sign. A blank or whitespace-only value is zero.
/// Returns `None` when the value does not parse.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Decimal::ZERO);
    }
    let (negative, body) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };
    let cleaned: String = body
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned.as_str());
    cleaned
        .parse::<Decimal>()
        .ok()
        .map(|d| if negative { -d } else { d })
}

/// Output of normalizing one source.
#[derive(Debug, Default)]
pub struct Normalized {
    pub items: Vec<LineItem>,
    pub warnings: Vec<Warning>,
}

/// Column-heading alternatives per source, matched on slugs
/// in the order given.
const FORM16_CATEGORY: &[&str] = &["field", "section", "component"];
const FORM16_AMOUNT: &[&str] = &["amount", "value", "amt"];
const AIS_CATEGORY: &[&str] = &["category", "head", "type"];
const AIS_AMOUNT: &[&str] = &["amount", "value", "reported_amount"];
const AIS_DESCRIPTION: &[&str] = &["description", "details", "source"];
const TIS_TYPE: &[&str] = &["type", "entry_type"];
const TIS_AMOUNT: &[&str] = &["amount", "value"];
const TIS_CATEGORY: &[&str] = &["category", "section", "description"];
const BROKER_CATEGORY: &[&str] = &["type", "category"];
const BROKER_AMOUNT: &[&str] = &["amount", "net", "pnl"];
const BROKER_DESCRIPTION: &[&str] = &["description", "segment", "notes"];

/// Map raw rows from one source into line items, collecting row-level
/// warnings rather than aborting. Output order is input order.
pub fn normalize(source: SourceKind, table: &RawTable) -> Normalized {
    match source {
        SourceKind::Form16 => normalize_flat(source, table, FORM16_CATEGORY, FORM16_AMOUNT, &[]),
        SourceKind::Ais => {
            normalize_flat(source, table, AIS_CATEGORY, AIS_AMOUNT, AIS_DESCRIPTION)
        }
        SourceKind::Tis => normalize_tis(table),
        SourceKind::Brokerage => normalize_flat(
            source,
            table,
            BROKER_CATEGORY,
            BROKER_AMOUNT,
            BROKER_DESCRIPTION,
        ),
    }
}

fn find_column(headers: &[String], alternatives: &[&str]) -> Option<usize> {
    let slugs: Vec<String> = headers.iter().map(|h| slugify(h)).collect();
    alternatives
        .iter()
        .find_map(|alt| slugs.iter().position(|s| s == alt))
}

fn cell<'a>(row: &'a [String], col: usize) -> &'a str {
    row.get(col).map(String::as_str).unwrap_or("")
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn missing_columns(source: SourceKind, tried: &[&str]) -> Normalized {
    Normalized {
        items: Vec::new(),
        warnings: vec![Warning::MalformedRecord {
            source_kind: source,
            row: 0,
            value: format!("required column not found (tried {})", tried.join("/")),
        }],
    }
}

fn normalize_flat(
    source: SourceKind,
    table: &RawTable,
    category_alts: &[&str],
    amount_alts: &[&str],
    description_alts: &[&str],
) -> Normalized {
    let Some(category_col) = find_column(&table.headers, category_alts) else {
        return missing_columns(source, category_alts);
    };
    let Some(amount_col) = find_column(&table.headers, amount_alts) else {
        return missing_columns(source, amount_alts);
    };
    let description_col = find_column(&table.headers, description_alts);

    let mut out = Normalized::default();
    for (i, raw_row) in table.rows.iter().enumerate() {
        let row = i + 1;
        if is_blank_row(raw_row) {
            continue;
        }
        let category_raw = cell(raw_row, category_col).trim();
        if category_raw.is_empty() {
            out.warnings.push(Warning::MalformedRecord {
                source_kind: source,
                row,
                value: "(blank category)".to_string(),
            });
            continue;
        }
        let amount_raw = cell(raw_row, amount_col);
        let Some(amount) = parse_amount(amount_raw) else {
            out.warnings.push(Warning::MalformedRecord {
                source_kind: source,
                row,
                value: amount_raw.trim().to_string(),
            });
            continue;
        };
        let description = description_col
            .map(|c| cell(raw_row, c).trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        out.items.push(LineItem {
            source,
            row,
            category: slugify(category_raw),
            description,
            amount,
        });
    }
    log::debug!(
        "{}: {} items, {} warnings",
        source,
        out.items.len(),
        out.warnings.len()
    );
    out
}

/// TIS rows classify on their Type column (income / deduction / tax paid)
/// with the Category column refining the head; the emitted category slug
/// composes the two so the single head vocabulary covers them.
fn normalize_tis(table: &RawTable) -> Normalized {
    let source = SourceKind::Tis;
    let Some(type_col) = find_column(&table.headers, TIS_TYPE) else {
        return missing_columns(source, TIS_TYPE);
    };
    let Some(amount_col) = find_column(&table.headers, TIS_AMOUNT) else {
        return missing_columns(source, TIS_AMOUNT);
    };
    let category_col = find_column(&table.headers, TIS_CATEGORY);

    let mut out = Normalized::default();
    for (i, raw_row) in table.rows.iter().enumerate() {
        let row = i + 1;
        if is_blank_row(raw_row) {
            continue;
        }
        let type_raw = cell(raw_row, type_col).trim();
        if type_raw.is_empty() {
            out.warnings.push(Warning::MalformedRecord {
                source_kind: source,
                row,
                value: "(blank entry type)".to_string(),
            });
            continue;
        }
        let amount_raw = cell(raw_row, amount_col);
        let Some(amount) = parse_amount(amount_raw) else {
            out.warnings.push(Warning::MalformedRecord {
                source_kind: source,
                row,
                value: amount_raw.trim().to_string(),
            });
            continue;
        };
        let category_raw = category_col.map(|c| cell(raw_row, c).trim()).unwrap_or("");
        let category_slug = slugify(category_raw);
        let category = match slugify(type_raw).as_str() {
            "income" | "reported_income" => {
                if category_slug.is_empty() {
                    "other_income".to_string()
                } else {
                    category_slug
                }
            }
            "deduction" | "reported_deduction" => {
                if category_slug.is_empty() {
                    "deduction:other".to_string()
                } else {
                    format!("deduction:{category_slug}")
                }
            }
            "taxpaid" | "tax_paid" | "advance_tax" | "self_assessment_tax" => {
                "taxes_paid".to_string()
            }
            other => other.to_string(),
        };
        let description = if category_raw.is_empty() {
            None
        } else {
            Some(category_raw.to_string())
        };
        out.items.push(LineItem {
            source,
            row,
            category,
            description,
            amount,
        });
    }
    log::debug!(
        "{}: {} items, {} warnings",
        source,
        out.items.len(),
        out.warnings.len()
    );
    out
}
