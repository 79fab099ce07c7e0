use crate::records::SourceKind;
use serde::Serialize;

/// Row-level problems collected during a run. The offending row is excluded
/// from totals but the run continues and reports all of these together.
//
// The statement field is named `source_kind`: thiserror reserves `source`
// for the error-cause chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "type")]
pub enum Warning {
    /// Row could not be normalized (bad amount, blank category, missing column).
    #[error("{source_kind} row {row}: malformed record: {value}")]
    MalformedRecord {
        #[serde(rename = "source")]
        source_kind: SourceKind,
        row: usize,
        value: String,
    },
    /// Category slug has no entry in the head vocabulary.
    #[error("{source_kind} row {row}: unknown category '{category}'")]
    UnknownCategory {
        #[serde(rename = "source")]
        source_kind: SourceKind,
        row: usize,
        category: String,
    },
    /// Brokerage tag matched none of the gains buckets. The amount is left
    /// out of the buckets; if the tag maps to an income head it still
    /// counts there as ordinary income.
    #[error("Brokerage row {row}: tag '{tag}' matched no gains bucket; amount counted under its mapped income head, if any")]
    UnclassifiedGain { row: usize, tag: String },
}

/// Fatal errors that abort the run before any output is produced.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A wrong tax computation is worse than no computation.
    #[error("invalid tax rule table: {reason}")]
    InvalidRuleTable { reason: String },
    #[error("no usable rows for mandatory source {source_kind}")]
    EmptySource { source_kind: SourceKind },
    #[error("missing required metadata key '{key}'")]
    MissingMetadata { key: String },
}
