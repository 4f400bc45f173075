//! Domain error taxonomy for the normalization and reconciliation core.
//!
//! Every variant carries enough positional context (source line, year, pivot
//! filter pair) to locate the offending input. Reconciliation mismatches are
//! not errors and have no variant here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("line {line}: unknown month label '{label}' for year {year}")]
    UnknownMonthLabel {
        line: usize,
        year: i32,
        label: String,
    },

    #[error(
        "line {line}: malformed volume '{text}' for {unit}/{product} in {month} {year}"
    )]
    MalformedVolume {
        line: usize,
        year: i32,
        month: String,
        unit: String,
        product: String,
        text: String,
    },

    #[error("line {line}: malformed year '{text}'")]
    MalformedYear { line: usize, text: String },

    #[error(
        "{layout} pivot block for {unit}/{product} is misaligned: {cells} cell(s) against {width} data column(s) ({reason})"
    )]
    MisalignedPivotBlock {
        layout: String,
        unit: String,
        product: String,
        cells: usize,
        width: usize,
        reason: String,
    },

    #[error("{layout} pivot summary column {column} has header '{found}', expected a year")]
    UnexpectedPivotHeader {
        layout: String,
        column: usize,
        found: String,
    },

    #[error("{layout} pivot summary is incomplete: {reason}")]
    IncompletePivotSummary { layout: String, reason: String },

    #[error("dataset '{dataset}' has columns {found:?}, expected {expected:?}")]
    IncompatibleSchema {
        dataset: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
