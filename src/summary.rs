//! Reads the month-by-year summary region of the pivot report workbook.
//!
//! The region of each layout starts with a `Mês | <year> | <year> ...` header
//! followed by the twelve months and the `Total do Ano` row. It is read as
//! [`PivotCell`]s and unpivoted into [`RawRow`]s with the month label kept,
//! so the aggregator can pick the total row out.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Range, Reader, open_workbook_auto};
use log::info;

use crate::{
    error::{PipelineError, PipelineResult},
    month,
    records::{PivotCell, RawRow},
    reshape::Layout,
};

pub fn read_pivot_summary(path: &Path, sheet: &str, layout: Layout) -> Result<Vec<RawRow>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening pivot workbook {path:?}"))?;
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Reading sheet '{sheet}' from {path:?}"))?;
    let grid = summary_grid(&range, layout);
    if grid.is_empty() {
        return Err(anyhow!(
            "Sheet '{sheet}' in {path:?} has no {layout} summary region"
        ));
    }
    let expected_rows = layout.spec().summary.rows as usize;
    let body_rows = grid.len() - 1;
    if body_rows != expected_rows {
        return Err(PipelineError::IncompletePivotSummary {
            layout: layout.to_string(),
            reason: format!("{body_rows} row(s) under the header, expected {expected_rows}"),
        })
        .with_context(|| format!("Reading {layout} summary from sheet '{sheet}' in {path:?}"));
    }
    let rows = unpivot_summary(&grid, layout)
        .with_context(|| format!("Reading {layout} summary from sheet '{sheet}' in {path:?}"))?;
    info!(
        "Read {} {} summary cell(s) from sheet '{}'",
        rows.len(),
        layout,
        sheet
    );
    Ok(rows)
}

/// Copies the layout's summary region (header plus data rows) out of `range`.
fn summary_grid(range: &Range<Data>, layout: Layout) -> Vec<Vec<PivotCell>> {
    let region = layout.spec().summary;
    let last_row = region.header_row + region.rows;
    (region.header_row..=last_row)
        .map(|row| {
            (region.first_column..=region.last_column)
                .map(|column| {
                    range
                        .get_value((row, column))
                        .map(PivotCell::from)
                        .unwrap_or(PivotCell::Absent)
                })
                .collect::<Vec<_>>()
        })
        .take_while(|cells| !cells.iter().all(PivotCell::is_absent))
        .collect()
}

/// Turns a summary grid (first row = header) into one raw row per month/year cell.
///
/// The last body row must be the `Total do Ano` row.
pub fn unpivot_summary(grid: &[Vec<PivotCell>], layout: Layout) -> PipelineResult<Vec<RawRow>> {
    let Some((header, body)) = grid.split_first() else {
        return Ok(Vec::new());
    };
    let years = header
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cell)| !cell.is_absent())
        .map(|(column, cell)| {
            parse_year(cell)
                .map(|year| (column, year))
                .ok_or_else(|| PipelineError::UnexpectedPivotHeader {
                    layout: layout.to_string(),
                    column,
                    found: cell.label(),
                })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    let closes_with_total = body
        .last()
        .and_then(|cells| cells.first())
        .is_some_and(|cell| month::is_total_marker(&cell.label()));
    if !closes_with_total {
        return Err(PipelineError::IncompletePivotSummary {
            layout: layout.to_string(),
            reason: format!(
                "{} row(s) under the header without a closing '{}' row",
                body.len(),
                month::TOTAL_MARKER
            ),
        });
    }

    let mut rows = Vec::with_capacity(body.len() * years.len());
    for (row_idx, cells) in body.iter().enumerate() {
        let month_label = cells.first().map(PivotCell::label).unwrap_or_default();
        for (column, year) in &years {
            let cell = cells.get(*column).unwrap_or(&PivotCell::Absent);
            rows.push(RawRow {
                year: *year,
                month_label: month_label.clone(),
                volume_text: cell.volume_text(),
                source_line: row_idx + 2,
                ..RawRow::default()
            });
        }
    }
    Ok(rows)
}

fn parse_year(cell: &PivotCell) -> Option<i32> {
    match cell {
        PivotCell::Number(n) if n.fract() == 0.0 && (1900.0..=2200.0).contains(n) => {
            Some(*n as i32)
        }
        PivotCell::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}
