//! Console rendering of reconciliation verdicts.

use std::fmt::Write as _;

use crate::records::{RECONCILIATION_HEADERS, ReconciliationResult};

/// Renders `results` as a left-aligned text table; unequal years are flagged.
pub fn render_reconciliation(results: &[ReconciliationResult]) -> String {
    let rows: Vec<[String; 4]> = results
        .iter()
        .map(|result| {
            let [year, pivot, detail, _] = result.to_fields();
            let verdict = if result.is_equal { "ok" } else { "MISMATCH" };
            [year, pivot, detail, verdict.to_string()]
        })
        .collect();

    let mut widths = RECONCILIATION_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header = RECONCILIATION_HEADERS.map(str::to_string);
    let _ = writeln!(output, "{}", format_row(&header, &widths));
    let _ = writeln!(output, "{}", format_row(&widths.map(|w| "-".repeat(w)), &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}
