//! Yearly totals, derived either from canonical detail records or from the
//! pre-totaled rows of the pivot report summary.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};

use crate::{
    error::{PipelineError, PipelineResult},
    month,
    normalize::parse_volume,
    records::{CanonicalRecord, RawRow, YearTotal},
};

/// Sums detail volumes per calendar year, ascending by year.
///
/// Sums are kept in `Decimal` so a total that lands on a half cent rounds the
/// same way the published report does.
pub fn totals_from_detail(records: &[CanonicalRecord]) -> Vec<YearTotal> {
    let mut sums: BTreeMap<i32, Decimal> = BTreeMap::new();
    for record in records {
        *sums.entry(record.period.year()).or_default() += volume_decimal(record.volume);
    }
    into_year_totals(sums)
}

/// Reads the `Total do Ano` rows of an unpivoted pivot summary as yearly totals.
///
/// Month rows are ignored. When several total rows share a year (one per
/// administrative unit) they are added together.
pub fn totals_from_pivot_summary(rows: &[RawRow]) -> PipelineResult<Vec<YearTotal>> {
    let mut sums: BTreeMap<i32, Decimal> = BTreeMap::new();
    for row in rows.iter().filter(|row| month::is_total_marker(&row.month_label)) {
        let volume = parse_volume(&row.volume_text).ok_or_else(|| PipelineError::MalformedVolume {
            line: row.source_line,
            year: row.year,
            month: row.month_label.trim().to_string(),
            unit: row.administrative_unit.clone(),
            product: row.product.clone(),
            text: row.volume_text.clone(),
        })?;
        *sums.entry(row.year).or_default() += volume_decimal(volume);
    }
    Ok(into_year_totals(sums))
}

fn into_year_totals(sums: BTreeMap<i32, Decimal>) -> Vec<YearTotal> {
    sums.into_iter()
        .map(|(year, total)| YearTotal {
            year,
            total_volume: format_decimal(total),
        })
        .collect()
}

/// Shortest decimal text of `volume` (`1.168`, not its binary expansion).
/// Finite volumes always convert; anything else counts as zero.
fn volume_decimal(volume: f64) -> Decimal {
    volume
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(volume))
        .unwrap_or_default()
}

/// Renders a volume with exactly two fractional digits, rounding half away from zero.
pub fn format_volume(value: f64) -> String {
    match Decimal::from_f64(value) {
        Some(decimal) => format_decimal(decimal),
        None => format!("{value:.2}"),
    }
}

fn format_decimal(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}
