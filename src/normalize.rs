//! Record Normalizer: raw rows into canonical long-format records.

use chrono::{Local, NaiveDateTime, Timelike};
use log::debug;

use crate::{
    error::{PipelineError, PipelineResult},
    month,
    records::{CanonicalRecord, RawRow, VOLUME_UNIT},
};

/// Normalizes `rows`, stamping every record with the current local time.
pub fn normalize(rows: &[RawRow], min_year: i32) -> PipelineResult<Vec<CanonicalRecord>> {
    normalize_at(rows, min_year, now_to_the_second())
}

/// Normalizes `rows` with a caller-supplied `recorded_at`.
///
/// Rows before `min_year` are dropped. The first row whose month label or
/// volume cannot be interpreted aborts the whole batch.
pub fn normalize_at(
    rows: &[RawRow],
    min_year: i32,
    recorded_at: NaiveDateTime,
) -> PipelineResult<Vec<CanonicalRecord>> {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        if row.year < min_year {
            skipped += 1;
            continue;
        }
        records.push(normalize_row(row, recorded_at)?);
    }
    if skipped > 0 {
        debug!("Dropped {skipped} row(s) before {min_year}");
    }
    // sort_by is stable, ties keep input order
    records.sort_by(|a, b| {
        a.period
            .cmp(&b.period)
            .then_with(|| a.administrative_unit.cmp(&b.administrative_unit))
            .then_with(|| a.product.cmp(&b.product))
    });
    Ok(records)
}

fn normalize_row(row: &RawRow, recorded_at: NaiveDateTime) -> PipelineResult<CanonicalRecord> {
    let month_label = row.month_label.trim();
    let period =
        month::period_for(row.year, month_label).ok_or_else(|| PipelineError::UnknownMonthLabel {
            line: row.source_line,
            year: row.year,
            label: month_label.to_string(),
        })?;
    let volume = parse_volume(&row.volume_text).ok_or_else(|| PipelineError::MalformedVolume {
        line: row.source_line,
        year: row.year,
        month: month_label.to_string(),
        unit: row.administrative_unit.trim().to_string(),
        product: row.product.trim().to_string(),
        text: row.volume_text.clone(),
    })?;
    Ok(CanonicalRecord {
        period,
        administrative_unit: row.administrative_unit.trim().to_string(),
        product: row.product.trim().to_string(),
        unit: VOLUME_UNIT.to_string(),
        volume,
        recorded_at,
    })
}

/// Parses decimal-comma (or decimal-point) volume text into a non-negative number.
pub fn parse_volume(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.replace(',', ".").parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn now_to_the_second() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
