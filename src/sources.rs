//! Readers and writers for the delimited files exchanged with collaborators:
//! raw regulator datasets, pivot page dumps, canonical files and
//! reconciliation reports.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    error::PipelineError,
    io_utils,
    merge::ensure_canonical_columns,
    normalize::parse_volume,
    records::{
        CANONICAL_HEADERS, CanonicalDataset, CanonicalRecord, DATE_FORMAT, PivotCell, RawRow,
        RECONCILIATION_HEADERS, ReconciliationResult, TIMESTAMP_FORMAT,
    },
    reshape::PivotSource,
};

/// Column count of the raw dataset: year, month, region, uf, product, volume.
const RAW_COLUMNS: usize = 6;

fn record_line(record: &csv::ByteRecord, fallback: usize) -> usize {
    record
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(fallback)
}

/// Reads a regulator dataset. Blank lines are skipped; every other line must
/// carry an integer year.
pub fn read_raw_rows(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<RawRow>> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true, true)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    debug!("Raw headers in {path:?}: {headers:?}");

    let mut rows = Vec::new();
    let mut blank = 0usize;
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
        let line = record_line(&record, row_idx + 2);
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding line {line} in {path:?}"))?;
        let fields: Vec<&str> = decoded.iter().map(|field| field.trim()).collect();
        if fields.iter().all(|field| field.is_empty()) {
            blank += 1;
            continue;
        }
        if fields.len() != RAW_COLUMNS {
            return Err(anyhow!(
                "Line {line} in {path:?} has {} field(s), expected {RAW_COLUMNS}",
                fields.len()
            ));
        }
        let year = fields[0]
            .parse::<i32>()
            .map_err(|_| PipelineError::MalformedYear {
                line,
                text: fields[0].to_string(),
            })
            .with_context(|| format!("Reading {path:?}"))?;
        rows.push(RawRow {
            year,
            month_label: fields[1].to_string(),
            region: fields[2].to_string(),
            administrative_unit: fields[3].to_string(),
            product: fields[4].to_string(),
            volume_text: fields[5].to_string(),
            source_line: line,
        });
    }
    if blank > 0 {
        debug!("Skipped {blank} blank line(s) in {path:?}");
    }
    info!("Read {} raw row(s) from {:?}", rows.len(), path);
    Ok(rows)
}

/// Reads a pivot page dump: `uf;product;cell;...` per line, no header.
pub fn read_pivot_pages(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<PivotSource> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, false, true)?;
    let mut source = PivotSource::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("Reading row {} in {:?}", row_idx + 1, path))?;
        let line = record_line(&record, row_idx + 1);
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding line {line} in {path:?}"))?;
        if decoded.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if decoded.len() < 3 {
            return Err(anyhow!(
                "Line {line} in {path:?} lacks the uf;product prefix and cells"
            ));
        }
        source.push_cells(
            &decoded[0],
            &decoded[1],
            decoded[2..].iter().map(|cell| PivotCell::from_text(cell)),
        );
    }
    info!(
        "Read {} pivot page(s) ({} unit(s) x {} product(s)) from {:?}",
        source.page_count(),
        source.units.len(),
        source.products.len(),
        path
    );
    Ok(source)
}

/// Writes canonical records, replacing any previous file at `path`.
pub fn write_canonical(path: &Path, records: &[CanonicalRecord], delimiter: u8) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(CANONICAL_HEADERS)
        .context("Writing canonical headers")?;
    for (idx, record) in records.iter().enumerate() {
        writer
            .write_record(record.to_fields())
            .with_context(|| format!("Writing row {} to {:?}", idx + 2, path))?;
    }
    writer.flush().context("Flushing canonical output")?;
    info!("Wrote {} canonical row(s) to {:?}", records.len(), path);
    Ok(())
}

/// Loads a canonical file; a foreign header is an `IncompatibleSchema` error.
pub fn read_canonical(path: &Path, name: &str, delimiter: u8) -> Result<CanonicalDataset> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true, false)?;
    let columns = io_utils::reader_headers(&mut reader, encoding_rs::UTF_8)?;
    ensure_canonical_columns(name, &columns)
        .with_context(|| format!("Validating headers for {path:?}"))?;

    let mut records = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let line = row_idx + 2;
        let record = record.with_context(|| format!("Reading row {line} in {path:?}"))?;
        let period = NaiveDate::parse_from_str(&record[0], DATE_FORMAT)
            .with_context(|| format!("Row {line} column 'year_month' in {path:?}"))?;
        let volume = parse_volume(&record[4]).ok_or_else(|| {
            anyhow!("Row {line} column 'volume' in {path:?} is not a volume: '{}'", &record[4])
        })?;
        let recorded_at = NaiveDateTime::parse_from_str(&record[5], TIMESTAMP_FORMAT)
            .with_context(|| format!("Row {line} column 'created_at' in {path:?}"))?;
        records.push(CanonicalRecord {
            period,
            administrative_unit: record[1].to_string(),
            product: record[2].to_string(),
            unit: record[3].to_string(),
            volume,
            recorded_at,
        });
    }
    Ok(CanonicalDataset {
        name: name.to_string(),
        columns,
        records,
    })
}

pub fn write_reconciliation(
    path: &Path,
    results: &[ReconciliationResult],
    delimiter: u8,
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(RECONCILIATION_HEADERS)
        .context("Writing reconciliation headers")?;
    for result in results {
        writer
            .write_record(result.to_fields())
            .with_context(|| format!("Writing year {} to {:?}", result.year, path))?;
    }
    writer.flush().context("Flushing reconciliation output")?;
    Ok(())
}
