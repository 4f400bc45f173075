#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use fuel_sales_etl::records::{CanonicalRecord, PivotCell, RawRow};
use fuel_sales_etl::reshape::{Layout, PAGE_ROWS, PivotSource};
use rust_xlsxwriter::{Workbook, Worksheet};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 7, 1)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
}

pub fn raw_row(year: i32, month: &str, uf: &str, product: &str, volume: &str) -> RawRow {
    RawRow {
        year,
        month_label: month.to_string(),
        region: "SUDESTE".to_string(),
        administrative_unit: uf.to_string(),
        product: product.to_string(),
        volume_text: volume.to_string(),
        source_line: 0,
    }
}

pub fn record(year: i32, month: u32, uf: &str, product: &str, volume: f64) -> CanonicalRecord {
    CanonicalRecord {
        period: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        administrative_unit: uf.to_string(),
        product: product.to_string(),
        unit: "m3".to_string(),
        volume,
        recorded_at: stamp(),
    }
}

pub const MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Builds the cells of one pivot page: two header rows, twelve months where
/// month `m` holds `base + m` in every year column, and a page total row.
pub fn page_cells(layout: Layout, base: f64) -> Vec<PivotCell> {
    let spec = layout.spec();
    let years = spec.years();
    let mut cells = Vec::with_capacity(PAGE_ROWS * spec.data_width());
    cells.push(PivotCell::Text("Soma de VENDAS".into()));
    cells.extend(std::iter::repeat_n(PivotCell::Absent, years.len()));
    cells.push(PivotCell::Text("Mês".into()));
    cells.extend(years.iter().map(|year| PivotCell::Number(*year as f64)));
    for (idx, month) in MONTHS.iter().enumerate() {
        cells.push(PivotCell::Text(month.to_string()));
        cells.extend(std::iter::repeat_n(
            PivotCell::Number(base + idx as f64 + 1.0),
            years.len(),
        ));
    }
    let total: f64 = (1..=12).map(|m| base + m as f64).sum();
    cells.push(PivotCell::Text("Total do Ano".into()));
    cells.extend(std::iter::repeat_n(PivotCell::Number(total), years.len()));
    cells
}

pub fn pivot_source(layout: Layout, units: &[&str], products: &[&str]) -> PivotSource {
    let mut source = PivotSource::new();
    for unit in units {
        for product in products {
            source.push_cells(unit, product, page_cells(layout, 0.0));
        }
    }
    source
}

/// Writes a pivot report workbook whose summary regions hold the given
/// `Total do Ano` values per year; month rows carry zeros.
pub fn write_pivot_report(
    path: &Path,
    derivative_totals: &[(i32, f64)],
    diesel_totals: &[(i32, f64)],
) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Plan1").unwrap();
    write_summary_region(sheet, Layout::Derivative, derivative_totals, true);
    write_summary_region(sheet, Layout::Diesel, diesel_totals, true);
    workbook.save(path).unwrap();
}

/// Writes a pivot report whose `layout` summary region stops after December.
pub fn write_pivot_report_without_total(path: &Path, layout: Layout, years: &[(i32, f64)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Plan1").unwrap();
    write_summary_region(sheet, layout, years, false);
    workbook.save(path).unwrap();
}

fn write_summary_region(
    sheet: &mut Worksheet,
    layout: Layout,
    totals: &[(i32, f64)],
    with_total: bool,
) {
    let region = layout.spec().summary;
    let header_row = region.header_row;
    let first = region.first_column as u16;
    sheet.write_string(header_row, first, "Mês").unwrap();
    for (idx, (year, _)) in totals.iter().enumerate() {
        sheet
            .write_number(header_row, first + 1 + idx as u16, *year as f64)
            .unwrap();
    }
    for (month_idx, month) in MONTHS.iter().enumerate() {
        let row = header_row + 1 + month_idx as u32;
        sheet.write_string(row, first, *month).unwrap();
        for idx in 0..totals.len() {
            sheet.write_number(row, first + 1 + idx as u16, 0.0).unwrap();
        }
    }
    if !with_total {
        return;
    }
    let total_row = header_row + 13;
    sheet.write_string(total_row, first, "Total do Ano").unwrap();
    for (idx, (_, total)) in totals.iter().enumerate() {
        sheet
            .write_number(total_row, first + 1 + idx as u16, *total)
            .unwrap();
    }
}
