//! Reshaper: pivot pages into raw long-format rows.
//!
//! A pivot page is what the report shows for one (administrative unit,
//! product) filter pair: two header rows, one row per month, and a trailing
//! per-page total row, each row holding the month label followed by one cell
//! per year. Both report layouts share this algorithm and differ only in the
//! data carried by their [`LayoutSpec`].

use std::{collections::HashMap, fmt, sync::OnceLock};

use clap::ValueEnum;
use itertools::Itertools;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PipelineError, PipelineResult},
    records::{PivotCell, RawRow},
};

/// Leading identifier columns of the template that come from the page filters.
pub const IDENTIFIER_COLUMNS: usize = 2;
/// Rows in one pivot page: 2 headers, 12 months and the page total.
pub const PAGE_ROWS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Layout {
    Derivative,
    Diesel,
}

/// Region of the report sheet holding a layout's month-by-year summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRegion {
    /// 0-based sheet row of the `Mês | <years>` header.
    pub header_row: u32,
    /// 0-based sheet column of the month axis.
    pub first_column: u32,
    /// 0-based sheet column of the last year, inclusive.
    pub last_column: u32,
    /// Data rows below the header: 12 months and the year total.
    pub rows: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSpec {
    pub name: &'static str,
    pub anchor: (&'static str, &'static str),
    pub filters: [&'static str; 2],
    pub first_year: i32,
    pub last_year: i32,
    /// Structural rows of a page: the two layout headers and the page total.
    pub header_row_offsets: &'static [usize],
    pub summary: SummaryRegion,
}

const FILTERS: [&str; 2] = ["UN. DA FEDERAÇÃO", "PRODUTO"];
const HEADER_ROW_OFFSETS: [usize; 3] = [0, 1, 14];

static DERIVATIVE: LayoutSpec = LayoutSpec {
    name: "derivative",
    anchor: ("B49", "B65"),
    filters: FILTERS,
    first_year: 2000,
    last_year: 2020,
    header_row_offsets: &HEADER_ROW_OFFSETS,
    summary: SummaryRegion {
        header_row: 52,
        first_column: 1,
        last_column: 24,
        rows: 13,
    },
};

static DIESEL: LayoutSpec = LayoutSpec {
    name: "diesel",
    anchor: ("B129", "B145"),
    filters: FILTERS,
    first_year: 2013,
    last_year: 2020,
    header_row_offsets: &HEADER_ROW_OFFSETS,
    summary: SummaryRegion {
        header_row: 188,
        first_column: 1,
        last_column: 11,
        rows: 13,
    },
};

impl Layout {
    pub fn spec(self) -> &'static LayoutSpec {
        match self {
            Layout::Derivative => &DERIVATIVE,
            Layout::Diesel => &DIESEL,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

impl LayoutSpec {
    pub fn years(&self) -> Vec<i32> {
        (self.first_year..=self.last_year).collect()
    }

    /// Column template of the reshaped wide table: identifiers, month axis, years.
    pub fn column_template(&self) -> Vec<String> {
        let mut template = vec!["uf".to_string(), "produto".to_string(), "mes".to_string()];
        template.extend(self.years().iter().map(|year| year.to_string()));
        template
    }

    /// Cells per page row once the identifier columns are set aside.
    pub fn data_width(&self) -> usize {
        self.column_template().len() - IDENTIFIER_COLUMNS
    }
}

/// Pages of one pivot layout as handed over by the acquisition step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotSource {
    pub units: Vec<String>,
    pub products: Vec<String>,
    pages: HashMap<(String, String), Vec<PivotCell>>,
}

impl PivotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends cells to the page of `(unit, product)`, registering new filter members.
    pub fn push_cells(
        &mut self,
        unit: &str,
        product: &str,
        cells: impl IntoIterator<Item = PivotCell>,
    ) {
        let unit = unit.trim().to_string();
        let product = product.trim().to_string();
        if !self.units.contains(&unit) {
            self.units.push(unit.clone());
        }
        if !self.products.contains(&product) {
            self.products.push(product.clone());
        }
        self.pages.entry((unit, product)).or_default().extend(cells);
    }

    pub fn page(&self, unit: &str, product: &str) -> Option<&[PivotCell]> {
        self.pages
            .get(&(unit.to_string(), product.to_string()))
            .map(Vec::as_slice)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

struct WideRow {
    unit: String,
    product: String,
    month_label: String,
    values: Vec<String>,
    position: usize,
}

/// Reshapes every page of `source` into long-format raw rows for `layout`.
pub fn reshape(source: &PivotSource, layout: Layout) -> PipelineResult<Vec<RawRow>> {
    let spec = layout.spec();
    let width = spec.data_width();
    let mut wide = Vec::new();

    for (unit, product) in source.units.iter().cartesian_product(source.products.iter()) {
        let misaligned = |cells: usize, reason: &str| PipelineError::MisalignedPivotBlock {
            layout: spec.name.to_string(),
            unit: unit.clone(),
            product: product.clone(),
            cells,
            width,
            reason: reason.to_string(),
        };
        let cells = source
            .page(unit, product)
            .ok_or_else(|| misaligned(0, "no page for this filter pair"))?;
        if cells.is_empty() || cells.len() % width != 0 {
            return Err(misaligned(cells.len(), "cell count is not a multiple of the row width"));
        }
        let row_count = cells.len() / width;
        if row_count != PAGE_ROWS {
            return Err(misaligned(
                cells.len(),
                &format!("{row_count} row(s), expected {PAGE_ROWS}"),
            ));
        }
        debug!(
            "Reshaping {} page {unit}/{product} ({row_count} row(s))",
            spec.name
        );
        let product_label = clean_product_label(product);
        for (offset, row) in cells.chunks(width).enumerate() {
            if spec.header_row_offsets.contains(&offset) {
                continue;
            }
            wide.push(WideRow {
                unit: unit.clone(),
                product: product_label.clone(),
                month_label: row[0].label(),
                values: row[1..].iter().map(PivotCell::volume_text).collect(),
                position: wide.len() + 1,
            });
        }
    }

    Ok(unpivot(&wide, &spec.years()))
}

fn unpivot(wide: &[WideRow], years: &[i32]) -> Vec<RawRow> {
    let mut rows = Vec::with_capacity(wide.len() * years.len());
    for (year_idx, year) in years.iter().enumerate() {
        for row in wide {
            rows.push(RawRow {
                year: *year,
                month_label: row.month_label.clone(),
                region: String::new(),
                administrative_unit: row.unit.clone(),
                product: row.product.clone(),
                volume_text: row.values[year_idx].clone(),
                source_line: year_idx * wide.len() + row.position,
            });
        }
    }
    rows
}

/// Drops the trailing unit suffix from a report product caption, e.g.
/// `"GASOLINA C (m3)"` becomes `"GASOLINA C"`.
pub fn clean_product_label(caption: &str) -> String {
    static UNIT_SUFFIX: OnceLock<Regex> = OnceLock::new();
    static OPEN_PAREN: OnceLock<Regex> = OnceLock::new();
    static CLOSE_PAREN: OnceLock<Regex> = OnceLock::new();
    let unit_suffix = UNIT_SUFFIX.get_or_init(|| Regex::new(r"\(\w+\)$").expect("valid regex"));
    let open_paren = OPEN_PAREN.get_or_init(|| Regex::new(r"\(\s+").expect("valid regex"));
    let close_paren = CLOSE_PAREN.get_or_init(|| Regex::new(r"\s+\)").expect("valid regex"));

    let stripped = unit_suffix.replace(caption.trim(), "");
    let opened = open_paren.replace_all(&stripped, "(");
    close_paren.replace_all(&opened, ")").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_match_report_columns() {
        let derivative = Layout::Derivative.spec();
        assert_eq!(derivative.column_template().len(), 24);
        assert_eq!(derivative.data_width(), 22);
        let diesel = Layout::Diesel.spec();
        assert_eq!(
            diesel.column_template(),
            vec!["uf", "produto", "mes", "2013", "2014", "2015", "2016", "2017", "2018", "2019", "2020"]
        );
        assert_eq!(diesel.data_width(), 9);
    }

    #[test]
    fn product_captions_lose_unit_suffix() {
        assert_eq!(clean_product_label("GASOLINA C (m3)"), "GASOLINA C");
        assert_eq!(
            clean_product_label("ÓLEO DIESEL ( OUTROS ) (m3)"),
            "ÓLEO DIESEL (OUTROS)"
        );
        assert_eq!(clean_product_label("GLP"), "GLP");
    }

    #[test]
    fn source_registers_members_in_first_seen_order() {
        let mut source = PivotSource::new();
        source.push_cells("SP", "GLP", vec![PivotCell::Absent]);
        source.push_cells("RJ", "GLP", vec![PivotCell::Absent]);
        source.push_cells("SP", "ETANOL", vec![PivotCell::Absent]);
        source.push_cells("SP", "GLP", vec![PivotCell::Number(1.0)]);
        assert_eq!(source.units, vec!["SP", "RJ"]);
        assert_eq!(source.products, vec!["GLP", "ETANOL"]);
        assert_eq!(source.page("SP", "GLP").map(|c| c.len()), Some(2));
        assert_eq!(source.page_count(), 3);
    }
}
