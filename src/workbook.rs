//! Multi-sheet workbook output.
//!
//! The report is assembled in memory by a single owner and written to disk
//! once, after every sheet has been computed.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::records::{
    CANONICAL_HEADERS, CanonicalRecord, RECONCILIATION_HEADERS, ReconciliationResult,
};

pub struct WorkbookReport {
    workbook: Workbook,
    sheet_names: Vec<String>,
}

impl Default for WorkbookReport {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookReport {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: Vec::new(),
        }
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn add_canonical_sheet(&mut self, name: &str, records: &[CanonicalRecord]) -> Result<()> {
        let sheet = self.new_sheet(name)?;
        write_header(sheet, &CANONICAL_HEADERS)?;
        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;
            let [period, uf, product, unit, _, created_at] = record.to_fields();
            sheet.write_string(row, 0, period)?;
            sheet.write_string(row, 1, uf)?;
            sheet.write_string(row, 2, product)?;
            sheet.write_string(row, 3, unit)?;
            sheet.write_number(row, 4, record.volume)?;
            sheet.write_string(row, 5, created_at)?;
        }
        info!("Create sheet - {name} ({} row(s))", records.len());
        Ok(())
    }

    pub fn add_reconciliation_sheet(
        &mut self,
        name: &str,
        results: &[ReconciliationResult],
    ) -> Result<()> {
        let sheet = self.new_sheet(name)?;
        write_header(sheet, &RECONCILIATION_HEADERS)?;
        for (idx, result) in results.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_number(row, 0, result.year)?;
            sheet.write_string(row, 1, &result.total_from_pivot)?;
            sheet.write_string(row, 2, &result.total_from_detail)?;
            sheet.write_boolean(row, 3, result.is_equal)?;
        }
        info!("Check result - {name} ({} year(s))", results.len());
        Ok(())
    }

    pub fn save(mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating output directory {parent:?}"))?;
        }
        self.workbook
            .save(path)
            .with_context(|| format!("Writing workbook {path:?}"))?;
        info!(
            "Wrote workbook {:?} with sheet(s) {}",
            path,
            self.sheet_names.join(", ")
        );
        Ok(())
    }

    fn new_sheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        let sheet = self.workbook.add_worksheet();
        sheet
            .set_name(name)
            .with_context(|| format!("Naming worksheet '{name}'"))?;
        self.sheet_names.push(name.to_string());
        Ok(sheet)
    }
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    Ok(())
}
