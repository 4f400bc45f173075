//! End-to-end run: clean every family, build the merged workbook, then
//! reconcile each family against the pivot report.
//!
//! Steps run sequentially. A normalization failure stops the run before any
//! merge or reconciliation happens; reconciliation mismatches do not.

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;

use crate::{
    aggregate,
    config::{FamilyConfig, PipelineConfig},
    io_utils, merge, normalize, reconcile,
    records::{CanonicalDataset, ReconciliationResult},
    sources, summary,
    workbook::WorkbookReport,
};

/// Outcome of a full run, per family.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub datasets: Vec<CanonicalDataset>,
    pub merged_rows: usize,
    pub reconciliations: Vec<(String, Vec<ReconciliationResult>)>,
}

impl RunSummary {
    pub fn mismatches(&self) -> usize {
        self.reconciliations
            .iter()
            .map(|(_, results)| reconcile::mismatches(results))
            .sum()
    }
}

pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;
    let encoding = io_utils::resolve_encoding(config.input_encoding.as_deref())?;

    info!("Start - clean {} family dataset(s)", config.families.len());
    let datasets = config
        .families
        .iter()
        .map(|family| clean_family(config, family, encoding))
        .collect::<Result<Vec<_>>>()?;

    info!("Start - generate workbook");
    let mut report = WorkbookReport::new();
    for (family, dataset) in config.families.iter().zip(&datasets) {
        report.add_canonical_sheet(&family.sheet, &dataset.records)?;
    }
    let merged = merge::merge(&datasets)?;
    report.add_canonical_sheet(&config.merged_sheet, &merged)?;

    info!("Start - check results against pivot");
    let mut reconciliations = Vec::with_capacity(datasets.len());
    for (family, dataset) in config.families.iter().zip(&datasets) {
        let results = check_family(config, family, dataset)?;
        report.add_reconciliation_sheet(&family.result_sheet, &results)?;
        reconciliations.push((family.name.clone(), results));
    }

    report.save(&config.data_path(&config.output_workbook))?;
    Ok(RunSummary {
        merged_rows: merged.len(),
        datasets,
        reconciliations,
    })
}

/// Normalizes the raw dataset of `family` and persists its canonical file.
pub fn clean_family(
    config: &PipelineConfig,
    family: &FamilyConfig,
    encoding: &'static Encoding,
) -> Result<CanonicalDataset> {
    let raw_path = config.data_path(&family.raw_file);
    info!("Data clean - {}", family.name.to_uppercase());
    let raw = sources::read_raw_rows(&raw_path, config.delimiter_byte(), encoding)?;
    let records = normalize::normalize(&raw, family.min_year)
        .with_context(|| format!("Normalizing {raw_path:?}"))?;
    sources::write_canonical(
        &config.data_path(&family.canonical_file),
        &records,
        config.delimiter_byte(),
    )?;
    Ok(CanonicalDataset::new(family.name.clone(), records))
}

/// Reconciles the detail totals of `dataset` with the pivot summary of its layout.
pub fn check_family(
    config: &PipelineConfig,
    family: &FamilyConfig,
    dataset: &CanonicalDataset,
) -> Result<Vec<ReconciliationResult>> {
    let pivot_path = config.data_path(&config.pivot_workbook);
    let summary_rows = summary::read_pivot_summary(&pivot_path, &config.pivot_sheet, family.layout)?;
    let from_pivot = aggregate::totals_from_pivot_summary(&summary_rows)
        .with_context(|| format!("Totaling {} pivot summary", family.layout))?;
    let from_detail = aggregate::totals_from_detail(&dataset.records);
    Ok(reconcile::reconcile(&from_pivot, &from_detail))
}
