//! Merger: ordered concatenation of canonical datasets.

use log::info;

use crate::{
    error::{PipelineError, PipelineResult},
    records::{CANONICAL_HEADERS, CanonicalDataset, CanonicalRecord, canonical_headers},
};

/// Concatenates `datasets` in the order given, without deduplication or re-sorting.
pub fn merge(datasets: &[CanonicalDataset]) -> PipelineResult<Vec<CanonicalRecord>> {
    for dataset in datasets {
        ensure_canonical_columns(&dataset.name, &dataset.columns)?;
    }
    let total = datasets.iter().map(CanonicalDataset::len).sum();
    let mut merged = Vec::with_capacity(total);
    for dataset in datasets {
        merged.extend(dataset.records.iter().cloned());
    }
    info!(
        "Merged {} dataset(s) into {} record(s)",
        datasets.len(),
        merged.len()
    );
    Ok(merged)
}

/// Fails with `IncompatibleSchema` unless `columns` is exactly the canonical header.
pub fn ensure_canonical_columns(dataset: &str, columns: &[String]) -> PipelineResult<()> {
    let matches = columns.len() == CANONICAL_HEADERS.len()
        && columns
            .iter()
            .zip(CANONICAL_HEADERS.iter())
            .all(|(found, expected)| found == expected);
    if matches {
        Ok(())
    } else {
        Err(PipelineError::IncompatibleSchema {
            dataset: dataset.to_string(),
            expected: canonical_headers(),
            found: columns.to_vec(),
        })
    }
}
