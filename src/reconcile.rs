//! Reconciler: joins two yearly total series and records per-year verdicts.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::records::{ReconciliationResult, YearTotal};

/// Inner-joins `pivot` and `detail` on year, ascending.
///
/// Years present on one side only are left out. Totals are compared as
/// already-rounded strings, so there is no tolerance.
pub fn reconcile(pivot: &[YearTotal], detail: &[YearTotal]) -> Vec<ReconciliationResult> {
    let detail_by_year: BTreeMap<i32, &str> = detail
        .iter()
        .map(|total| (total.year, total.total_volume.as_str()))
        .collect();
    let pivot_by_year: BTreeMap<i32, &str> = pivot
        .iter()
        .map(|total| (total.year, total.total_volume.as_str()))
        .collect();

    let results: Vec<ReconciliationResult> = pivot_by_year
        .iter()
        .filter_map(|(year, from_pivot)| {
            detail_by_year
                .get(year)
                .map(|from_detail| ReconciliationResult {
                    year: *year,
                    total_from_pivot: from_pivot.to_string(),
                    total_from_detail: from_detail.to_string(),
                    is_equal: from_pivot == from_detail,
                })
        })
        .collect();

    for result in results.iter().filter(|result| !result.is_equal) {
        warn!(
            "Totals differ for {}: pivot {} vs detail {}",
            result.year, result.total_from_pivot, result.total_from_detail
        );
    }
    info!(
        "Reconciled {} year(s), {} mismatch(es)",
        results.len(),
        mismatches(&results)
    );
    results
}

pub fn mismatches(results: &[ReconciliationResult]) -> usize {
    results.iter().filter(|result| !result.is_equal).count()
}
