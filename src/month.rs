//! Month vocabulary shared by the delimited datasets and the pivot report.
//!
//! The regulator publishes the delimited datasets with three-letter Portuguese
//! abbreviations (`JAN`, `FEV`, ...) while the pivot report spells the month
//! out (`Janeiro`, `Fevereiro`, ...). Both map onto the same 12 entries.

use chrono::NaiveDate;

/// Pseudo-month label of the per-year total row in the pivot report.
pub const TOTAL_MARKER: &str = "Total do Ano";

const MONTHS: [(&str, &str); 12] = [
    ("JAN", "JANEIRO"),
    ("FEV", "FEVEREIRO"),
    ("MAR", "MARÇO"),
    ("ABR", "ABRIL"),
    ("MAI", "MAIO"),
    ("JUN", "JUNHO"),
    ("JUL", "JULHO"),
    ("AGO", "AGOSTO"),
    ("SET", "SETEMBRO"),
    ("OUT", "OUTUBRO"),
    ("NOV", "NOVEMBRO"),
    ("DEZ", "DEZEMBRO"),
];

/// Returns the calendar month (1-12) for a label from either vocabulary.
pub fn month_number(label: &str) -> Option<u32> {
    let upper = label.trim().to_uppercase();
    MONTHS
        .iter()
        .position(|(short, long)| *short == upper || *long == upper)
        .map(|idx| idx as u32 + 1)
}

/// First day of the month named by `label` in `year`.
pub fn period_for(year: i32, label: &str) -> Option<NaiveDate> {
    month_number(label).and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
}

pub fn is_total_marker(label: &str) -> bool {
    label.trim() == TOTAL_MARKER
}

/// Abbreviated labels in calendar order.
pub fn abbreviations() -> impl Iterator<Item = &'static str> {
    MONTHS.iter().map(|(short, _)| *short)
}

/// Full month names in calendar order, capitalised as the pivot report prints them.
pub fn full_names() -> [&'static str; 12] {
    [
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
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn abbreviations_and_full_names_agree() {
        for (idx, (short, long)) in abbreviations().zip(full_names()).enumerate() {
            assert_eq!(month_number(short), Some(idx as u32 + 1));
            assert_eq!(month_number(long), Some(idx as u32 + 1));
        }
    }

    #[test]
    fn month_lookup_ignores_case_and_padding() {
        assert_eq!(month_number(" mar "), Some(3));
        assert_eq!(month_number("MARÇO"), Some(3));
        assert_eq!(month_number("dezembro"), Some(12));
        assert_eq!(month_number("Total do Ano"), None);
        assert_eq!(month_number(""), None);
    }

    #[test]
    fn period_is_first_of_month() {
        let period = period_for(2021, "SET").unwrap();
        assert_eq!((period.year(), period.month(), period.day()), (2021, 9, 1));
    }

    #[test]
    fn total_marker_matches_exactly_after_trim() {
        assert!(is_total_marker("Total do Ano"));
        assert!(is_total_marker("  Total do Ano "));
        assert!(!is_total_marker("total do ano"));
        assert!(!is_total_marker("TOTAL DO ANO"));
        assert!(!is_total_marker("Janeiro"));
    }
}
