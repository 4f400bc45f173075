//! Record types flowing between the pipeline stages.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const CANONICAL_HEADERS: [&str; 6] =
    ["year_month", "uf", "product", "unit", "volume", "created_at"];
pub const RECONCILIATION_HEADERS: [&str; 4] =
    ["year", "total_from_pivot", "total_from_detail", "is_equal"];

pub const VOLUME_UNIT: &str = "m3";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn canonical_headers() -> Vec<String> {
    CANONICAL_HEADERS.iter().map(|h| h.to_string()).collect()
}

/// Long-format observation: one row per (period, administrative unit, product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub period: NaiveDate,
    pub administrative_unit: String,
    pub product: String,
    pub unit: String,
    pub volume: f64,
    pub recorded_at: NaiveDateTime,
}

impl CanonicalRecord {
    /// Renders the record in canonical column order.
    pub fn to_fields(&self) -> [String; 6] {
        [
            self.period.format(DATE_FORMAT).to_string(),
            self.administrative_unit.clone(),
            self.product.clone(),
            self.unit.clone(),
            self.volume.to_string(),
            self.recorded_at.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }

    /// Same record ignoring `recorded_at`.
    pub fn same_observation(&self, other: &Self) -> bool {
        self.period == other.period
            && self.administrative_unit == other.administrative_unit
            && self.product == other.product
            && self.unit == other.unit
            && self.volume == other.volume
    }
}

/// Row of a raw source before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    pub year: i32,
    pub month_label: String,
    pub region: String,
    pub administrative_unit: String,
    pub product: String,
    pub volume_text: String,
    /// 1-based line in the delimited file, or position in the reshaped pivot.
    pub source_line: usize,
}

/// Single cell of a pivot page or pivot summary.
#[derive(Debug, Clone, PartialEq)]
pub enum PivotCell {
    Text(String),
    Number(f64),
    Absent,
}

impl PivotCell {
    /// Classifies a textual cell; the report writes missing values as `None`.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "None" {
            PivotCell::Absent
        } else if let Ok(number) = trimmed.parse::<f64>() {
            PivotCell::Number(number)
        } else {
            PivotCell::Text(trimmed.to_string())
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PivotCell::Absent)
    }

    /// Text view of a label cell; absent cells read as empty.
    pub fn label(&self) -> String {
        match self {
            PivotCell::Text(text) => text.clone(),
            PivotCell::Number(number) => number.to_string(),
            PivotCell::Absent => String::new(),
        }
    }

    /// Volume text for a data cell. Absent volumes count as zero.
    pub fn volume_text(&self) -> String {
        match self {
            PivotCell::Absent => "0".to_string(),
            other => other.label(),
        }
    }
}

impl From<&calamine::Data> for PivotCell {
    fn from(value: &calamine::Data) -> Self {
        match value {
            calamine::Data::Empty => PivotCell::Absent,
            calamine::Data::Float(f) => PivotCell::Number(*f),
            calamine::Data::Int(i) => PivotCell::Number(*i as f64),
            calamine::Data::String(s) => PivotCell::from_text(s),
            other => PivotCell::from_text(&other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub total_volume: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub year: i32,
    pub total_from_pivot: String,
    pub total_from_detail: String,
    pub is_equal: bool,
}

impl ReconciliationResult {
    pub fn to_fields(&self) -> [String; 4] {
        [
            self.year.to_string(),
            self.total_from_pivot.clone(),
            self.total_from_detail.clone(),
            self.is_equal.to_string(),
        ]
    }
}

/// Canonical records of one product family together with the header they carry.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDataset {
    pub name: String,
    pub columns: Vec<String>,
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalDataset {
    pub fn new(name: impl Into<String>, records: Vec<CanonicalRecord>) -> Self {
        Self {
            name: name.into(),
            columns: canonical_headers(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for CanonicalDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} record(s))", self.name, self.records.len())
    }
}
