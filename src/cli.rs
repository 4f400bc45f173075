use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::reshape::Layout;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize ANP fuel-sales datasets and reconcile them with the pivot report",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize a raw regulator dataset into the canonical schema
    Normalize(NormalizeArgs),
    /// Reshape a pivot page dump into the canonical schema
    Reshape(ReshapeArgs),
    /// Compare yearly totals of a canonical file with the pivot report summary
    Reconcile(ReconcileArgs),
    /// Run clean, workbook generation and reconciliation for every configured family
    Run(RunArgs),
    /// Write the default pipeline configuration to a YAML file
    ConfigInit(ConfigInitArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Raw dataset (year;month;region;uf;product;volume)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Canonical output file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Rows before this year are dropped
    #[arg(long = "min-year", default_value_t = 2000)]
    pub min_year: i32,
    /// Delimiter character (supports ';', ',', 'tab', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReshapeArgs {
    /// Pivot page dump (uf;product;cells...)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Canonical output file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Pivot layout the pages were extracted from
    #[arg(long, value_enum)]
    pub layout: Layout,
    /// Rows before this year are dropped (defaults to the layout's first year)
    #[arg(long = "min-year")]
    pub min_year: Option<i32>,
    /// Delimiter character (supports ';', ',', 'tab', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Canonical file whose detail totals are checked
    #[arg(short = 'c', long = "canonical")]
    pub canonical: PathBuf,
    /// Pivot report workbook (.xlsx or .xls)
    #[arg(short = 'p', long = "pivot-workbook")]
    pub pivot_workbook: PathBuf,
    /// Summary region to read from the pivot report
    #[arg(long, value_enum)]
    pub layout: Layout,
    /// Worksheet holding the pivot report
    #[arg(long, default_value = "Plan1")]
    pub sheet: String,
    /// Optional delimited file receiving the per-year verdicts
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Console rendering of the verdicts
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,
    /// Delimiter of the canonical and output files
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// YAML pipeline configuration (defaults apply when omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Directory holding the downloaded files and receiving the outputs
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
