pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod io_utils;
pub mod merge;
pub mod month;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod records;
pub mod reshape;
pub mod sources;
pub mod summary;
pub mod table;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::{
    cli::{Cli, Commands, ReportFormat},
    config::PipelineConfig,
    io_utils::DEFAULT_DELIMITER,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("fuel_sales_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => handle_normalize(&args),
        Commands::Reshape(args) => handle_reshape(&args),
        Commands::Reconcile(args) => handle_reconcile(&args),
        Commands::Run(args) => handle_run(&args),
        Commands::ConfigInit(args) => handle_config_init(&args),
    }
}

fn handle_normalize(args: &cli::NormalizeArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(DEFAULT_DELIMITER);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Normalizing '{}' with delimiter '{}' from {}",
        args.input.display(),
        printable_delimiter(delimiter),
        args.min_year
    );
    let raw = sources::read_raw_rows(&args.input, delimiter, encoding)?;
    let records = normalize::normalize(&raw, args.min_year)
        .with_context(|| format!("Normalizing {:?}", args.input))?;
    sources::write_canonical(&args.output, &records, delimiter)
}

fn handle_reshape(args: &cli::ReshapeArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(DEFAULT_DELIMITER);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let spec = args.layout.spec();
    info!(
        "Reshaping {} pivot pages (anchor {}:{}, filters {:?}) from '{}'",
        spec.name,
        spec.anchor.0,
        spec.anchor.1,
        spec.filters,
        args.input.display()
    );
    let source = sources::read_pivot_pages(&args.input, delimiter, encoding)?;
    let raw = reshape::reshape(&source, args.layout)
        .with_context(|| format!("Reshaping {:?}", args.input))?;
    let min_year = args.min_year.unwrap_or(spec.first_year);
    let records = normalize::normalize(&raw, min_year)
        .with_context(|| format!("Normalizing pivot pages from {:?}", args.input))?;
    sources::write_canonical(&args.output, &records, delimiter)
}

fn handle_reconcile(args: &cli::ReconcileArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(DEFAULT_DELIMITER);
    let dataset = sources::read_canonical(&args.canonical, &args.layout.to_string(), delimiter)?;
    let summary_rows = summary::read_pivot_summary(&args.pivot_workbook, &args.sheet, args.layout)?;
    let from_pivot = aggregate::totals_from_pivot_summary(&summary_rows)
        .with_context(|| format!("Totaling pivot summary in {:?}", args.pivot_workbook))?;
    let from_detail = aggregate::totals_from_detail(&dataset.records);
    let results = reconcile::reconcile(&from_pivot, &from_detail);

    match args.format {
        ReportFormat::Table => print!("{}", table::render_reconciliation(&results)),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Serializing verdicts")?
        ),
    }
    if let Some(output) = &args.output {
        sources::write_reconciliation(output, &results, delimiter)?;
        info!("Verdicts written to {:?}", output);
    }
    Ok(())
}

fn handle_run(args: &cli::RunArgs) -> Result<()> {
    let config = PipelineConfig::resolve(args.config.as_deref(), args.data_dir.as_deref())?;
    info!("Running pipeline in {:?}", config.data_dir);
    let summary = pipeline::run(&config)?;
    let mismatches = summary.mismatches();
    if mismatches > 0 {
        warn!("{mismatches} year(s) differ from the pivot report; see the result sheets");
    }
    info!(
        "Pipeline finished: {} merged row(s) across {} dataset(s)",
        summary.merged_rows,
        summary.datasets.len()
    );
    Ok(())
}

fn handle_config_init(args: &cli::ConfigInitArgs) -> Result<()> {
    PipelineConfig::default()
        .save(&args.output)
        .with_context(|| format!("Writing default config to {:?}", args.output))?;
    info!("Default configuration written to {:?}", args.output);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
