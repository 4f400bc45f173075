//! Pipeline configuration.
//!
//! Paths and thresholds are resolved once at start-up into a
//! [`PipelineConfig`] and handed to each step. Defaults reproduce the file
//! names and periods of the regulator datasets; a YAML file may override any
//! of them.

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::reshape::Layout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub pivot_workbook: PathBuf,
    pub pivot_sheet: String,
    pub output_workbook: PathBuf,
    pub merged_sheet: String,
    pub delimiter: char,
    pub input_encoding: Option<String>,
    pub families: Vec<FamilyConfig>,
}

/// One product family: its raw dataset, canonical file and report sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub name: String,
    pub raw_file: PathBuf,
    pub canonical_file: PathBuf,
    pub min_year: i32,
    pub layout: Layout,
    pub sheet: String,
    pub result_sheet: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dados"),
            pivot_workbook: PathBuf::from("vendas-combustiveis-m3.xlsx"),
            pivot_sheet: "Plan1".to_string(),
            output_workbook: PathBuf::from("data_extracted.xlsx"),
            merged_sheet: "DERIVATIVES_DIESEL_FINAL".to_string(),
            delimiter: ';',
            input_encoding: None,
            families: vec![
                FamilyConfig {
                    name: "derivative".to_string(),
                    raw_file: PathBuf::from("dataset_derivative.csv"),
                    canonical_file: PathBuf::from("canonical_derivative.csv"),
                    min_year: 2000,
                    layout: Layout::Derivative,
                    sheet: "DERIVATIVES".to_string(),
                    result_sheet: "RESULT_DERIVATIVESxPIVOT".to_string(),
                },
                FamilyConfig {
                    name: "diesel".to_string(),
                    raw_file: PathBuf::from("dataset_diesel.csv"),
                    canonical_file: PathBuf::from("canonical_diesel.csv"),
                    min_year: 2013,
                    layout: Layout::Diesel,
                    sheet: "DIESEL".to_string(),
                    result_sheet: "RESULT_DIESELxPIVOT".to_string(),
                },
            ],
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        let config: PipelineConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing config")?;
        let mut file =
            File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        file.write_all(serialized.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads `path` when given, otherwise the defaults, then applies `data_dir`.
    pub fn resolve(path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(dir) = data_dir {
            config.data_dir = dir.to_path_buf();
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.delimiter.is_ascii(),
            "Delimiter '{}' must be ASCII",
            self.delimiter
        );
        ensure!(!self.families.is_empty(), "At least one family must be configured");
        for family in &self.families {
            ensure!(
                !family.sheet.is_empty() && family.sheet.len() <= 31,
                "Sheet name '{}' must be 1 to 31 characters",
                family.sheet
            );
            ensure!(
                !family.result_sheet.is_empty() && family.result_sheet.len() <= 31,
                "Sheet name '{}' must be 1 to 31 characters",
                family.result_sheet
            );
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// Resolves a configured file name against `data_dir` unless it is absolute.
    pub fn data_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }
}
