pub mod clean;
pub mod cli;
pub mod heuristics;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_optional_path, validate_output_encoding, validate_path, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use clean::CleanConfig;
#[cfg(feature = "cli")]
use heuristics::HeuristicsConfig;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "doc-text-etl")]
#[command(about = "Convert legacy Word documents to plain text, choosing the best Japanese decode")]
pub struct CliConfig {
    /// Document or directory to convert
    pub input: String,

    /// Write .txt files under this directory instead of next to each document
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Output character encoding
    #[arg(short, long, default_value = "utf-8")]
    pub encoding: String,

    /// Replace characters the output encoding cannot represent with '?'
    #[arg(long)]
    pub lossy: bool,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_recursive: bool,

    /// Write a conversion report (CSV, or JSON when the path ends in .json)
    #[arg(long)]
    pub report: Option<String>,

    /// Write the list of documents that failed to convert
    #[arg(long)]
    pub failed_list: Option<String>,

    /// Bundle every converted text into a zip archive
    #[arg(long)]
    pub archive: Option<String>,

    #[command(flatten)]
    pub heuristics: HeuristicsConfig,

    #[command(flatten)]
    pub cleaning: CleanConfig,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_dir(&self) -> Option<&str> {
        self.output_dir.as_deref()
    }

    fn output_encoding(&self) -> &str {
        &self.encoding
    }

    fn lossy_encoding(&self) -> bool {
        self.lossy
    }

    fn recursive(&self) -> bool {
        !self.no_recursive
    }

    fn report_path(&self) -> Option<&str> {
        self.report.as_deref()
    }

    fn failed_list_path(&self) -> Option<&str> {
        self.failed_list.as_deref()
    }

    fn archive_path(&self) -> Option<&str> {
        self.archive.as_deref()
    }

    fn heuristics(&self) -> &HeuristicsConfig {
        &self.heuristics
    }

    fn cleaning(&self) -> &CleanConfig {
        &self.cleaning
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_optional_path("output_dir", self.output_dir.as_deref())?;
        validate_optional_path("report", self.report.as_deref())?;
        validate_optional_path("failed_list", self.failed_list.as_deref())?;
        validate_optional_path("archive", self.archive.as_deref())?;
        validate_output_encoding("encoding", &self.encoding)?;
        self.heuristics.validate()?;
        self.cleaning.validate()?;
        Ok(())
    }
}
