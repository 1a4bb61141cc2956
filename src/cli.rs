//! CLI argument parsing for profsheet

use crate::config::ReportConfig;
use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "profsheet")]
#[command(version)]
#[command(
    about = "Turn geninfo/lcov/genhtml profile JSON into a spreadsheet with per-run statistics",
    long_about = None
)]
#[command(after_help = "EXAMPLE:\n  \
    profsheet -o stats.xlsx -v --threshold 0.1 run1/geninfo.json run2/geninfo.json\n\n\
    Each input becomes one sheet. With two or more geninfo inputs a summary\n\
    sheet compares the runs. Cells are coloured yellow/red when they are more\n\
    than --low/--high standard deviations slower than their column average,\n\
    and green when more than --high standard deviations faster.")]
pub struct Cli {
    /// Output workbook
    #[arg(short = 'o', long = "out", value_name = "FILE", default_value = "stats.xlsx")]
    pub out: PathBuf,

    /// Minimum relative deviation from the average before a cell is coloured
    #[arg(long, value_name = "FRACTION")]
    pub threshold: Option<f64>,

    /// Std-dev multiplier for the yellow band
    #[arg(long, value_name = "SIGMA")]
    pub low: Option<f64>,

    /// Std-dev multiplier for the red and green bands
    #[arg(long, value_name = "SIGMA")]
    pub high: Option<f64>,

    /// Report more detail (adds the geninfo read/translate columns)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Include the geninfo filter-stage categories
    #[arg(long = "show-filter")]
    pub show_filter: bool,

    /// Load thresholds and switches from a TOML file; flags take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,

    /// Profile JSON files, one sheet each
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Merge defaults, the optional config file and command-line flags
    pub fn report_config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_file(path)?,
            None => ReportConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(low) = self.low {
            config.low = low;
        }
        if let Some(high) = self.high {
            config.high = high;
        }
        config.verbose = config.verbose.max(self.verbose);
        config.show_filter |= self.show_filter;

        config.validate()?;
        Ok(config)
    }
}
