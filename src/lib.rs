//! profsheet - profile JSON to spreadsheet reports
//!
//! This library reads the timing profiles written by geninfo, lcov and
//! genhtml (and, on a best-effort basis, any similar JSON) and lays them out
//! as an xlsx workbook: one sheet per profile with sum, average and standard
//! deviation rows, conditional colouring of outliers, and a summary sheet
//! comparing geninfo runs.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod naming;
pub mod report;
pub mod sheet;
pub mod stats;
pub mod styles;
pub mod workbook;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use report::{synthesize, ReportSynthesizer};
pub use workbook::{save, WorkbookModel};
