//! Run-fatal error taxonomy
//!
//! Only conditions that abort the whole invocation live here. Problems with a
//! single document or a single field are logged and skipped by the report
//! populators and never surface as an `Err`.

use thiserror::Error;

/// Errors that abort report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{name} in use..giving up after {attempts} attempts")]
    SheetNamesExhausted { name: String, attempts: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
