//! Report synthesis
//!
//! [`ReportSynthesizer`] turns telemetry documents into sheets, one per
//! document, in input order. Each sheet starts with a common header (source
//! path, sorted config block, overall total) and is then filled by the
//! populator for the document's tool. geninfo sheets also feed the
//! cross-document summary sheet, which is only created when more than one
//! input is given.

mod generic;
mod genhtml;
mod geninfo;
mod lcov;
mod summary;

pub use geninfo::{SectionKind, SectionStats};
pub use summary::{SummaryBuilder, SummaryRow, SUMMARY_SHEET_NAME};

use crate::config::ReportConfig;
use crate::document::{ConfigValue, Field, Profile, TelemetryDocument, ToolKind};
use crate::error::Result;
use crate::naming::{derive_sheet_name, SheetNameRegistry};
use crate::sheet::{CellRef, Sheet};
use crate::stats::Thresholds;
use crate::styles::Style;
use crate::workbook::WorkbookModel;
use rust_xlsxwriter::RowNum;
use std::path::Path;
use tracing::{debug, warn};

/// Mutable state while one document is written to its sheet
pub(crate) struct SheetContext<'a> {
    pub sheet: &'a mut Sheet,
    /// Source path, used in the header and in every diagnostic
    pub source: String,
    pub config: &'a ReportConfig,
    pub thresholds: Thresholds,
    /// Next free row
    pub row: RowNum,
    /// Row and cell of the overall `total`, when the document has one
    pub total_row: Option<RowNum>,
    pub total: Option<CellRef>,
}

impl SheetContext<'_> {
    /// Value of the overall total, if it was written
    pub fn total_value(&self) -> Option<f64> {
        self.total
            .and_then(|cell| self.sheet.value_at(cell.row, cell.col))
    }
}

/// Fill a sheet from a typed profile
pub(crate) trait PopulateSheet {
    /// Write data rows, statistics and outlier rules starting at `ctx.row`
    ///
    /// Returns the sheet's contribution to the summary, if any.
    fn populate(&self, ctx: &mut SheetContext<'_>) -> Option<SummaryRow>;
}

impl PopulateSheet for Profile {
    fn populate(&self, ctx: &mut SheetContext<'_>) -> Option<SummaryRow> {
        match self {
            Profile::Geninfo(p) => p.populate(ctx),
            Profile::Lcov(p) => p.populate(ctx),
            Profile::Genhtml(p) => p.populate(ctx),
            Profile::Generic(p) => p.populate(ctx),
        }
    }
}

/// Write the source path, the config block and the overall total
fn write_header(ctx: &mut SheetContext<'_>, doc: &TelemetryDocument) {
    ctx.sheet.write_text(0, 0, ctx.source.clone());
    ctx.sheet.write_text(1, 0, "config");

    let mut row: RowNum = 1;
    for (key, value) in doc.config.iter() {
        ctx.sheet.write_text(row, 1, key);
        match value {
            ConfigValue::Text(text) => ctx.sheet.write_text(row, 2, text.clone()),
            ConfigValue::Number(n) => {
                ctx.sheet.write_number(row, 2, *n, Style::Integer);
            }
        }
        row += 1;
    }

    if let Profile::Geninfo(geninfo) = &doc.profile {
        for (key, value) in &geninfo.counts {
            ctx.sheet.write_text(row, 1, *key);
            ctx.sheet.write_number(row, 2, *value, Style::Integer);
            row += 1;
        }
    }
    ctx.row = row.max(2);

    let reserve_total = doc.kind() == ToolKind::Geninfo;
    match &doc.total {
        Field::Present(total) => {
            ctx.sheet.write_text(ctx.row, 0, "total");
            ctx.sheet.write_number(ctx.row, 1, *total, Style::TwoDecimal);
            ctx.total = Some(CellRef::new(ctx.row, 1));
            ctx.total_row = Some(ctx.row);
            ctx.row += 1;
        }
        other => {
            if let Field::Invalid(raw) = other {
                warn!("{}: failed to write {} for [total]", ctx.source, raw);
            }
            if reserve_total {
                ctx.sheet.write_text(ctx.row, 0, "total");
                ctx.total_row = Some(ctx.row);
                ctx.row += 1;
            }
        }
    }
}

/// Builds the report workbook document by document
pub struct ReportSynthesizer<'a> {
    config: &'a ReportConfig,
    thresholds: Thresholds,
    workbook: WorkbookModel,
    names: SheetNameRegistry,
    summary: Option<SummaryBuilder>,
}

impl<'a> ReportSynthesizer<'a> {
    /// Start a report over `input_count` inputs
    ///
    /// The summary sheet name is claimed up front when there is more than one
    /// input, so it always sorts first and never collides with a document.
    pub fn new(config: &'a ReportConfig, input_count: usize) -> Result<Self> {
        let mut names = SheetNameRegistry::new();
        let summary = if input_count > 1 {
            names.reserve(SUMMARY_SHEET_NAME)?;
            Some(SummaryBuilder::new(config))
        } else {
            None
        };

        Ok(Self {
            config,
            thresholds: Thresholds::from(config),
            workbook: WorkbookModel::new(),
            names,
            summary,
        })
    }

    /// Load and add a document; unreadable or unparsable files are skipped
    pub fn add_path(&mut self, path: &Path) -> Result<()> {
        match TelemetryDocument::load(path) {
            Ok(doc) => self.add_document(&doc),
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                Ok(())
            }
        }
    }

    /// Add one document as a new sheet
    ///
    /// Fails only when no free sheet name is left.
    pub fn add_document(&mut self, doc: &TelemetryDocument) -> Result<()> {
        let base = derive_sheet_name(&doc.path, &doc.tool);
        let name = self.names.reserve(&base)?;
        debug!("{}: tool '{}' -> sheet '{}'", doc.source(), doc.tool, name);

        let mut sheet = Sheet::new(name);
        let contribution = {
            let mut ctx = SheetContext {
                sheet: &mut sheet,
                source: doc.source(),
                config: self.config,
                thresholds: self.thresholds,
                row: 0,
                total_row: None,
                total: None,
            };
            write_header(&mut ctx, doc);
            doc.profile.populate(&mut ctx)
        };

        if let (Some(summary), Some(row)) = (self.summary.as_mut(), contribution) {
            summary.push(row);
        }
        self.workbook.push(sheet);
        Ok(())
    }

    /// Number of document sheets written so far
    pub fn sheet_count(&self) -> usize {
        self.workbook.len()
    }

    /// Finalize the summary sheet and hand back the workbook
    pub fn finish(self) -> WorkbookModel {
        let mut workbook = self.workbook;

        if let Some(summary) = self.summary {
            let mut sheet = summary.build(&workbook, &self.thresholds);
            // keep at least one sheet visible so the workbook opens
            let hide = summary.len() < 2 && !workbook.is_empty();
            sheet.set_hidden(hide);
            workbook.insert(0, sheet);
        }

        workbook
    }
}

/// Build the complete report model for `inputs`, in order
pub fn synthesize<P: AsRef<Path>>(config: &ReportConfig, inputs: &[P]) -> Result<WorkbookModel> {
    let mut synthesizer = ReportSynthesizer::new(config, inputs.len())?;
    for input in inputs {
        synthesizer.add_path(input.as_ref())?;
    }
    Ok(synthesizer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    pub(crate) fn document(path: &str, value: Value) -> TelemetryDocument {
        TelemetryDocument::from_value(&PathBuf::from(path), &value).unwrap()
    }

    fn single(value: Value) -> Sheet {
        let config = ReportConfig::default();
        let mut synth = ReportSynthesizer::new(&config, 1).unwrap();
        synth.add_document(&document("runs/a/data.json", value)).unwrap();
        let workbook = synth.finish();
        workbook.sheets()[0].clone()
    }

    #[test]
    fn test_header_lists_sorted_config() {
        let sheet = single(json!({
            "config": {"tool": "lcov", "version": 2, "date": "today", "bad": "x"},
            "total": 3.5
        }));
        assert_eq!(sheet.text_at(0, 0), Some("runs/a/data.json"));
        assert_eq!(sheet.text_at(1, 0), Some("config"));
        assert_eq!(sheet.text_at(1, 1), Some("date"));
        assert_eq!(sheet.text_at(1, 2), Some("today"));
        assert_eq!(sheet.text_at(2, 1), Some("tool"));
        assert_eq!(sheet.text_at(3, 1), Some("version"));
        assert_eq!(sheet.value_at(3, 2), Some(2.0));
        assert_eq!(sheet.text_at(4, 0), Some("total"));
        assert_eq!(sheet.value_at(4, 1), Some(3.5));
    }

    #[test]
    fn test_document_without_tool_still_gets_sheet() {
        let config = ReportConfig::default();
        let mut synth = ReportSynthesizer::new(&config, 1).unwrap();
        synth
            .add_document(&document("x/mystery.json", json!({"emit": 1.0})))
            .unwrap();
        let workbook = synth.finish();
        assert_eq!(workbook.len(), 1);
        let sheet = &workbook.sheets()[0];
        assert_eq!(sheet.name(), "mystery.json");
        assert_eq!(sheet.text_at(2, 0), Some("emit"));
    }

    #[test]
    fn test_colliding_names_get_suffixes() {
        let config = ReportConfig::default();
        let mut synth = ReportSynthesizer::new(&config, 1).unwrap();
        for dir in ["a", "b", "c"] {
            let path = format!("{}/profile.json", dir);
            synth
                .add_document(&document(&path, json!({"config": {"tool": "genhtml"}})))
                .unwrap();
        }
        let workbook = synth.finish();
        let names: Vec<_> = workbook.sheets().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["profile.json", "profile.json_1", "profile.json_2"]);
    }

    #[test]
    fn test_summary_claims_name_first() {
        let config = ReportConfig::default();
        let mut synth = ReportSynthesizer::new(&config, 2).unwrap();
        synth
            .add_document(&document("geninfo_summary", json!({"emit": 1})))
            .unwrap();
        let workbook = synth.finish();
        assert_eq!(workbook.sheets()[0].name(), SUMMARY_SHEET_NAME);
        assert_eq!(workbook.sheets()[1].name(), "geninfo_summary_1");
    }

    #[test]
    fn test_no_summary_for_single_input() {
        let config = ReportConfig::default();
        let synth = ReportSynthesizer::new(&config, 1).unwrap();
        assert!(synth.finish().sheet(SUMMARY_SHEET_NAME).is_none());
    }

    #[test]
    fn test_unparsable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ nope").unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"config": {"tool": "lcov"}, "total": 1}"#).unwrap();

        let config = ReportConfig::default();
        let workbook = synthesize(&config, &[bad, good]).unwrap();
        let names: Vec<_> = workbook.sheets().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![SUMMARY_SHEET_NAME, "good.json"]);
    }
}
