//! Cross-document geninfo summary
//!
//! One row per geninfo sheet. Every value is a live reference into the
//! document's sheet: the scalar specials, then for each section key the
//! section total and average. Average and stddev rows close the table and
//! drive the same outlier colouring as the per-document sheets, so a slow run
//! stands out against its peers.

use super::geninfo::{SectionKind, SectionStats};
use crate::config::ReportConfig;
use crate::document::GENINFO_SPECIAL_KEYS;
use crate::sheet::{sheet_reference, CellRange, CellRef, Sheet};
use crate::stats::{apply_outlier_rules, write_column_stats, StatsRows, Thresholds};
use crate::styles::Style;
use crate::workbook::WorkbookModel;
use rust_xlsxwriter::{ColNum, RowNum};
use tracing::debug;

/// Name claimed by the summary sheet before any document is added
pub const SUMMARY_SHEET_NAME: &str = "geninfo_summary";

/// What one geninfo sheet contributes to the summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub sheet: String,
    pub source: String,
    /// Row of `total`; `parallel`, `filter` and `write` follow it
    pub specials_row: RowNum,
    pub sections: Vec<SectionStats>,
}

impl SummaryRow {
    fn section(&self, kind: SectionKind) -> Option<&SectionStats> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Aggregate {
    Sum,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    /// Offset into the specials, from `total`
    Special(usize),
    Section(SectionKind, &'static str, Aggregate),
}

impl Column {
    fn title(&self) -> String {
        match self {
            Column::Special(i) => GENINFO_SPECIAL_KEYS[*i].to_string(),
            Column::Section(_, key, Aggregate::Sum) => key.to_string(),
            Column::Section(_, key, Aggregate::Average) => format!("{} avg", key),
        }
    }

    /// Cell in the document sheet this column reads
    fn source(&self, row: &SummaryRow) -> Option<CellRef> {
        match self {
            Column::Special(i) => Some(CellRef::new(row.specials_row + *i as RowNum, 1)),
            Column::Section(kind, key, aggregate) => {
                let section = row.section(*kind)?;
                let col = section.column(key)?;
                let source_row = match aggregate {
                    Aggregate::Sum => section.sum_row,
                    Aggregate::Average => section.average_row,
                };
                Some(CellRef::new(source_row, col))
            }
        }
    }
}

/// Collects geninfo sheets and lays out the summary
#[derive(Debug)]
pub struct SummaryBuilder {
    extended: bool,
    show_filter: bool,
    rows: Vec<SummaryRow>,
}

impl SummaryBuilder {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            extended: config.extended(),
            show_filter: config.show_filter,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: SummaryRow) {
        self.rows.push(row);
    }

    /// Number of geninfo sheets seen
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = (0..GENINFO_SPECIAL_KEYS.len()).map(Column::Special).collect();
        for kind in SectionKind::ALL {
            if kind == SectionKind::Filter && !self.show_filter {
                continue;
            }
            for key in kind.keys(self.extended) {
                if key == "order" {
                    continue;
                }
                columns.push(Column::Section(kind, key, Aggregate::Sum));
                columns.push(Column::Section(kind, key, Aggregate::Average));
            }
        }
        columns
    }

    /// Lay out the summary sheet against the finished document sheets
    pub fn build(&self, workbook: &WorkbookModel, thresholds: &Thresholds) -> Sheet {
        let mut sheet = Sheet::new(SUMMARY_SHEET_NAME);
        let columns = self.columns();

        sheet.write_text_styled(0, 0, "case", Style::Title);
        for (i, column) in columns.iter().enumerate() {
            sheet.write_text_styled(0, 1 + i as ColNum, column.title(), Style::Title);
        }

        let first = 1;
        for (i, row) in self.rows.iter().enumerate() {
            let r = first + i as RowNum;
            sheet.write_link(r, 0, sheet_reference(&row.sheet, CellRef::new(0, 0)), row.source.clone());

            let Some(source) = workbook.sheet(&row.sheet) else {
                debug!("summary: sheet '{}' not in workbook", row.sheet);
                continue;
            };
            for (j, column) in columns.iter().enumerate() {
                let Some(cell) = column.source(row) else {
                    continue;
                };
                if source.cell(cell.row, cell.col).is_none() {
                    continue;
                }
                sheet.write_formula(
                    r,
                    1 + j as ColNum,
                    sheet_reference(&row.sheet, cell),
                    source.value_at(cell.row, cell.col),
                    Style::TwoDecimal,
                );
            }
        }

        let mut next = first;
        if !self.rows.is_empty() {
            let last = first + self.rows.len() as RowNum - 1;
            let rows = StatsRows {
                sum: None,
                average: last + 1,
                stddev: last + 2,
            };
            sheet.write_text(rows.average, 0, "average");
            sheet.write_text(rows.stddev, 0, "stddev");

            let last_col = columns.len() as ColNum;
            for col in 1..=last_col {
                write_column_stats(&mut sheet, col, first, last, rows);
            }
            apply_outlier_rules(
                &mut sheet,
                CellRange::new(first, 1, last, last_col),
                rows,
                thresholds,
            );
            next = rows.stddev + 1;
        }

        let legend = [
            format!(
                "yellow: between {:.2} and {:.2} standard deviations above average, and more than {:.2} above it relatively",
                thresholds.low, thresholds.high, thresholds.threshold
            ),
            format!(
                "red: more than {:.2} standard deviations above average, and more than {:.2} above it relatively",
                thresholds.high, thresholds.threshold
            ),
            format!(
                "green: more than {:.2} standard deviations below average, and more than {:.2} below it relatively",
                thresholds.high, thresholds.threshold
            ),
        ];
        for (i, line) in legend.into_iter().enumerate() {
            sheet.write_text_styled(next + 1 + i as RowNum, 0, line, Style::Italic);
        }

        sheet
    }
}
