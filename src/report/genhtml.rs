//! genhtml sheets
//!
//! One matrix of `directory` and file rows. Column D holds the row's own
//! value (`total`), columns E onward the timing categories. Statistics sit
//! between the column titles and the data so they stay visible while
//! scrolling a large report.

use super::{PopulateSheet, SheetContext, SummaryRow};
use crate::document::{Field, GenhtmlProfile, Series, GENHTML_KEYS};
use crate::sheet::{CellRange, CellRef};
use crate::stats::{apply_outlier_rules, write_column_stats, StatsRows};
use crate::styles::Style;
use rust_xlsxwriter::ColNum;
use tracing::warn;

/// Column of the first key in [`GENHTML_KEYS`]
const VALUE_COL: ColNum = 3;

/// Last component of `path` and the directory holding it
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

impl GenhtmlProfile {
    /// Write `value` and the timing categories recorded for `key`
    fn write_row(&self, ctx: &mut SheetContext<'_>, key: &str, value: &Field<f64>) {
        let row = ctx.row;
        match value {
            Field::Present(v) => {
                ctx.sheet.write_number(row, VALUE_COL, *v, Style::TwoDecimal);
            }
            Field::Invalid(raw) => warn!("{}: failed to write {} for [{}]", ctx.source, raw, key),
            Field::Absent => {}
        }

        for (i, category) in GENHTML_KEYS.iter().enumerate().skip(1) {
            let col = VALUE_COL + i as ColNum;
            match self.timing(category).and_then(|s| s.field(key)) {
                Some(Field::Present(v)) => {
                    ctx.sheet.write_number(row, col, *v, Style::TwoDecimal);
                }
                Some(Field::Invalid(raw)) => warn!(
                    "{}: failed to write {} for [{}][{}]",
                    ctx.source, raw, category, key
                ),
                _ => {}
            }
        }
        ctx.row += 1;
    }

    fn write_files(&self, ctx: &mut SheetContext<'_>, files: &Series, dir: Option<&str>) {
        for (path, value) in files.sorted() {
            let (parent, name) = split_path(path);
            let label = match dir {
                Some(dir) if parent != dir => continue,
                Some(_) => name,
                None => path,
            };
            ctx.sheet.write_text(ctx.row, 2, label);
            self.write_row(ctx, path, value);
        }
    }
}

impl PopulateSheet for GenhtmlProfile {
    fn populate(&self, ctx: &mut SheetContext<'_>) -> Option<SummaryRow> {
        for (key, value) in &self.parse {
            ctx.sheet.write_text(ctx.row, 0, *key);
            ctx.sheet.write_number(ctx.row, 1, *value, Style::TwoDecimal);
            ctx.row += 1;
        }

        for (i, key) in GENHTML_KEYS.iter().enumerate() {
            ctx.sheet.write_text(ctx.row, VALUE_COL + i as ColNum, *key);
        }
        let sum_row = ctx.row + 1;
        let rows = StatsRows::consecutive(sum_row);
        ctx.sheet.write_text(sum_row, 2, "total");
        ctx.sheet.write_text(rows.average, 2, "average");
        ctx.sheet.write_text(rows.stddev, 2, "stddev");
        ctx.row = rows.stddev + 1;

        let Some(files) = &self.file else {
            warn!("{}: incomplete data - skipping", ctx.source);
            return None;
        };

        let begin = ctx.row;
        match &self.dir {
            Some(dirs) => {
                for (dir, value) in dirs.sorted() {
                    ctx.sheet.write_text(ctx.row, 0, "directory");
                    ctx.sheet.write_text(ctx.row, 1, dir);
                    self.write_row(ctx, dir, value);
                    self.write_files(ctx, files, Some(dir));
                }
            }
            // flat report: no directory data
            None => self.write_files(ctx, files, None),
        }
        if ctx.row == begin {
            return None;
        }
        let end = ctx.row - 1;

        let last_col = VALUE_COL + GENHTML_KEYS.len() as ColNum - 1;
        for col in VALUE_COL..=last_col {
            write_column_stats(ctx.sheet, col, begin, end, rows);
        }
        let data = CellRange::new(begin, VALUE_COL, end, last_col);
        apply_outlier_rules(ctx.sheet, data, rows, &ctx.thresholds);

        match (ctx.total, ctx.total_row) {
            (Some(total), Some(total_row)) => {
                let sum = CellRef::new(sum_row, VALUE_COL);
                let cached = match (ctx.sheet.value_at(sum.row, sum.col), ctx.total_value()) {
                    (Some(s), Some(t)) if t != 0.0 => Some(s / t),
                    _ => None,
                };
                ctx.sheet.write_formula(
                    total_row,
                    2,
                    format!("{}/{}", sum, total),
                    cached,
                    Style::TwoDecimal,
                );
            }
            _ => warn!(
                "{}: no overall total, effective parallelism not computed",
                ctx.source
            ),
        }

        None
    }
}
