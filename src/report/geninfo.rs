//! geninfo sheets
//!
//! Layout below the header:
//!
//! ```text
//! total     <total>
//! parallel  <sum of work or file column / total>
//! filter    <filter>
//! write     <write>
//! find
//!           <dir>   <seconds>
//!
//! <stats block per section: title link, total, avg, stddev>
//!
//! chunks            work  chunk ...
//!           <id>    ...
//!
//! files             order file  parse ...
//!           <name>  ...
//! ```

use super::{PopulateSheet, SheetContext, SummaryRow};
use crate::document::{
    Field, GeninfoProfile, Series, GENINFO_CHUNK_KEYS, GENINFO_EXTENDED_KEYS, GENINFO_FILE_KEYS,
    GENINFO_FILTER_KEYS, GENINFO_SPECIAL_KEYS,
};
use crate::sheet::{sheet_reference, CellRange, CellRef};
use crate::stats::{apply_outlier_rules, write_column_stats, StatsRows};
use crate::styles::Style;
use rust_xlsxwriter::{ColNum, RowNum};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// First column holding section data
const FIRST_DATA_COL: ColNum = 2;

/// Rows taken by one statistics block
const STATS_BLOCK_ROWS: RowNum = 4;

/// The data sections of a geninfo sheet, in layout order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Chunks,
    Files,
    Filter,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Chunks, SectionKind::Files, SectionKind::Filter];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Chunks => "chunks",
            SectionKind::Files => "files",
            SectionKind::Filter => "filter",
        }
    }

    /// Column keys of the section, including the non-aggregated `order`
    pub fn keys(self, extended: bool) -> Vec<&'static str> {
        match self {
            SectionKind::Chunks => GENINFO_CHUNK_KEYS.to_vec(),
            SectionKind::Files => {
                let mut keys = GENINFO_FILE_KEYS.to_vec();
                if extended {
                    keys.extend(GENINFO_EXTENDED_KEYS);
                }
                keys
            }
            SectionKind::Filter => GENINFO_FILTER_KEYS.to_vec(),
        }
    }

    /// Column whose total feeds the effective parallelism
    fn parallel_key(self) -> &'static str {
        match self {
            SectionKind::Chunks => "work",
            SectionKind::Files => "file",
            SectionKind::Filter => "filt_chunk",
        }
    }
}

/// Where a section's statistics landed
#[derive(Debug, Clone, PartialEq)]
pub struct SectionStats {
    pub kind: SectionKind,
    pub sum_row: RowNum,
    pub average_row: RowNum,
    /// Aggregated keys and their columns (`order` excluded)
    pub columns: Vec<(&'static str, ColNum)>,
}

impl SectionStats {
    pub fn column(&self, key: &str) -> Option<ColNum> {
        self.columns.iter().find(|(k, _)| *k == key).map(|(_, c)| *c)
    }
}

struct Section {
    kind: SectionKind,
    keys: Vec<&'static str>,
    ids: Vec<String>,
}

/// Chunk identifiers from a series' keys, highest index first
fn chunk_ids(source: &str, series: &Series) -> Vec<String> {
    let mut ids: Vec<(i64, &str)> = series
        .keys()
        .filter_map(|k| match k.trim().parse::<i64>() {
            Ok(n) => Some((n, k)),
            Err(_) => {
                warn!("{}: ignoring non-numeric chunk id '{}'", source, k);
                None
            }
        })
        .collect();
    ids.sort_by(|a, b| b.0.cmp(&a.0));
    ids.into_iter().map(|(_, k)| k.to_string()).collect()
}

/// File names in descending processing order
///
/// Equal orders keep their document order; files without an order go last.
fn file_ids(files: &Series, order: Option<&Series>) -> Vec<String> {
    let position = |name: &str| order.and_then(|o| o.get(name)).map(|v| v as i64);
    let mut ids: Vec<(Option<i64>, &str)> = files.keys().map(|k| (position(k), k)).collect();
    ids.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ids.into_iter().map(|(_, k)| k.to_string()).collect()
}

impl GeninfoProfile {
    fn plan_sections(&self, ctx: &SheetContext<'_>) -> Vec<Section> {
        let extended = ctx.config.extended();
        let mut sections = Vec::new();

        if let Some(child) = self.series("child") {
            sections.push(Section {
                kind: SectionKind::Chunks,
                keys: SectionKind::Chunks.keys(extended),
                ids: chunk_ids(&ctx.source, child),
            });
        }

        let ids = match self.series("file") {
            Some(files) => file_ids(files, self.series("order")),
            None => {
                warn!("{}: no per-file data ('file')", ctx.source);
                Vec::new()
            }
        };
        sections.push(Section {
            kind: SectionKind::Files,
            keys: SectionKind::Files.keys(extended),
            ids,
        });

        if ctx.config.show_filter {
            match self.series("filt_child") {
                Some(filt) => sections.push(Section {
                    kind: SectionKind::Filter,
                    keys: SectionKind::Filter.keys(extended),
                    ids: chunk_ids(&ctx.source, filt),
                }),
                None => debug!("{}: no filter data", ctx.source),
            }
        }

        sections
    }

    /// Write one section's data matrix and its statistics block
    ///
    /// Returns the section statistics and the first row after the data.
    fn write_section(
        &self,
        ctx: &mut SheetContext<'_>,
        section: &Section,
        data_row: RowNum,
        stats_row: RowNum,
    ) -> (SectionStats, RowNum) {
        let sheet = &mut *ctx.sheet;

        sheet.write_text(data_row, 0, section.kind.title());
        for (j, key) in section.keys.iter().enumerate() {
            sheet.write_text(data_row, FIRST_DATA_COL + j as ColNum, *key);
        }

        let data_start = data_row + 1;
        let mut row = data_start;
        for id in &section.ids {
            sheet.write_text(row, 1, id.clone());
            for (j, key) in section.keys.iter().enumerate() {
                let Some(value) = self.series(key).and_then(|s| s.get(id)) else {
                    continue;
                };
                let style = if *key == "order" {
                    Style::Integer
                } else {
                    Style::TwoDecimal
                };
                sheet.write_number(row, FIRST_DATA_COL + j as ColNum, value, style);
            }
            row += 1;
        }
        let data_end = row.saturating_sub(1);

        let target = sheet_reference(sheet.name(), CellRef::new(data_start, 1));
        sheet.write_link(stats_row, 0, target, section.kind.title());
        sheet.write_text(stats_row + 1, 1, "total");
        sheet.write_text(stats_row + 2, 1, "avg");
        sheet.write_text(stats_row + 3, 1, "stddev");

        let rows = StatsRows::consecutive(stats_row + 1);
        let mut columns = Vec::new();
        for (j, key) in section.keys.iter().enumerate() {
            if *key == "order" {
                continue;
            }
            let col = FIRST_DATA_COL + j as ColNum;
            sheet.write_text(stats_row, col, *key);
            columns.push((*key, col));
            if !section.ids.is_empty() {
                write_column_stats(sheet, col, data_start, data_end, rows);
            }
        }

        if !section.ids.is_empty() {
            let last_col = FIRST_DATA_COL + section.keys.len() as ColNum - 1;
            let data = CellRange::new(data_start, FIRST_DATA_COL, data_end, last_col);
            apply_outlier_rules(sheet, data, rows, &ctx.thresholds);
        }

        let stats = SectionStats {
            kind: section.kind,
            sum_row: rows.sum.unwrap_or(stats_row + 1),
            average_row: rows.average,
            columns,
        };
        (stats, row)
    }

    /// Write `parallel` as `<sum cell>/<total cell>`
    fn write_parallelism(&self, ctx: &mut SheetContext<'_>, parallel_row: RowNum, first: &SectionStats) {
        let Some(total) = ctx.total else {
            warn!(
                "{}: no overall total, effective parallelism not computed",
                ctx.source
            );
            return;
        };
        let Some(col) = first.column(first.kind.parallel_key()) else {
            return;
        };

        let sum = CellRef::new(first.sum_row, col);
        let cached = match (ctx.sheet.value_at(sum.row, sum.col), ctx.total_value()) {
            (Some(s), Some(t)) if t != 0.0 => Some(s / t),
            _ => None,
        };
        ctx.sheet
            .write_formula(parallel_row, 1, format!("{}/{}", sum, total), cached, Style::TwoDecimal);
    }
}

impl PopulateSheet for GeninfoProfile {
    fn populate(&self, ctx: &mut SheetContext<'_>) -> Option<SummaryRow> {
        // the header reserved the `total` row for geninfo
        let specials_row = ctx.total_row.unwrap_or(ctx.row);
        let mut row = specials_row + 1;
        for key in &GENINFO_SPECIAL_KEYS[1..] {
            ctx.sheet.write_text(row, 0, *key);
            if let Some(value) = self.special(key).number() {
                ctx.sheet.write_number(row, 1, value, Style::TwoDecimal);
            }
            row += 1;
        }
        let parallel_row = specials_row + 1;

        ctx.sheet.write_text(row, 0, "find");
        row += 1;
        match &self.find {
            Some(find) => {
                for (dir, value) in find.sorted() {
                    ctx.sheet.write_text(row, 1, dir);
                    match value {
                        Field::Present(v) => {
                            ctx.sheet.write_number(row, 2, *v, Style::TwoDecimal);
                        }
                        Field::Invalid(raw) => {
                            warn!("{}: failed to write {} for [find][{}]", ctx.source, raw, dir)
                        }
                        Field::Absent => {}
                    }
                    row += 1;
                }
            }
            None => debug!("{}: no 'find' data", ctx.source),
        }
        row += 1;

        let sections = self.plan_sections(ctx);
        let stats_top = row;
        let mut data_row = stats_top + STATS_BLOCK_ROWS * sections.len() as RowNum;
        let mut written = Vec::with_capacity(sections.len());
        for (i, section) in sections.iter().enumerate() {
            let stats_row = stats_top + STATS_BLOCK_ROWS * i as RowNum;
            let (stats, next) = self.write_section(ctx, section, data_row, stats_row);
            written.push(stats);
            data_row = next + 1;
        }
        ctx.row = data_row;

        if let Some(first) = written.first() {
            self.write_parallelism(ctx, parallel_row, first);
        }

        Some(SummaryRow {
            sheet: ctx.sheet.name().to_string(),
            source: ctx.source.clone(),
            specials_row,
            sections: written,
        })
    }
}
