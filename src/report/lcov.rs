//! lcov sheets
//!
//! A run is either one block of timings or one block per segment. Each block
//! lists the scalar timings in column C and the per-file tables in columns
//! C (file) and D (seconds). Segmented runs also get an effective parallelism
//! in column D of the `total` row: the sum of the segment totals over the
//! overall total.

use super::{PopulateSheet, SheetContext, SummaryRow};
use crate::document::{Field, LcovProfile, LcovSegment};
use crate::sheet::CellRef;
use crate::styles::Style;
use tracing::warn;

/// Write one block; returns the cell holding its `total`, if written
fn write_segment(ctx: &mut SheetContext<'_>, segment: &LcovSegment, scope: &str) -> Option<CellRef> {
    let mut total = None;

    for (key, value) in &segment.scalars {
        ctx.sheet.write_text(ctx.row, 1, *key);
        match value {
            Field::Present(v) => {
                ctx.sheet.write_number(ctx.row, 2, *v, Style::TwoDecimal);
                if *key == "total" {
                    total = Some(CellRef::new(ctx.row, 2));
                }
            }
            Field::Invalid(raw) => {
                warn!("{}: failed to write {} for {}[{}]", ctx.source, raw, scope, key)
            }
            Field::Absent => warn!("{}: failed to write ?? for {}[{}]", ctx.source, scope, key),
        }
        ctx.row += 1;
    }

    for (key, table) in &segment.tables {
        let Some(table) = table else {
            warn!("{}: failed to find key '{}' for {}", ctx.source, key, scope);
            continue;
        };
        ctx.sheet.write_text(ctx.row, 1, *key);
        if table.is_empty() {
            ctx.row += 1;
            continue;
        }
        for (file, value) in table.sorted() {
            ctx.sheet.write_text(ctx.row, 2, file);
            match value {
                Field::Present(v) => {
                    ctx.sheet.write_number(ctx.row, 3, *v, Style::TwoDecimal);
                }
                Field::Invalid(raw) => warn!(
                    "{}: failed to write {} for {}[{}][{}]",
                    ctx.source, raw, scope, key, file
                ),
                Field::Absent => {}
            }
            ctx.row += 1;
        }
    }

    total
}

/// Write `(<segment totals>)/<overall total>` next to the overall total
fn write_parallelism(ctx: &mut SheetContext<'_>, totals: &[CellRef]) {
    if totals.is_empty() {
        return;
    }
    let (Some(total), Some(total_row)) = (ctx.total, ctx.total_row) else {
        warn!(
            "{}: no overall total, effective parallelism not computed",
            ctx.source
        );
        return;
    };

    let terms: Vec<String> = totals.iter().map(|c| c.to_string()).collect();
    let sum: f64 = totals
        .iter()
        .filter_map(|c| ctx.sheet.value_at(c.row, c.col))
        .sum();
    let cached = ctx.total_value().filter(|t| *t != 0.0).map(|t| sum / t);

    ctx.sheet.write_formula(
        total_row,
        3,
        format!("({})/{}", terms.join("+"), total),
        cached,
        Style::TwoDecimal,
    );
}

impl PopulateSheet for LcovProfile {
    fn populate(&self, ctx: &mut SheetContext<'_>) -> Option<SummaryRow> {
        match self {
            LcovProfile::Flat(segment) => {
                write_segment(ctx, segment, "lcov");
            }
            LcovProfile::Segmented(blocks) => {
                let mut totals = Vec::new();
                for (index, block) in blocks {
                    let Some(segment) = block else {
                        warn!("{}: no data for segment {}", ctx.source, index);
                        continue;
                    };
                    ctx.sheet
                        .write_text(ctx.row, 0, format!("segment {}", index));
                    let scope = format!("lcov[seg {}]", index);
                    if let Some(cell) = write_segment(ctx, segment, &scope) {
                        totals.push(cell);
                    }
                }
                write_parallelism(ctx, &totals);
            }
        }
        None
    }
}
