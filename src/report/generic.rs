//! Sheets for documents from an unrecognised tool
//!
//! Known scalars get a row of their own (A name, B value); known series get a
//! titled block with one row per entry sorted by key (B key, C value).

use super::{PopulateSheet, SheetContext, SummaryRow};
use crate::document::{Field, GenericEntry, GenericProfile};
use crate::styles::Style;
use tracing::warn;

impl PopulateSheet for GenericProfile {
    fn populate(&self, ctx: &mut SheetContext<'_>) -> Option<SummaryRow> {
        for entry in &self.entries {
            match entry {
                GenericEntry::Scalar(key, value) => {
                    ctx.sheet.write_text(ctx.row, 0, key.clone());
                    match value {
                        Field::Present(v) => {
                            ctx.sheet.write_number(ctx.row, 1, *v, Style::TwoDecimal);
                        }
                        Field::Invalid(raw) => {
                            warn!("{}: failed to write {} for [{}]", ctx.source, raw, key)
                        }
                        Field::Absent => {}
                    }
                    ctx.row += 1;
                }
                GenericEntry::Series(key, series) => {
                    ctx.sheet.write_text(ctx.row, 0, key.clone());
                    if series.is_empty() {
                        ctx.row += 1;
                        continue;
                    }
                    for (name, value) in series.sorted() {
                        ctx.sheet.write_text(ctx.row, 1, name);
                        match value {
                            Field::Present(v) => {
                                ctx.sheet.write_number(ctx.row, 2, *v, Style::TwoDecimal);
                            }
                            Field::Invalid(raw) => warn!(
                                "{}: failed to write {} for [{}][{}]",
                                ctx.source, raw, key, name
                            ),
                            Field::Absent => {}
                        }
                        ctx.row += 1;
                    }
                }
                GenericEntry::Unrecognized(key) => {
                    warn!("{}: not sure what to do with {}", ctx.source, key)
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ReportConfig;
    use crate::report::tests::document;
    use crate::report::ReportSynthesizer;
    use crate::sheet::Sheet;
    use serde_json::{json, Value};

    fn render(value: Value) -> Sheet {
        let config = ReportConfig::default();
        let mut synth = ReportSynthesizer::new(&config, 1).unwrap();
        synth
            .add_document(&document("misc/trace.json", value))
            .unwrap();
        synth.finish().sheets()[0].clone()
    }

    #[test]
    fn test_scalars_and_series_in_document_order() {
        let sheet = render(json!({
            "config": {"tool": "mystery"},
            "total": 2.0,
            "emit": 1.25,
            "load": {"z.c": 0.5, "a.c": "bad"},
            "bogus": {"x": 1},
            "parse_diff": 0.75
        }));
        assert_eq!(sheet.name(), "trace.json");
        let (emit, _) = sheet.find_text("emit").unwrap();
        assert_eq!(sheet.value_at(emit, 1), Some(1.25));
        assert_eq!(sheet.text_at(emit + 1, 0), Some("load"));
        assert_eq!(sheet.text_at(emit + 1, 1), Some("a.c"));
        assert_eq!(sheet.value_at(emit + 1, 2), None);
        assert_eq!(sheet.text_at(emit + 2, 1), Some("z.c"));
        assert_eq!(sheet.value_at(emit + 2, 2), Some(0.5));
        // unrecognised key takes no row
        assert_eq!(sheet.text_at(emit + 3, 0), Some("parse_diff"));
        assert!(sheet.find_text("bogus").is_none());
    }

    #[test]
    fn test_empty_series_keeps_its_title() {
        let sheet = render(json!({"graph": {}, "emit": 1.0}));
        let (graph, _) = sheet.find_text("graph").unwrap();
        assert_eq!(sheet.text_at(graph + 1, 0), Some("emit"));
    }
}
