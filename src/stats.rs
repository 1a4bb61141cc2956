//! Column statistics and outlier classification
//!
//! Every data column in a report gets sum, average and (with two or more
//! values) sample standard deviation rows. They are written as range formulas
//! (`SUM(C5:C9)`, `AVERAGE(..)`, `STDEV(..)`) so the workbook stays live,
//! with cached results computed here in f64.
//!
//! Data cells are then coloured by three mutually exclusive formula rules:
//!
//! | band | condition |
//! |------|-----------|
//! | elevated (yellow) | `low·σ < |v-avg| <= high·σ` and `(v-avg)/avg > threshold` |
//! | severe (red) | `|v-avg| > high·σ` and `(v-avg)/avg > threshold` |
//! | favorable (green) | `v-avg < -high·σ` and `(v-avg)/avg < -threshold` |

use crate::config::ReportConfig;
use crate::sheet::{CellRange, CellRef, ConditionalRule, Sheet};
use crate::styles::Style;
use rust_xlsxwriter::{ColNum, RowNum};

/// Aggregates over one column of a data range
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStats {
    pub count: usize,
    pub sum: f64,
    pub average: f64,
    /// Sample standard deviation; only defined for two or more values
    pub stddev: Option<f64>,
}

impl RangeStats {
    /// Compute statistics for `values`; `None` when there is nothing to aggregate
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let sum: f64 = values.iter().sum();
        let average = sum / count as f64;

        // two-pass: squared residuals about the f64 mean
        let stddev = if count >= 2 {
            let squares: f64 = values.iter().map(|v| (v - average).powi(2)).sum();
            Some((squares / (count - 1) as f64).sqrt())
        } else {
            None
        };

        Some(Self {
            count,
            sum,
            average,
            stddev,
        })
    }
}

/// Outlier colour bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlier {
    /// Slower than average by `low..=high` standard deviations
    Elevated,
    /// Slower than average by more than `high` standard deviations
    Severe,
    /// Faster than average by more than `high` standard deviations
    Favorable,
}

impl Outlier {
    pub fn style(self) -> Style {
        match self {
            Outlier::Elevated => Style::Highlight,
            Outlier::Severe => Style::Danger,
            Outlier::Favorable => Style::Good,
        }
    }
}

/// Colouring thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub threshold: f64,
    pub low: f64,
    pub high: f64,
}

impl From<&ReportConfig> for Thresholds {
    fn from(config: &ReportConfig) -> Self {
        Self {
            threshold: config.threshold,
            low: config.low,
            high: config.high,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

/// Classify one value against its column average and standard deviation
///
/// Mirrors the conditional-format rules written by [`apply_outlier_rules`].
/// A value with no average or standard deviation is never classified, and
/// neither is any value when the average is zero.
pub fn classify(
    value: f64,
    average: Option<f64>,
    stddev: Option<f64>,
    thresholds: &Thresholds,
) -> Option<Outlier> {
    let (avg, dev) = (average?, stddev?);
    if avg == 0.0 {
        return None;
    }

    let delta = value - avg;
    let diff = delta.abs();
    let rel = delta / avg;

    if diff > thresholds.high * dev && rel > thresholds.threshold {
        Some(Outlier::Severe)
    } else if diff > thresholds.low * dev
        && diff <= thresholds.high * dev
        && rel > thresholds.threshold
    {
        Some(Outlier::Elevated)
    } else if delta < -thresholds.high * dev && rel < -thresholds.threshold {
        Some(Outlier::Favorable)
    } else {
        None
    }
}

/// Rows holding the statistics of a data block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsRows {
    pub sum: Option<RowNum>,
    pub average: RowNum,
    pub stddev: RowNum,
}

impl StatsRows {
    /// Sum, average and stddev on three consecutive rows starting at `first`
    pub fn consecutive(first: RowNum) -> Self {
        Self {
            sum: Some(first),
            average: first + 1,
            stddev: first + 2,
        }
    }
}

/// Write the statistics formulas for one column of `first_row..=last_row`
///
/// Nothing is written for a column without numeric data; the stddev row is
/// left blank for a single value.
pub fn write_column_stats(
    sheet: &mut Sheet,
    col: ColNum,
    first_row: RowNum,
    last_row: RowNum,
    rows: StatsRows,
) -> Option<RangeStats> {
    if last_row < first_row {
        return None;
    }

    let range = CellRange::column(first_row, last_row, col);
    let stats = RangeStats::from_values(&sheet.values_in(&range))?;

    if let Some(sum_row) = rows.sum {
        sheet.write_formula(
            sum_row,
            col,
            format!("SUM({})", range),
            Some(stats.sum),
            Style::TwoDecimal,
        );
    }
    sheet.write_formula(
        rows.average,
        col,
        format!("AVERAGE({})", range),
        Some(stats.average),
        Style::TwoDecimal,
    );
    if let Some(dev) = stats.stddev {
        sheet.write_formula(
            rows.stddev,
            col,
            format!("STDEV({})", range),
            Some(dev),
            Style::TwoDecimal,
        );
    }

    Some(stats)
}

/// Build the three conditional-format rules for `data`
///
/// The rules reference the average and stddev rows with an absolute row and
/// a relative column, so each data cell is compared to its own column.
pub fn outlier_rules(
    data: CellRange,
    average_row: RowNum,
    stddev_row: RowNum,
    thresholds: &Thresholds,
) -> Vec<ConditionalRule> {
    let cell = data.top_left();
    let avg = CellRef::new(average_row, data.first_col).absolute_row();
    let dev = CellRef::new(stddev_row, data.first_col).absolute_row();

    let guard = format!(
        "NOT(OR(ISBLANK({}),ISBLANK({}),ISBLANK({})))",
        cell, avg, dev
    );
    let diff = format!("ABS({}-{})", cell, avg);
    let rel = format!("({}-{})/{}", cell, avg, avg);
    let Thresholds {
        threshold,
        low,
        high,
    } = *thresholds;

    let elevated = format!(
        "AND({guard},{diff}>{low}*{dev},{diff}<={high}*{dev},{rel}>{threshold})"
    );
    let severe = format!("AND({guard},{diff}>{high}*{dev},{rel}>{threshold})");
    let favorable = format!(
        "AND({guard},({cell}-{avg})<-{high}*{dev},{rel}<-{threshold})"
    );

    [
        (Outlier::Elevated, elevated),
        (Outlier::Severe, severe),
        (Outlier::Favorable, favorable),
    ]
    .into_iter()
    .map(|(outlier, rule)| ConditionalRule {
        range: data,
        rule,
        style: outlier.style(),
    })
    .collect()
}

/// Attach the outlier rules for `data` to `sheet`
pub fn apply_outlier_rules(
    sheet: &mut Sheet,
    data: CellRange,
    rows: StatsRows,
    thresholds: &Thresholds,
) {
    if data.last_row < data.first_row || data.last_col < data.first_col {
        return;
    }
    for rule in outlier_rules(data, rows.average, rows.stddev, thresholds) {
        sheet.add_rule(rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_stats_empty_is_none() {
        assert!(RangeStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_stats_single_value_has_no_stddev() {
        let stats = RangeStats::from_values(&[4.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert!(approx(stats.sum, 4.0));
        assert!(approx(stats.average, 4.0));
        assert!(stats.stddev.is_none());
    }

    #[test]
    fn test_stats_sample_stddev() {
        // mean 5, squared deviations 9+1+1+9 = 20, sample variance 20/3
        let stats = RangeStats::from_values(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!(approx(stats.sum, 20.0));
        assert!(approx(stats.average, 5.0));
        assert!(approx(stats.stddev.unwrap(), (20.0f64 / 3.0).sqrt()));
    }

    #[test]
    fn test_stats_large_offset_keeps_precision() {
        let stats = RangeStats::from_values(&[100000.01, 100000.02, 100000.03]).unwrap();
        assert!((stats.sum - 300000.06).abs() < 1e-6);
        assert!((stats.average - 100000.02).abs() < 1e-6);
        let dev = stats.stddev.unwrap();
        assert!(dev.is_finite());
        assert!((dev - 0.01).abs() < 1e-6);

        // beyond f32's integer precision
        let stats = RangeStats::from_values(&[16777217.0, 1.0]).unwrap();
        assert_eq!(stats.sum, 16777218.0);
        assert_eq!(stats.average, 8388609.0);
    }

    #[test]
    fn test_classify_bands() {
        let t = Thresholds::default();
        let (avg, dev) = (Some(10.0), Some(2.0));

        assert_eq!(classify(10.5, avg, dev, &t), None);
        // diff 3.5 in (3, 4], rel 0.35
        assert_eq!(classify(13.5, avg, dev, &t), Some(Outlier::Elevated));
        // diff exactly 4 is still elevated
        assert_eq!(classify(14.0, avg, dev, &t), Some(Outlier::Elevated));
        assert_eq!(classify(15.0, avg, dev, &t), Some(Outlier::Severe));
        assert_eq!(classify(5.0, avg, dev, &t), Some(Outlier::Favorable));
        // faster but only 1.5 sigma: no band for moderate improvements
        assert_eq!(classify(7.0, avg, dev, &t), None);
    }

    #[test]
    fn test_classify_respects_relative_threshold() {
        let t = Thresholds::default();
        // 3 sigma away but only 3% above the average
        assert_eq!(classify(103.0, Some(100.0), Some(1.0), &t), None);
        assert_eq!(classify(97.0, Some(100.0), Some(1.0), &t), None);
    }

    #[test]
    fn test_classify_blank_stats() {
        let t = Thresholds::default();
        assert_eq!(classify(100.0, Some(1.0), None, &t), None);
        assert_eq!(classify(100.0, None, Some(1.0), &t), None);
        assert_eq!(classify(100.0, Some(0.0), Some(1.0), &t), None);
    }

    #[test]
    fn test_write_column_stats_formulas() {
        let mut sheet = Sheet::new("s");
        for (i, v) in [1.0, 2.0, 3.0].iter().enumerate() {
            sheet.write_number(5 + i as u32, 2, *v, Style::TwoDecimal);
        }
        let rows = StatsRows::consecutive(1);
        let stats = write_column_stats(&mut sheet, 2, 5, 7, rows).unwrap();

        assert_eq!(stats.count, 3);
        assert_eq!(sheet.formula_at(1, 2), Some("SUM(C6:C8)"));
        assert_eq!(sheet.formula_at(2, 2), Some("AVERAGE(C6:C8)"));
        assert_eq!(sheet.formula_at(3, 2), Some("STDEV(C6:C8)"));
        assert!(approx(sheet.value_at(1, 2).unwrap(), 6.0));
        assert!(approx(sheet.value_at(2, 2).unwrap(), 2.0));
        assert!(approx(sheet.value_at(3, 2).unwrap(), 1.0));
    }

    #[test]
    fn test_write_column_stats_skips_empty_column() {
        let mut sheet = Sheet::new("s");
        let rows = StatsRows::consecutive(1);
        assert!(write_column_stats(&mut sheet, 2, 5, 7, rows).is_none());
        assert!(sheet.cell(1, 2).is_none());
        assert!(sheet.cell(2, 2).is_none());
    }

    #[test]
    fn test_outlier_rules_reference_stats_rows() {
        let rules = outlier_rules(CellRange::new(9, 2, 12, 5), 6, 7, &Thresholds::default());
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].style, Style::Highlight);
        assert_eq!(rules[1].style, Style::Danger);
        assert_eq!(rules[2].style, Style::Good);
        assert!(rules[0].rule.contains("ABS(C10-C$7)>1.5*C$8"));
        assert!(rules[0].rule.contains("ABS(C10-C$7)<=2*C$8"));
        assert!(rules[1].rule.contains("(C10-C$7)/C$7>0.15"));
        assert!(rules[2].rule.contains("(C10-C$7)<-2*C$8"));
        assert!(rules[2].rule.contains("(C10-C$7)/C$7<-0.15"));
        assert!(rules.iter().all(|r| r.rule.starts_with("AND(NOT(OR(ISBLANK(C10)")));
    }

    #[test]
    fn test_apply_outlier_rules_ignores_empty_range() {
        let mut sheet = Sheet::new("s");
        apply_outlier_rules(
            &mut sheet,
            CellRange::new(5, 2, 4, 4),
            StatsRows::consecutive(1),
            &Thresholds::default(),
        );
        assert!(sheet.rules().is_empty());
    }
}
