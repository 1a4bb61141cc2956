//! In-memory sheet model
//!
//! Populators write into a [`Sheet`] rather than straight into the xlsx
//! writer. The model keeps every cell addressable, so formula results can be
//! cached from the data they reference and tests can inspect the layout
//! without a spreadsheet engine.

use crate::styles::Style;
use rust_xlsxwriter::utility::column_number_to_name;
use rust_xlsxwriter::{ColNum, RowNum};
use std::collections::BTreeMap;
use std::fmt;

/// A1-style reference to a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: RowNum,
    pub col: ColNum,
    pub absolute_row: bool,
    pub absolute_col: bool,
}

impl CellRef {
    /// Fully relative reference
    pub fn new(row: RowNum, col: ColNum) -> Self {
        Self {
            row,
            col,
            absolute_row: false,
            absolute_col: false,
        }
    }

    /// Pin the row (`C$5`) while the column stays relative
    pub fn absolute_row(mut self) -> Self {
        self.absolute_row = true;
        self
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_marker = if self.absolute_col { "$" } else { "" };
        let row_marker = if self.absolute_row { "$" } else { "" };
        write!(
            f,
            "{}{}{}{}",
            col_marker,
            column_number_to_name(self.col),
            row_marker,
            self.row + 1
        )
    }
}

/// Rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: RowNum,
    pub first_col: ColNum,
    pub last_row: RowNum,
    pub last_col: ColNum,
}

impl CellRange {
    pub fn new(first_row: RowNum, first_col: ColNum, last_row: RowNum, last_col: ColNum) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// Rows `first_row..=last_row` of a single column
    pub fn column(first_row: RowNum, last_row: RowNum, col: ColNum) -> Self {
        Self::new(first_row, col, last_row, col)
    }

    pub fn top_left(&self) -> CellRef {
        CellRef::new(self.first_row, self.first_col)
    }

    pub fn contains(&self, row: RowNum, col: ColNum) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            CellRef::new(self.first_row, self.first_col),
            CellRef::new(self.last_row, self.last_col)
        )
    }
}

/// Quote a sheet name for use in a formula or internal link
pub fn sheet_reference(sheet: &str, cell: CellRef) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cell)
}

/// Contents of a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Live formula (without the leading `=`) and the value it evaluates to
    Formula {
        expr: String,
        cached: Option<f64>,
    },
    /// Hyperlink into the workbook (`'Sheet'!A1`)
    Link {
        target: String,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<Style>,
}

/// Formula-driven conditional format over a range
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRule {
    pub range: CellRange,
    /// Formula evaluated relative to the top-left cell of `range`
    pub rule: String,
    pub style: Style,
}

/// One worksheet of the report
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(RowNum, ColNum), Cell>,
    rules: Vec<ConditionalRule>,
    hidden: bool,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            rules: Vec::new(),
            hidden: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn put(&mut self, row: RowNum, col: ColNum, value: CellValue, style: Option<Style>) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn write_text(&mut self, row: RowNum, col: ColNum, text: impl Into<String>) {
        self.put(row, col, CellValue::Text(text.into()), None);
    }

    pub fn write_text_styled(
        &mut self,
        row: RowNum,
        col: ColNum,
        text: impl Into<String>,
        style: Style,
    ) {
        self.put(row, col, CellValue::Text(text.into()), Some(style));
    }

    /// Write a number; non-finite values cannot be stored and are dropped
    pub fn write_number(&mut self, row: RowNum, col: ColNum, value: f64, style: Style) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.put(row, col, CellValue::Number(value), Some(style));
        true
    }

    pub fn write_formula(
        &mut self,
        row: RowNum,
        col: ColNum,
        expr: impl Into<String>,
        cached: Option<f64>,
        style: Style,
    ) {
        let cached = cached.filter(|v| v.is_finite());
        self.put(
            row,
            col,
            CellValue::Formula {
                expr: expr.into(),
                cached,
            },
            Some(style),
        );
    }

    pub fn write_link(
        &mut self,
        row: RowNum,
        col: ColNum,
        target: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.put(
            row,
            col,
            CellValue::Link {
                target: target.into(),
                text: text.into(),
            },
            None,
        );
    }

    pub fn add_rule(&mut self, rule: ConditionalRule) {
        self.rules.push(rule);
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn cell(&self, row: RowNum, col: ColNum) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(RowNum, ColNum), &Cell)> {
        self.cells.iter()
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    pub fn text_at(&self, row: RowNum, col: ColNum) -> Option<&str> {
        match self.cell(row, col).map(|c| &c.value) {
            Some(CellValue::Text(text)) => Some(text),
            Some(CellValue::Link { text, .. }) => Some(text),
            _ => None,
        }
    }

    /// Numeric value of a cell: a stored number or a formula's cached result
    pub fn value_at(&self, row: RowNum, col: ColNum) -> Option<f64> {
        match self.cell(row, col).map(|c| &c.value) {
            Some(CellValue::Number(v)) => Some(*v),
            Some(CellValue::Formula { cached, .. }) => *cached,
            _ => None,
        }
    }

    pub fn formula_at(&self, row: RowNum, col: ColNum) -> Option<&str> {
        match self.cell(row, col).map(|c| &c.value) {
            Some(CellValue::Formula { expr, .. }) => Some(expr),
            _ => None,
        }
    }

    /// Numeric values inside `range`, row-major
    pub fn values_in(&self, range: &CellRange) -> Vec<f64> {
        self.cells
            .range((range.first_row, 0)..=(range.last_row, ColNum::MAX))
            .filter(|((row, col), _)| range.contains(*row, *col))
            .filter_map(|((row, col), _)| self.value_at(*row, *col))
            .collect()
    }

    /// First cell whose text equals `needle`
    pub fn find_text(&self, needle: &str) -> Option<(RowNum, ColNum)> {
        self.cells
            .keys()
            .find(|(row, col)| self.text_at(*row, *col) == Some(needle))
            .copied()
    }

    /// Highest row that holds a cell
    pub fn last_row(&self) -> Option<RowNum> {
        self.cells.keys().map(|(row, _)| *row).max()
    }
}
