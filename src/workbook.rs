//! Workbook model and xlsx rendering
//!
//! [`WorkbookModel`] is the ordered list of sheets produced by the report
//! synthesizer. [`save`] renders it with `rust_xlsxwriter` in one pass once
//! every sheet is complete.

use crate::error::Result;
use crate::sheet::{Cell, CellValue, Sheet};
use crate::styles::Styles;
use rust_xlsxwriter::{ConditionalFormatFormula, Formula, Url, Workbook, Worksheet};
use std::path::Path;
use tracing::{debug, info};

/// Ordered sheets of the report
#[derive(Debug, Clone, Default)]
pub struct WorkbookModel {
    sheets: Vec<Sheet>,
}

impl WorkbookModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Insert a sheet at `index`, shifting later sheets right
    pub fn insert(&mut self, index: usize, sheet: Sheet) {
        self.sheets.insert(index, sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    styles: &Styles,
    (row, col): (u32, u16),
    cell: &Cell,
) -> Result<()> {
    let format = cell.style.map(|s| styles.format(s));

    match (&cell.value, format) {
        (CellValue::Text(text), Some(format)) => {
            worksheet.write_string_with_format(row, col, text, format)?;
        }
        (CellValue::Text(text), None) => {
            worksheet.write_string(row, col, text)?;
        }
        (CellValue::Number(value), Some(format)) => {
            worksheet.write_number_with_format(row, col, *value, format)?;
        }
        (CellValue::Number(value), None) => {
            worksheet.write_number(row, col, *value)?;
        }
        (CellValue::Formula { expr, cached }, format) => {
            let mut formula = Formula::new(format!("={}", expr));
            if let Some(value) = cached {
                formula = formula.set_result(value.to_string());
            }
            match format {
                Some(format) => worksheet.write_formula_with_format(row, col, formula, format)?,
                None => worksheet.write_formula(row, col, formula)?,
            };
        }
        (CellValue::Link { target, text }, _) => {
            let url = Url::new(format!("internal:{}", target)).set_text(text);
            worksheet.write_url(row, col, url)?;
        }
    }
    Ok(())
}

fn render_sheet(worksheet: &mut Worksheet, styles: &Styles, sheet: &Sheet) -> Result<()> {
    worksheet.set_name(sheet.name())?;

    for (&position, cell) in sheet.cells() {
        write_cell(worksheet, styles, position, cell)?;
    }

    for rule in sheet.rules() {
        let format = ConditionalFormatFormula::new()
            .set_rule(format!("={}", rule.rule).as_str())
            .set_format(styles.format(rule.style));
        let range = rule.range;
        worksheet.add_conditional_format(
            range.first_row,
            range.first_col,
            range.last_row,
            range.last_col,
            &format,
        )?;
    }

    if sheet.is_hidden() {
        worksheet.set_hidden(true);
    }
    Ok(())
}

/// Render the model into an in-memory xlsx workbook
pub fn render(model: &WorkbookModel) -> Result<Workbook> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    // a hidden sheet cannot be the one Excel opens on
    let active = model.sheets().iter().position(|s| !s.is_hidden());

    for (i, sheet) in model.sheets().iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        render_sheet(worksheet, &styles, sheet)?;
        if Some(i) == active {
            worksheet.set_active(true);
        }
        debug!(
            "rendered sheet '{}' ({} cells, {} rules)",
            sheet.name(),
            sheet.cells().count(),
            sheet.rules().len()
        );
    }

    // xlsx needs at least one worksheet
    if model.is_empty() {
        workbook.add_worksheet();
    }

    Ok(workbook)
}

/// Render the model and write it to `path`
pub fn save<P: AsRef<Path>>(model: &WorkbookModel, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = render(model)?;
    workbook.save(path)?;
    info!("wrote {} sheets to {}", model.len(), path.display());
    Ok(())
}
