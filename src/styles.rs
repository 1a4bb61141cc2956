//! Cell styles
//!
//! The report uses a small fixed set of styles. Cells in the model carry a
//! [`Style`] tag; [`Styles`] turns the tags into `rust_xlsxwriter` formats once
//! per workbook and hands them out by reference while rendering.

use rust_xlsxwriter::{Color, Format, FormatAlign};

/// Style tag attached to a cell or conditional rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// Numbers with two decimals (timings)
    TwoDecimal,
    /// Whole numbers (config values, processing order)
    Integer,
    /// Bold, centered column titles
    Title,
    /// Italic notes
    Italic,
    /// Yellow background: elevated
    Highlight,
    /// Red background: severe
    Danger,
    /// Green background: favorable
    Good,
}

/// Immutable formats for every [`Style`]
#[derive(Debug, Clone)]
pub struct Styles {
    two_decimal: Format,
    integer: Format,
    title: Format,
    italic: Format,
    highlight: Format,
    danger: Format,
    good: Format,
}

impl Styles {
    pub fn new() -> Self {
        Self {
            two_decimal: Format::new().set_num_format("0.00"),
            integer: Format::new().set_num_format("0"),
            title: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            italic: Format::new()
                .set_italic()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            highlight: Format::new().set_background_color(Color::Yellow),
            danger: Format::new().set_background_color(Color::Red),
            good: Format::new().set_background_color(Color::Green),
        }
    }

    pub fn format(&self, style: Style) -> &Format {
        match style {
            Style::TwoDecimal => &self.two_decimal,
            Style::Integer => &self.integer,
            Style::Title => &self.title,
            Style::Italic => &self.italic,
            Style::Highlight => &self.highlight,
            Style::Danger => &self.danger,
            Style::Good => &self.good,
        }
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::new()
    }
}
