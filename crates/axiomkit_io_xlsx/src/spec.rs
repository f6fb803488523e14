//! Shared XLSX specification models.

use axiomkit_io_grid::{GridWriteError, SpecCellRange};
use rust_xlsxwriter::XlsxError;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format property bag; `None` means "not set".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }

    /// Format carrying only the given side borders.
    pub fn from_border(border: &SpecCellBorder) -> SpecCellFormat {
        SpecCellFormat {
            top: border.top,
            bottom: border.bottom,
            left: border.left,
            right: border.right,
            ..Default::default()
        }
    }
}

/// Per-side border styles; `None` leaves the side untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellBorder {
    /// Top border style.
    pub top: Option<i64>,
    /// Bottom border style.
    pub bottom: Option<i64>,
    /// Left border style.
    pub left: Option<i64>,
    /// Right border style.
    pub right: Option<i64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only (default).
    #[default]
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells.
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::Header,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Per-sheet call options for [`crate::writer::XlsxWriter::write_sheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxSheetWriteOptions {
    /// Rows at the top of the written range treated as header.
    pub height_header: usize,
    /// Number of frozen columns.
    pub col_freeze: usize,
    /// Frozen row index; defaults to the end of the header rows when `None`.
    pub row_freeze: Option<usize>,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecXlsxSheetWriteOptions {
    fn default() -> Self {
        Self {
            height_header: 1,
            col_freeze: 0,
            row_freeze: None,
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-sheet write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Range reported by the sheet writer.
    pub range: SpecCellRange,
    /// Number of cells emitted to the worksheet (values and formatted blanks).
    pub cnt_cells: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Workbook-level write failures.
#[derive(Debug, thiserror::Error)]
pub enum XlsxWriteError {
    /// A sheet writer or formatter failed.
    #[error(transparent)]
    Grid(#[from] GridWriteError),
    /// `rust_xlsxwriter` rejected an operation.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Invalid option value.
    #[error("{0}")]
    InvalidPolicy(String),
    /// Row/column index does not fit the XLSX index types.
    #[error("{0}")]
    IndexOverflow(String),
    /// Writer already saved.
    #[error("Cannot write after close().")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
