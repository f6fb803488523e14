//! Buffered worksheet document and the formatters that act on it.
//!
//! Writers fill an [`XlsxSheet`] in any order; [`crate::writer::XlsxWriter`]
//! later flushes it into a `rust_xlsxwriter` worksheet in one pass, so
//! formatters can overlay formats on cells that were written earlier.

use std::collections::{BTreeMap, BTreeSet};

use axiomkit_io_grid::{
    CellDocument, CellGrid, EnumCellValue, Formatter, GridWriteError, Result, SpecCellIndex,
    SpecCellRange,
};

use crate::conf::{EnumFmtKey, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, derive_default_xlsx_format};
use crate::spec::{SpecCellBorder, SpecCellFormat};

/// In-memory sheet: written values plus per-cell format overlays.
#[derive(Debug, Clone, Default)]
pub struct XlsxSheet {
    grid: CellGrid,
    dict_formats: BTreeMap<SpecCellIndex, SpecCellFormat>,
    dict_col_widths: BTreeMap<usize, f64>,
}

impl XlsxSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Written values.
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn get(&self, index: SpecCellIndex) -> Option<&EnumCellValue> {
        self.grid.get(index)
    }

    /// Accumulated format overlay for `index`.
    pub fn format_at(&self, index: SpecCellIndex) -> Option<&SpecCellFormat> {
        self.dict_formats.get(&index)
    }

    /// Overlay `patch` on the cell's current format (right-side wins).
    pub fn apply_format(&mut self, index: SpecCellIndex, patch: &SpecCellFormat) -> Result<()> {
        validate_index_within_excel(index)?;
        let fmt_current = self.dict_formats.entry(index).or_default();
        *fmt_current = fmt_current.merge(patch);
        Ok(())
    }

    /// Explicit column width; takes precedence over autofit.
    pub fn set_column_width(&mut self, col: usize, width: f64) -> Result<()> {
        validate_index_within_excel(SpecCellIndex::new(0, col))?;
        self.dict_col_widths.insert(col, width);
        Ok(())
    }

    pub fn column_width(&self, col: usize) -> Option<f64> {
        self.dict_col_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> &BTreeMap<usize, f64> {
        &self.dict_col_widths
    }

    /// Every cell that holds a value or a format, row-major.
    pub fn derive_touched_indices(&self) -> BTreeSet<SpecCellIndex> {
        self.grid
            .iter()
            .map(|(idx, _)| *idx)
            .chain(self.dict_formats.keys().copied())
            .collect()
    }
}

impl CellDocument for XlsxSheet {
    fn set_cell_value(&mut self, index: SpecCellIndex, value: EnumCellValue) -> Result<()> {
        validate_index_within_excel(index)?;
        tracing::trace!(cell = %index, kind = %value.kind(), "buffer cell value");
        self.grid.set_cell_value(index, value)
    }
}

fn validate_index_within_excel(index: SpecCellIndex) -> Result<()> {
    if index.row >= N_NROWS_EXCEL_MAX || index.col >= N_NCOLS_EXCEL_MAX {
        return Err(GridWriteError::OutOfBounds { index });
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// #region Formatters

/// Overlay `format` on every cell of the range.
pub fn fmt_range(format: SpecCellFormat) -> Formatter<XlsxSheet> {
    Formatter::new(move |sheet: &mut XlsxSheet, range| {
        for idx in range.iter_cells() {
            sheet.apply_format(idx, &format)?;
        }
        Ok(())
    })
}

/// Overlay one of the default presets on every cell of the range.
pub fn fmt_preset(key: EnumFmtKey) -> Formatter<XlsxSheet> {
    fmt_range(derive_default_xlsx_format(key))
}

/// Draw a box of `border` style around the outer edge of the range.
pub fn fmt_outline(border: i64) -> Formatter<XlsxSheet> {
    Formatter::new(move |sheet: &mut XlsxSheet, range| {
        for (idx, spec_border) in plan_outline_borders(range, border) {
            sheet.apply_format(idx, &SpecCellFormat::from_border(&spec_border))?;
        }
        Ok(())
    })
}

/// Set the width of every column the range spans.
pub fn fmt_column_width(width: f64) -> Formatter<XlsxSheet> {
    Formatter::new(move |sheet: &mut XlsxSheet, range: SpecCellRange| {
        for n_col in range.index.col..range.index.col + range.size.width {
            sheet.set_column_width(n_col, width)?;
        }
        Ok(())
    })
}

/// Border sides per edge cell of `range`; interior cells are not listed.
pub fn plan_outline_borders(
    range: SpecCellRange,
    border: i64,
) -> Vec<(SpecCellIndex, SpecCellBorder)> {
    let Some(idx_last) = range.last() else {
        return vec![];
    };

    range
        .iter_cells()
        .filter_map(|idx| {
            let spec_border = SpecCellBorder {
                top: (idx.row == range.index.row).then_some(border),
                bottom: (idx.row == idx_last.row).then_some(border),
                left: (idx.col == range.index.col).then_some(border),
                right: (idx.col == idx_last.col).then_some(border),
            };
            (spec_border != SpecCellBorder::default()).then_some((idx, spec_border))
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
