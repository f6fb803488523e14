//! Backing document capability and an in-memory reference store.

use std::collections::BTreeMap;

use crate::spec::{EnumCellValue, Result, SpecCellIndex, SpecCellRange, SpecCellSize};

/// The only capability writers need from a backing store.
///
/// Sheet selection and any presentation API belong to the concrete document;
/// writers never read back what they wrote.
pub trait CellDocument {
    /// Write one scalar value at `index`, replacing any previous value.
    fn set_cell_value(&mut self, index: SpecCellIndex, value: EnumCellValue) -> Result<()>;
}

impl<D: CellDocument + ?Sized> CellDocument for &mut D {
    fn set_cell_value(&mut self, index: SpecCellIndex, value: EnumCellValue) -> Result<()> {
        (**self).set_cell_value(index, value)
    }
}

/// Sparse in-memory grid of written values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGrid {
    dict_cells: BTreeMap<SpecCellIndex, EnumCellValue>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: SpecCellIndex) -> Option<&EnumCellValue> {
        self.dict_cells.get(&index)
    }

    /// Shorthand for `get(SpecCellIndex::new(row, col))`.
    pub fn get_at(&self, row: usize, col: usize) -> Option<&EnumCellValue> {
        self.get(SpecCellIndex::new(row, col))
    }

    /// Number of written cells.
    pub fn len(&self) -> usize {
        self.dict_cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict_cells.is_empty()
    }

    /// Written cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (&SpecCellIndex, &EnumCellValue)> {
        self.dict_cells.iter()
    }

    /// Smallest rectangle covering every written cell.
    pub fn used_range(&self) -> Option<SpecCellRange> {
        let mut iter_idx = self.dict_cells.keys();
        let first = *iter_idx.next()?;
        let (mut n_row_min, mut n_row_max) = (first.row, first.row);
        let (mut n_col_min, mut n_col_max) = (first.col, first.col);
        for idx in iter_idx {
            n_row_min = usize::min(n_row_min, idx.row);
            n_row_max = usize::max(n_row_max, idx.row);
            n_col_min = usize::min(n_col_min, idx.col);
            n_col_max = usize::max(n_col_max, idx.col);
        }

        Some(SpecCellRange::new(
            SpecCellIndex::new(n_row_min, n_col_min),
            SpecCellSize::new(n_row_max - n_row_min + 1, n_col_max - n_col_min + 1),
        ))
    }
}

impl CellDocument for CellGrid {
    fn set_cell_value(&mut self, index: SpecCellIndex, value: EnumCellValue) -> Result<()> {
        self.dict_cells.insert(index, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_grid_overwrites_and_tracks_used_range() {
        let mut grid = CellGrid::new();
        assert_eq!(grid.used_range(), None);

        grid.set_cell_value(SpecCellIndex::new(2, 1), EnumCellValue::Integer(1))
            .expect("write");
        grid.set_cell_value(SpecCellIndex::new(4, 3), EnumCellValue::Integer(2))
            .expect("write");
        grid.set_cell_value(SpecCellIndex::new(2, 1), EnumCellValue::Integer(3))
            .expect("write");

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.get_at(2, 1), Some(&EnumCellValue::Integer(3)));
        assert_eq!(
            grid.used_range(),
            Some(SpecCellRange::new(
                SpecCellIndex::new(2, 1),
                SpecCellSize::new(3, 3)
            ))
        );
    }

    #[test]
    fn test_mut_ref_forwards_writes() {
        fn write_through<D: CellDocument>(mut doc: D) {
            doc.set_cell_value(SpecCellIndex::origin(), EnumCellValue::Float(0.5))
                .expect("write");
        }

        let mut grid = CellGrid::new();
        write_through(&mut grid);
        assert_eq!(grid.get_at(0, 0), Some(&EnumCellValue::Float(0.5)));
    }
}
