//! Table builder: one header row plus one data row per source item.

use std::sync::Arc;

use crate::document::CellDocument;
use crate::scalar::CellScalar;
use crate::spec::SpecCellRange;
use crate::writer::{Formatter, ValueFormatter, ValueWriter, Writer, cell, constant};

struct SpecTableColumn<D, T> {
    writer_header: Writer<D>,
    writer_cell: ValueWriter<D, T>,
}

impl<D, T> Clone for SpecTableColumn<D, T> {
    fn clone(&self) -> Self {
        Self {
            writer_header: self.writer_header.clone(),
            writer_cell: self.writer_cell.clone(),
        }
    }
}

/// Immutable table configuration.
///
/// Every `with_*` call returns a new builder; clones share the source rows, so a
/// partially configured table can be branched freely. Derived writers are built
/// on demand and are independent of the builder afterwards.
///
/// ```
/// use axiomkit_io_grid::{CellGrid, EnumCellValue, SpecCellIndex, SpecCellSize, TableBuilder};
///
/// struct Row {
///     name: String,
///     n: i32,
/// }
///
/// let table = TableBuilder::<CellGrid, Row>::build(vec![
///     Row { name: "A".to_string(), n: 1 },
///     Row { name: "B".to_string(), n: 2 },
/// ])
/// .with_column("Name", |row: &Row| row.name.clone())
/// .with_column("N", |row: &Row| row.n);
///
/// let mut grid = CellGrid::new();
/// let size = table.writer().write(&mut grid, SpecCellIndex::origin()).unwrap();
/// assert_eq!(size, SpecCellSize::new(3, 2));
/// assert_eq!(grid.get_at(2, 1), Some(&EnumCellValue::Integer(2)));
/// ```
pub struct TableBuilder<D, T> {
    l_rows: Arc<[T]>,
    l_columns: Vec<SpecTableColumn<D, T>>,
    fmt_table: Formatter<D>,
    fmt_header: Formatter<D>,
    fmt_row: ValueFormatter<D, T>,
}

impl<D, T> Clone for TableBuilder<D, T> {
    fn clone(&self) -> Self {
        Self {
            l_rows: Arc::clone(&self.l_rows),
            l_columns: self.l_columns.clone(),
            fmt_table: self.fmt_table.clone(),
            fmt_header: self.fmt_header.clone(),
            fmt_row: self.fmt_row.clone(),
        }
    }
}

impl<D, T> TableBuilder<D, T>
where
    D: CellDocument + 'static,
    T: Send + Sync + 'static,
{
    /// Start a table over `rows` with no columns and no formatting.
    pub fn build(rows: impl IntoIterator<Item = T>) -> Self {
        Self {
            l_rows: rows.into_iter().collect(),
            l_columns: Vec::new(),
            fmt_table: Formatter::empty(),
            fmt_header: Formatter::empty(),
            fmt_row: ValueFormatter::empty(),
        }
    }

    /// Append a column with a text header and a scalar cell per row.
    pub fn with_column<R, F>(self, header: impl Into<String>, f_select: F) -> Self
    where
        R: CellScalar + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let writer_header = constant::<D, String>(header.into());
        let writer_cell = cell::<D, R>().select(f_select);
        self.with_custom_column(writer_header, writer_cell)
    }

    /// Append a column whose cell collapses to `(0, 0)` when the selector yields `None`.
    pub fn with_optional_column<R, F>(self, header: impl Into<String>, f_select: F) -> Self
    where
        R: CellScalar + 'static,
        F: Fn(&T) -> Option<R> + Send + Sync + 'static,
    {
        let writer_header = constant::<D, String>(header.into());
        let writer_cell = cell::<D, R>().optional().select(f_select);
        self.with_custom_column(writer_header, writer_cell)
    }

    /// Append a column with full control over header and cell content.
    pub fn with_custom_column(
        mut self,
        writer_header: Writer<D>,
        writer_cell: ValueWriter<D, T>,
    ) -> Self {
        self.l_columns.push(SpecTableColumn {
            writer_header,
            writer_cell,
        });
        self
    }

    /// Formatter over the whole table rectangle (header and content).
    pub fn with_format(mut self, formatter: Formatter<D>) -> Self {
        self.fmt_table = formatter;
        self
    }

    /// Formatter over the header row.
    pub fn with_header_format(mut self, formatter: Formatter<D>) -> Self {
        self.fmt_header = formatter;
        self
    }

    /// Formatter over each data row, receiving that row's item.
    pub fn with_row_format(mut self, formatter: impl Into<ValueFormatter<D, T>>) -> Self {
        self.fmt_row = formatter.into();
        self
    }

    pub fn columns_count(&self) -> usize {
        self.l_columns.len()
    }

    pub fn rows_count(&self) -> usize {
        self.l_rows.len()
    }

    /// Column headers left to right, then the header formatter.
    pub fn header_writer(&self) -> Writer<D> {
        Writer::left_right_all(self.l_columns.iter().map(|col| col.writer_header.clone()))
            .with_format(&self.fmt_header)
    }

    /// Column cells left to right for one item, then the row formatter.
    pub fn row_writer(&self) -> ValueWriter<D, T> {
        ValueWriter::left_right_all(self.l_columns.iter().map(|col| col.writer_cell.clone()))
            .with_value_format(&self.fmt_row)
    }

    /// One row per source item, stacked top-down.
    pub fn content_writer(&self) -> Writer<D> {
        let writer_row = self.row_writer();
        let l_rows = Arc::clone(&self.l_rows);
        Writer::new(move |doc, index| writer_row.write_top_down_many(doc, index, &l_rows))
    }

    /// Header above content, then the table formatter over the full rectangle.
    pub fn writer(&self) -> Writer<D> {
        let writer_table = self.header_writer().top_down(&self.content_writer());
        let fmt_table = self.fmt_table.clone();
        let n_rows = self.rows_count();
        let n_cols = self.columns_count();

        Writer::new(move |doc, index| {
            tracing::debug!(target_cell = %index, n_rows, n_cols, "writing table");
            let size = writer_table.write(doc, index)?;
            fmt_table.format(doc, SpecCellRange::new(index, size))?;
            tracing::debug!(target_cell = %index, size = %size, "table written");
            Ok(size)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::CellGrid;
    use crate::spec::{EnumCellValue, GridWriteError, SpecCellIndex, SpecCellSize};
    use crate::writer::maybe_cell;

    #[derive(Debug, Clone)]
    struct Record {
        name: String,
        n: i32,
        note: Option<String>,
    }

    fn derive_records() -> Vec<Record> {
        vec![
            Record {
                name: "A".to_string(),
                n: 1,
                note: Some("first".to_string()),
            },
            Record {
                name: "B".to_string(),
                n: 2,
                note: None,
            },
        ]
    }

    fn text(val: &str) -> Option<EnumCellValue> {
        Some(EnumCellValue::Text(val.to_string()))
    }

    fn recorder(l_ranges: &Arc<Mutex<Vec<SpecCellRange>>>) -> Formatter<CellGrid> {
        let l_ranges_seen = Arc::clone(l_ranges);
        Formatter::new(move |_, range| {
            l_ranges_seen.lock().expect("lock").push(range);
            Ok(())
        })
    }

    #[test]
    fn test_table_writes_headers_then_rows() {
        let table = TableBuilder::<CellGrid, Record>::build(derive_records())
            .with_column("Name", |rec: &Record| rec.name.clone())
            .with_column("N", |rec: &Record| rec.n);

        let mut doc = CellGrid::new();
        let size = table
            .writer()
            .write(&mut doc, SpecCellIndex::origin())
            .expect("write");

        assert_eq!(size, SpecCellSize::new(3, 2));
        assert_eq!(doc.get_at(0, 0).cloned(), text("Name"));
        assert_eq!(doc.get_at(0, 1).cloned(), text("N"));
        assert_eq!(doc.get_at(1, 0).cloned(), text("A"));
        assert_eq!(doc.get_at(1, 1), Some(&EnumCellValue::Integer(1)));
        assert_eq!(doc.get_at(2, 0).cloned(), text("B"));
        assert_eq!(doc.get_at(2, 1), Some(&EnumCellValue::Integer(2)));
        assert_eq!(doc.len(), 6);
    }

    #[test]
    fn test_table_respects_target_offset() {
        let table = TableBuilder::<CellGrid, Record>::build(derive_records())
            .with_column("Name", |rec: &Record| rec.name.clone());

        let mut doc = CellGrid::new();
        let size = table
            .writer()
            .write(&mut doc, SpecCellIndex::new(4, 2))
            .expect("write");

        assert_eq!(size, SpecCellSize::new(3, 1));
        assert_eq!(doc.get_at(4, 2).cloned(), text("Name"));
        assert_eq!(doc.get_at(6, 2).cloned(), text("B"));
    }

    #[test]
    fn test_empty_source_renders_header_only() {
        let table = TableBuilder::<CellGrid, Record>::build(Vec::new())
            .with_column("Name", |rec: &Record| rec.name.clone())
            .with_column("N", |rec: &Record| rec.n);

        let mut doc = CellGrid::new();
        let size_content = table
            .content_writer()
            .write(&mut doc, SpecCellIndex::origin())
            .expect("write");
        assert_eq!(size_content, SpecCellSize::empty());
        assert!(doc.is_empty());

        let size = table
            .writer()
            .write(&mut doc, SpecCellIndex::origin())
            .expect("write");
        let size_header = table
            .header_writer()
            .write(&mut CellGrid::new(), SpecCellIndex::origin())
            .expect("write");
        assert_eq!(size, size_header);
        assert_eq!(size, SpecCellSize::new(1, 2));
    }

    #[test]
    fn test_no_columns_occupies_zero_width() {
        let table = TableBuilder::<CellGrid, Record>::build(derive_records());

        let mut doc = CellGrid::new();
        let size = table
            .writer()
            .write(&mut doc, SpecCellIndex::origin())
            .expect("write");

        assert_eq!(size.width, 0);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_optional_column_collapses_but_maybe_cell_keeps_grid() {
        let table = TableBuilder::<CellGrid, Record>::build(derive_records())
            .with_column("Name", |rec: &Record| rec.name.clone())
            .with_optional_column("Note", |rec: &Record| rec.note.clone());

        let writer_row = table.row_writer();
        let mut doc = CellGrid::new();
        let l_records = derive_records();
        let size_full = writer_row
            .write(&mut doc, SpecCellIndex::origin(), &l_records[0])
            .expect("write");
        let size_collapsed = writer_row
            .write(&mut doc, SpecCellIndex::new(1, 0), &l_records[1])
            .expect("write");
        assert_eq!(size_full, SpecCellSize::new(1, 2));
        assert_eq!(size_collapsed, SpecCellSize::new(1, 1));
        assert_eq!(doc.get_at(1, 1), None);

        let table = table.with_custom_column(
            constant("Note?"),
            maybe_cell::<CellGrid, String>().select(|rec: &Record| rec.note.clone()),
        );
        let size = table
            .row_writer()
            .write(&mut CellGrid::new(), SpecCellIndex::origin(), &l_records[1])
            .expect("write");
        assert_eq!(size, SpecCellSize::new(1, 2));
    }

    #[test]
    fn test_formatters_receive_expected_ranges() {
        let l_table = Arc::new(Mutex::new(Vec::new()));
        let l_header = Arc::new(Mutex::new(Vec::new()));
        let l_rows = Arc::new(Mutex::new(Vec::new()));
        let l_rows_seen = Arc::clone(&l_rows);
        let fmt_row = ValueFormatter::new(move |_: &mut CellGrid, range, rec: &Record| {
            l_rows_seen
                .lock()
                .expect("lock")
                .push((range, rec.name.clone()));
            Ok(())
        });

        let table = TableBuilder::<CellGrid, Record>::build(derive_records())
            .with_column("Name", |rec: &Record| rec.name.clone())
            .with_column("N", |rec: &Record| rec.n)
            .with_format(recorder(&l_table))
            .with_header_format(recorder(&l_header))
            .with_row_format(fmt_row);

        let idx = SpecCellIndex::new(1, 1);
        let size = table
            .writer()
            .write(&mut CellGrid::new(), idx)
            .expect("write");
        assert_eq!(size, SpecCellSize::new(3, 2));

        let size_row = SpecCellSize::new(1, 2);
        assert_eq!(
            *l_table.lock().expect("lock"),
            vec![SpecCellRange::new(idx, size)]
        );
        assert_eq!(
            *l_header.lock().expect("lock"),
            vec![SpecCellRange::new(idx, size_row)]
        );
        assert_eq!(
            *l_rows.lock().expect("lock"),
            vec![
                (
                    SpecCellRange::new(SpecCellIndex::new(2, 1), size_row),
                    "A".to_string()
                ),
                (
                    SpecCellRange::new(SpecCellIndex::new(3, 1), size_row),
                    "B".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_builder_branches_are_independent() {
        let table_base = TableBuilder::<CellGrid, Record>::build(derive_records())
            .with_column("Name", |rec: &Record| rec.name.clone());
        let table_wide = table_base.clone().with_column("N", |rec: &Record| rec.n);

        assert_eq!(table_base.columns_count(), 1);
        assert_eq!(table_wide.columns_count(), 2);

        let writer = table_base.writer();
        drop(table_base);
        let size = writer
            .write(&mut CellGrid::new(), SpecCellIndex::origin())
            .expect("write");
        assert_eq!(size, SpecCellSize::new(3, 1));
    }

    #[test]
    fn test_cell_failure_aborts_table() {
        let table = TableBuilder::<CellGrid, Record>::build(derive_records())
            .with_column("Name", |rec: &Record| rec.name.clone())
            .with_custom_column(
                constant("Bad"),
                ValueWriter::new(|_: &mut CellGrid, index, rec: &Record| {
                    if rec.n == 2 {
                        return Err(GridWriteError::OutOfBounds { index });
                    }
                    Ok(SpecCellSize::one())
                }),
            );

        let mut doc = CellGrid::new();
        let err = table
            .writer()
            .write(&mut doc, SpecCellIndex::origin())
            .expect_err("must fail");

        assert_eq!(
            err,
            GridWriteError::OutOfBounds {
                index: SpecCellIndex::new(2, 1)
            }
        );
        assert_eq!(doc.get_at(2, 0).cloned(), text("B"));
    }
}
