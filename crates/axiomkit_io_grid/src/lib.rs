//! `axiomkit_io_grid` v1:
//! Size-aware writer combinators for spreadsheet-like grids.
//!
//! Modules:
//! - `spec`     : geometry, scalar values and errors
//! - `scalar`   : Rust type to scalar kind mapping
//! - `document` : backing document capability and in-memory grid
//! - `writer`   : writers, formatters, primitives and combinators
//! - `table`    : header + rows table builder
pub mod document;
pub mod scalar;
pub mod spec;
pub mod table;
pub mod writer;

pub use document::{CellDocument, CellGrid};
pub use scalar::{CellScalar, derive_cell_value_from_any, is_supported_scalar_type};
pub use spec::{
    EnumCellValue, EnumValueKind, GridWriteError, Result, SpecCellIndex, SpecCellRange,
    SpecCellSize, derive_column_letters,
};
pub use table::TableBuilder;
pub use writer::{
    Formatter, ValueFormatter, ValueWriter, Writer, cell, constant, maybe_cell, try_cell,
};
