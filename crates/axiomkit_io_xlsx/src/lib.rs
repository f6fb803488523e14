//! `axiomkit_io_xlsx` v1:
//! XLSX backing document for `axiomkit_io_grid` writers.
//!
//! Modules:
//! - `conf`   : Excel limits and default format presets
//! - `spec`   : format specs, options, reports and errors
//! - `util`   : pure helper functions
//! - `sheet`  : buffered sheet document and its formatters
//! - `writer` : workbook writer that flushes sheets to disk
pub mod conf;
pub mod sheet;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_NUM_FORMAT_DATETIME, EnumFmtKey, N_INT_EXCEL_EXACT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_xlsx_format,
    derive_default_xlsx_formats,
};
pub use sheet::{
    XlsxSheet, fmt_column_width, fmt_outline, fmt_preset, fmt_range, plan_outline_borders,
};
pub use spec::{
    EnumAutofitColumnsRule, SpecAutofitCellsPolicy, SpecCellBorder, SpecCellFormat,
    SpecXlsxReport, SpecXlsxSheetWriteOptions, XlsxWriteError,
};
pub use util::{convert_datetime_to_excel_datetime, plan_column_widths, sanitize_sheet_name};
pub use writer::{XlsxWriter, derive_rust_xlsx_format, derive_value_fmt_key};
