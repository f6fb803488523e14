//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Largest integer magnitude an Excel number (f64) stores exactly.
pub const N_INT_EXCEL_EXACT_MAX: i64 = 9_007_199_254_740_992;
/// Number format used for date/time cells.
pub const C_NUM_FORMAT_DATETIME: &str = "yyyy-mm-dd hh:mm:ss";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumFmtKey {
    /// Generic text cell format.
    Text,
    /// Integer number format.
    Integer,
    /// Decimal number format.
    Decimal,
    /// Date/time format.
    DateTime,
    /// Header cell format.
    Header,
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
///
/// Value presets carry no borders; borders come from formatters.
pub fn derive_default_xlsx_formats() -> BTreeMap<EnumFmtKey, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Times New Roman".to_string()),
        font_size: Some(11),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Text, cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Header,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(1),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Integer,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Decimal,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0.0000".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::DateTime,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_DATETIME.to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Look up one default preset.
pub fn derive_default_xlsx_format(key: EnumFmtKey) -> SpecCellFormat {
    derive_default_xlsx_formats()
        .remove(&key)
        .unwrap_or_default()
}
