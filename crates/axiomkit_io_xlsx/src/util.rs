//! Stateless helper utilities used by the XLSX sheet document and writer.

use std::collections::BTreeMap;

use axiomkit_io_grid::{EnumCellValue, SpecCellIndex};
use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::ExcelDateTime;

use crate::conf::{C_NUM_FORMAT_DATETIME, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{EnumAutofitColumnsRule, SpecAutofitCellsPolicy, XlsxWriteError};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
///
/// Excel also rejects names that start or end with an apostrophe.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, idx_dup: usize) -> String {
    let c_sheet_name_suffix = format!("__{idx_dup}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert a date/time to an Excel date/time.
///
/// Fails for years Excel cannot represent (before 1900 or after 9999).
pub fn convert_datetime_to_excel_datetime(
    value: &NaiveDateTime,
) -> Result<ExcelDateTime, XlsxWriteError> {
    let n_year = u16::try_from(value.year())
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("year out of range: {value}")))?;
    let n_secs = f64::from(value.second()) + f64::from(value.nanosecond() % 1_000_000_000) / 1e9;

    let datetime = ExcelDateTime::from_ymd(n_year, value.month() as u8, value.day() as u8)?
        .and_hms(value.hour() as u16, value.minute() as u8, n_secs)?;
    Ok(datetime)
}

/// Estimate displayed width units for one cell value.
///
/// Used by autofit inference logic.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::Text(s) => estimate_unicode_string_width(s),
        EnumCellValue::Integer(n) => n.to_string().len(),
        EnumCellValue::LargeInteger(n) => n.to_string().len(),
        EnumCellValue::Float(n) => {
            if n.is_finite() {
                format!("{n:.4}").len()
            } else {
                n.to_string().len()
            }
        }
        EnumCellValue::DateTime(_) => C_NUM_FORMAT_DATETIME.len(),
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Autofit

/// Plan final column widths from written cells.
///
/// Rows before `row_header_end` count as header; later rows count as body, up
/// to `height_body_inferred_max` distinct rows.
pub fn plan_column_widths<'a>(
    cells: impl IntoIterator<Item = (&'a SpecCellIndex, &'a EnumCellValue)>,
    row_header_end: usize,
    policy: &SpecAutofitCellsPolicy,
) -> BTreeMap<usize, f64> {
    if matches!(policy.rule_columns, EnumAutofitColumnsRule::None) {
        return BTreeMap::new();
    }

    let mut dict_width_header: BTreeMap<usize, usize> = BTreeMap::new();
    let mut dict_width_body: BTreeMap<usize, usize> = BTreeMap::new();

    let mut n_row_body_last: Option<usize> = None;
    let mut n_rows_seen_for_autofit = 0usize;
    for (idx, value) in cells {
        let n_width = estimate_width_len(value);
        if idx.row < row_header_end {
            let n_width_col = dict_width_header.entry(idx.col).or_default();
            *n_width_col = usize::max(*n_width_col, n_width);
            continue;
        }

        if n_row_body_last != Some(idx.row) {
            n_row_body_last = Some(idx.row);
            n_rows_seen_for_autofit += 1;
        }
        if policy
            .height_body_inferred_max
            .is_some_and(|n_max| n_rows_seen_for_autofit > n_max)
        {
            continue;
        }
        let n_width_col = dict_width_body.entry(idx.col).or_default();
        *n_width_col = usize::max(*n_width_col, n_width);
    }

    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy.width_cell_max));
    let n_pad = policy.width_cell_padding;

    let mut dict_width_final = BTreeMap::new();
    let l_cols: Vec<usize> = dict_width_header
        .keys()
        .chain(dict_width_body.keys())
        .copied()
        .collect();
    for n_idx_col in l_cols {
        let n_width_header = dict_width_header.get(&n_idx_col).copied().unwrap_or(0);
        let n_width_body = dict_width_body.get(&n_idx_col).copied().unwrap_or(0);
        let n_width_recorded = match policy.rule_columns {
            EnumAutofitColumnsRule::Header => n_width_header,
            EnumAutofitColumnsRule::Body => n_width_body,
            EnumAutofitColumnsRule::All => usize::max(n_width_header, n_width_body),
            EnumAutofitColumnsRule::None => continue,
        };
        let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
        dict_width_final.insert(n_idx_col, n_width_final as f64);
    }

    dict_width_final
}

/// Validate autofit bounds before a sheet write.
pub fn validate_policy_autofit(
    policy_autofit: &SpecAutofitCellsPolicy,
) -> Result<(), XlsxWriteError> {
    if policy_autofit.width_cell_min == 0 {
        return Err(XlsxWriteError::InvalidPolicy(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxWriteError::InvalidPolicy(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

pub fn cast_row_num(value: usize) -> Result<u32, XlsxWriteError> {
    u32::try_from(value)
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("row index overflow: {value}")))
}

pub fn cast_col_num(value: usize) -> Result<u16, XlsxWriteError> {
    u16::try_from(value)
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
