//! XLSX workbook writer that runs grid writers into buffered sheets and
//! flushes them into worksheets.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use axiomkit_io_grid::{EnumCellValue, SpecCellIndex, SpecCellRange, SpecCellSize, Writer};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{EnumFmtKey, N_INT_EXCEL_EXACT_MAX, derive_default_xlsx_formats};
use crate::sheet::XlsxSheet;
use crate::spec::{SpecCellFormat, SpecXlsxReport, SpecXlsxSheetWriteOptions, XlsxWriteError};
use crate::util::{
    cast_col_num, cast_row_num, convert_datetime_to_excel_datetime, create_sheet_identifier,
    plan_column_widths, sanitize_sheet_name, validate_policy_autofit,
};

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    dict_fmt_presets: BTreeMap<EnumFmtKey, SpecCellFormat>,
    /// Lowercased names of worksheets already in the workbook.
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path with the default value presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: impl Into<PathBuf>) -> Self {
        Self::with_formats(path_file_out, derive_default_xlsx_formats())
    }

    /// Create writer with custom value presets; missing keys fall back to defaults.
    pub fn with_formats(
        path_file_out: impl Into<PathBuf>,
        dict_fmt_presets: BTreeMap<EnumFmtKey, SpecCellFormat>,
    ) -> Self {
        let mut dict_fmt_all = derive_default_xlsx_formats();
        dict_fmt_all.extend(dict_fmt_presets);
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            dict_fmt_presets: dict_fmt_all,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxWriteError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        tracing::debug!(
            path = %self.path_file_out.display(),
            n_sheets = self.l_reports.len(),
            "workbook saved"
        );
        Ok(())
    }

    /// Run `writer` at `origin` on a new sheet and flush it into the workbook.
    ///
    /// Returns the size reported by `writer`. The worksheet is built apart from
    /// the workbook and only added once every step succeeded, so a failed call
    /// leaves neither a worksheet nor a reserved name behind.
    pub fn write_sheet(
        &mut self,
        sheet_name: &str,
        writer: &Writer<XlsxSheet>,
        origin: SpecCellIndex,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<SpecCellSize, XlsxWriteError> {
        if self.if_closed {
            return Err(XlsxWriteError::Closed);
        }
        validate_policy_autofit(&options.policy_autofit)?;

        let mut sheet = XlsxSheet::new();
        let size = writer.write(&mut sheet, origin)?;

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let mut report = SpecXlsxReport {
            sheet_name: sheet_name_unique.clone(),
            range: SpecCellRange::new(origin, size),
            cnt_cells: 0,
            warnings: vec![],
        };

        let mut worksheet = Worksheet::new();
        worksheet.set_name(&sheet_name_unique)?;

        let n_cells =
            write_sheet_cells(&mut worksheet, &sheet, &self.dict_fmt_presets, &mut report)?;
        report.cnt_cells = n_cells;

        let n_row_header_end = origin.row + usize::min(options.height_header, size.height);
        let mut dict_col_widths =
            plan_column_widths(sheet.grid().iter(), n_row_header_end, &options.policy_autofit);
        dict_col_widths.extend(sheet.column_widths().iter().map(|(col, width)| (*col, *width)));
        for (n_idx_col, n_width) in dict_col_widths {
            worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width)?;
        }

        let n_row_freeze = options.row_freeze.unwrap_or(n_row_header_end);
        if n_row_freeze > 0 || options.col_freeze > 0 {
            worksheet.set_freeze_panes(
                cast_row_num(n_row_freeze)?,
                cast_col_num(options.col_freeze)?,
            )?;
        }

        self.workbook.push_worksheet(worksheet);
        self.set_sheet_names_existing.insert(sheet_name_unique.to_lowercase());

        tracing::debug!(
            sheet = %sheet_name_unique,
            range = %report.range,
            n_cells = report.cnt_cells,
            n_warnings = report.warnings.len(),
            "sheet flushed"
        );
        self.l_reports.push(report);
        Ok(size)
    }

    /// First free name for `name`; Excel compares sheet names case-insensitively.
    fn derive_unique_sheet_name(&self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(&name.to_lowercase()) {
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(name, n_idx);
            if !self.set_sheet_names_existing.contains(&candidate.to_lowercase()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Preset used as the base format for a value of this kind.
pub fn derive_value_fmt_key(value: &EnumCellValue) -> EnumFmtKey {
    match value {
        EnumCellValue::Text(_) => EnumFmtKey::Text,
        EnumCellValue::Integer(_) | EnumCellValue::LargeInteger(_) => EnumFmtKey::Integer,
        EnumCellValue::Float(_) => EnumFmtKey::Decimal,
        EnumCellValue::DateTime(_) => EnumFmtKey::DateTime,
    }
}

fn write_sheet_cells(
    worksheet: &mut Worksheet,
    sheet: &XlsxSheet,
    dict_fmt_presets: &BTreeMap<EnumFmtKey, SpecCellFormat>,
    report: &mut SpecXlsxReport,
) -> Result<usize, XlsxWriteError> {
    let set_indices = sheet.derive_touched_indices();
    for idx in &set_indices {
        let value = sheet.get(*idx);
        let fmt_base = value
            .and_then(|val| dict_fmt_presets.get(&derive_value_fmt_key(val)))
            .cloned()
            .unwrap_or_default();
        let fmt_cell = match sheet.format_at(*idx) {
            Some(fmt_overlay) => fmt_base.merge(fmt_overlay),
            None => fmt_base,
        };

        if let Some(EnumCellValue::LargeInteger(n)) = value
            && n.unsigned_abs() > N_INT_EXCEL_EXACT_MAX as u64
        {
            report.warn(format!(
                "Cell {idx}: integer {n} exceeds Excel number precision and is rounded."
            ));
        }

        write_cell_with_format(worksheet, *idx, value, &derive_rust_xlsx_format(&fmt_cell))?;
    }
    Ok(set_indices.len())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    index: SpecCellIndex,
    value: Option<&EnumCellValue>,
    format: &Format,
) -> Result<(), XlsxWriteError> {
    let n_row = cast_row_num(index.row)?;
    let n_col = cast_col_num(index.col)?;
    match value {
        None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        Some(EnumCellValue::Text(val)) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        Some(EnumCellValue::Integer(val)) => {
            worksheet.write_number_with_format(n_row, n_col, f64::from(*val), format)?;
        }
        Some(EnumCellValue::LargeInteger(val)) => {
            worksheet.write_number_with_format(n_row, n_col, *val as f64, format)?;
        }
        Some(EnumCellValue::Float(val)) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        Some(EnumCellValue::DateTime(val)) => {
            let datetime = convert_datetime_to_excel_datetime(val)?;
            worksheet.write_datetime_with_format(n_row, n_col, &datetime, format)?;
        }
    }
    Ok(())
}

/// Convert a format spec into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use axiomkit_io_grid::{GridWriteError, TableBuilder, ValueWriter, constant};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sheet::{fmt_outline, fmt_preset};
    use crate::spec::{EnumAutofitColumnsRule, SpecAutofitCellsPolicy};

    struct Sample {
        name: String,
        n: i64,
        at: NaiveDate,
    }

    fn derive_sample_table() -> TableBuilder<XlsxSheet, Sample> {
        TableBuilder::build(vec![
            Sample {
                name: "alpha".to_string(),
                n: 1,
                at: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            },
            Sample {
                name: "beta".to_string(),
                n: N_INT_EXCEL_EXACT_MAX + 1,
                at: NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date"),
            },
        ])
        .with_column("Name", |row: &Sample| row.name.clone())
        .with_column("N", |row: &Sample| row.n)
        .with_column("At", |row: &Sample| row.at)
        .with_header_format(fmt_preset(EnumFmtKey::Header))
        .with_format(fmt_outline(1))
    }

    #[test]
    fn test_write_sheet_reports_range_and_warnings() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(tmp.path().join("out.xlsx"));

        let size = writer
            .write_sheet(
                "Data",
                &derive_sample_table().writer(),
                SpecCellIndex::new(1, 1),
                &SpecXlsxSheetWriteOptions::default(),
            )
            .expect("write sheet");
        assert_eq!(size, SpecCellSize::new(3, 3));

        let l_reports = writer.report();
        assert_eq!(l_reports.len(), 1);
        assert_eq!(l_reports[0].sheet_name, "Data");
        assert_eq!(
            l_reports[0].range,
            SpecCellRange::new(SpecCellIndex::new(1, 1), SpecCellSize::new(3, 3))
        );
        assert_eq!(l_reports[0].cnt_cells, 9);
        assert_eq!(l_reports[0].warnings.len(), 1);
        assert!(l_reports[0].warnings[0].starts_with("Cell C4:"));
    }

    #[test]
    fn test_duplicate_and_illegal_sheet_names_are_normalized() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(tmp.path().join("out.xlsx"));
        let writer_cell: Writer<XlsxSheet> = constant("x");

        for c_name in ["a/b", "a/b", "a_b", "Data", "data", "'quoted'"] {
            writer
                .write_sheet(
                    c_name,
                    &writer_cell,
                    SpecCellIndex::origin(),
                    &SpecXlsxSheetWriteOptions::default(),
                )
                .expect("write sheet");
        }

        let l_names: Vec<String> = writer
            .report()
            .into_iter()
            .map(|report| report.sheet_name)
            .collect();
        assert_eq!(
            l_names,
            vec!["a_b", "a_b__2", "a_b__3", "Data", "data__2", "quoted"]
        );
        writer.close().expect("close");
    }

    #[test]
    fn test_failed_flush_leaves_no_worksheet_and_frees_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(tmp.path().join("out.xlsx"));
        let writer_cell: Writer<XlsxSheet> = constant("x");

        let options_bad = SpecXlsxSheetWriteOptions {
            row_freeze: Some(u32::MAX as usize + 1),
            ..SpecXlsxSheetWriteOptions::default()
        };
        let err = writer
            .write_sheet("Data", &writer_cell, SpecCellIndex::origin(), &options_bad)
            .expect_err("must fail");
        assert!(matches!(err, XlsxWriteError::IndexOverflow(_)));
        assert!(writer.workbook.worksheet_from_index(0).is_err());

        writer
            .write_sheet(
                "Data",
                &writer_cell,
                SpecCellIndex::origin(),
                &SpecXlsxSheetWriteOptions::default(),
            )
            .expect("write sheet");
        assert_eq!(writer.report()[0].sheet_name, "Data");
        assert!(writer.workbook.worksheet_from_index(0).is_ok());
        assert!(writer.workbook.worksheet_from_index(1).is_err());
        writer.close().expect("close");
    }

    #[test]
    fn test_close_saves_file_and_blocks_further_writes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_out = tmp.path().join("table.xlsx");
        let mut writer = XlsxWriter::new(&path_out);

        let options = SpecXlsxSheetWriteOptions {
            col_freeze: 1,
            policy_autofit: SpecAutofitCellsPolicy {
                rule_columns: EnumAutofitColumnsRule::All,
                ..SpecAutofitCellsPolicy::default()
            },
            ..SpecXlsxSheetWriteOptions::default()
        };
        writer
            .write_sheet(
                "Data",
                &derive_sample_table().writer(),
                SpecCellIndex::origin(),
                &options,
            )
            .expect("write sheet");

        writer.close().expect("close");
        writer.close().expect("close is idempotent");
        assert!(path_out.exists());

        let err = writer
            .write_sheet(
                "More",
                &Writer::empty(),
                SpecCellIndex::origin(),
                &SpecXlsxSheetWriteOptions::default(),
            )
            .expect_err("must fail");
        assert!(matches!(err, XlsxWriteError::Closed));
    }

    #[test]
    fn test_failing_writer_adds_no_sheet() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(tmp.path().join("out.xlsx"));

        let writer_bad: ValueWriter<XlsxSheet, i32> =
            ValueWriter::new(|_: &mut XlsxSheet, index, _: &i32| {
                Err(GridWriteError::OutOfBounds { index })
            });
        let err = writer
            .write_sheet(
                "Bad",
                &writer_bad.bind(0),
                SpecCellIndex::origin(),
                &SpecXlsxSheetWriteOptions::default(),
            )
            .expect_err("must fail");

        assert!(matches!(
            err,
            XlsxWriteError::Grid(GridWriteError::OutOfBounds { .. })
        ));
        assert!(writer.report().is_empty());
    }

    #[test]
    fn test_invalid_autofit_policy_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(tmp.path().join("out.xlsx"));
        let options = SpecXlsxSheetWriteOptions {
            policy_autofit: SpecAutofitCellsPolicy {
                width_cell_min: 0,
                ..SpecAutofitCellsPolicy::default()
            },
            ..SpecXlsxSheetWriteOptions::default()
        };

        let err = writer
            .write_sheet("Data", &Writer::empty(), SpecCellIndex::origin(), &options)
            .expect_err("must fail");
        assert!(matches!(err, XlsxWriteError::InvalidPolicy(_)));
    }

    #[test]
    fn test_value_fmt_key_by_kind() {
        assert_eq!(
            derive_value_fmt_key(&EnumCellValue::Float(1.0)),
            EnumFmtKey::Decimal
        );
        assert_eq!(
            derive_value_fmt_key(&EnumCellValue::LargeInteger(1)),
            EnumFmtKey::Integer
        );
    }
}
