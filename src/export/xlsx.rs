//! XLSX rendering of a run.
//!
//! One worksheet per use case, a `Summary` worksheet stacking the totals,
//! per-use-case and per-attribute tables, and a `Rejections` worksheet when
//! any row was rejected or failed ingestion. Header rows are bold and
//! frozen; column widths follow the widest cell.

use std::path::PathBuf;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::engine::RunOutcome;
use crate::error::ExportResult;
use crate::report::{self, ReportTable};

/// Excel limits sheet names to 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// Characters Excel forbids in sheet names.
const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Widest column the exporter will produce, in characters.
const MAX_COLUMN_WIDTH: usize = 60;

/// Renders a [`RunOutcome`] to a multi-sheet XLSX workbook.
pub struct XlsxExporter {
    path: PathBuf,
}

impl XlsxExporter {
    /// Create an exporter writing to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        XlsxExporter { path: path.into() }
    }

    /// Render and save the workbook.
    pub fn export(&self, outcome: &RunOutcome) -> ExportResult<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let title = Format::new().set_bold();

        for report in &outcome.reports {
            let table = report::use_case_table(report);
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(&table.name))?;
            write_table(sheet, 0, &table, &header)?;
            sheet.set_freeze_panes(1, 0)?;
            set_column_widths(sheet, &table)?;
        }

        let summary = workbook.add_worksheet();
        summary.set_name("Summary")?;
        let mut row = 0u32;
        for table in report::summary_tables(outcome) {
            summary.write_string_with_format(row, 0, &table.name, &title)?;
            row = write_table(summary, row + 1, &table, &header)?;
            // Blank row between sections.
            row += 1;
        }

        let rejections = report::rejection_table(outcome);
        if !rejections.is_empty() {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Rejections")?;
            write_table(sheet, 0, &rejections, &header)?;
            sheet.set_freeze_panes(1, 0)?;
            set_column_widths(sheet, &rejections)?;
        }

        workbook.save(&self.path)?;
        info!(
            path = %self.path.display(),
            use_cases = outcome.reports.len(),
            rejections = rejections.rows.len(),
            "Workbook written"
        );
        Ok(())
    }
}

/// Write one table starting at `start_row`; returns the row after the table.
fn write_table(
    sheet: &mut Worksheet,
    start_row: u32,
    table: &ReportTable,
    header: &Format,
) -> ExportResult<u32> {
    for (col, text) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(start_row, col as u16, text, header)?;
    }
    for (offset, row) in table.rows.iter().enumerate() {
        let row_index = start_row + 1 + offset as u32;
        for (col, cell) in row.iter().enumerate() {
            sheet.write_string(row_index, col as u16, cell)?;
        }
    }
    Ok(start_row + 1 + table.rows.len() as u32)
}

fn set_column_widths(sheet: &mut Worksheet, table: &ReportTable) -> ExportResult<()> {
    for (col, head) in table.headers.iter().enumerate() {
        let widest = table
            .rows
            .iter()
            .map(|row| row.get(col).map(|c| c.chars().count()).unwrap_or(0))
            .max()
            .unwrap_or(0)
            .max(head.chars().count())
            .min(MAX_COLUMN_WIDTH);
        sheet.set_column_width(col as u16, widest as f64 + 2.0)?;
    }
    Ok(())
}

/// Sanitize a table name into a legal sheet name.
fn sheet_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    cleaned.chars().take(MAX_SHEET_NAME).collect()
}
