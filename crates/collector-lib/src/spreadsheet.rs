//! Delimited file to xlsx conversion
//!
//! Produces a single `Sheet1` with a bold, frozen header row, an auto-filter
//! over the full data range and columns sized to their longest cell.

use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

use crate::error::{CollectorError, Result};

pub const SHEET_NAME: &str = "Sheet1";

/// Rows read from a delimited file; the first row is the header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Longest cell text per column, counted in characters
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.column_count()];
        for row in &self.rows {
            for (col, cell) in row.iter().enumerate() {
                widths[col] = widths[col].max(cell.chars().count());
            }
        }
        widths
    }
}

/// Tab for `.tsv` files, comma for everything else
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read a delimited file into memory
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table { rows })
}

/// Write a table as a styled workbook
pub fn write_workbook(table: &Table, output: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = to_row(row_idx)?;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = to_col(col_idx)?;
            if row_idx == 0 {
                worksheet.write_string_with_format(r, c, cell, &header_format)?;
            } else if cell.is_empty() {
                continue;
            } else if let Some(number) = parse_number(cell) {
                worksheet.write_number(r, c, number)?;
            } else {
                worksheet.write_string(r, c, cell)?;
            }
        }
    }

    let columns = table.column_count();
    if !table.rows.is_empty() && columns > 0 {
        let last_row = to_row(table.rows.len() - 1)?;
        let last_col = to_col(columns - 1)?;
        worksheet.autofilter(0, 0, last_row, last_col)?;
        worksheet.set_freeze_panes(1, 0)?;
    }

    for (col_idx, width) in table.column_widths().into_iter().enumerate() {
        if width > 0 {
            worksheet.set_column_width(to_col(col_idx)?, width as f64)?;
        }
    }

    workbook.save(output)?;
    Ok(())
}

/// Convert a `.csv`/`.tsv` file to `.xlsx`
pub fn convert(input: &Path, output: &Path) -> Result<Table> {
    let table = read_table(input)?;
    write_workbook(&table, output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = table.rows.len(),
        columns = table.column_count(),
        "Converted to spreadsheet"
    );
    Ok(table)
}

/// Finite numbers only; `NaN`/`inf` stay text
fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn to_row(idx: usize) -> Result<u32> {
    u32::try_from(idx).map_err(|_| CollectorError::Spreadsheet(format!("row {} out of range", idx)))
}

fn to_col(idx: usize) -> Result<u16> {
    u16::try_from(idx)
        .map_err(|_| CollectorError::Spreadsheet(format!("column {} out of range", idx)))
}
