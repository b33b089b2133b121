//! Spreadsheet conversion command

use anyhow::{Context, Result};
use collector_lib::spreadsheet;
use std::path::Path;

use crate::output::print_success;

/// Convert a delimited file to xlsx
pub fn run(input: &Path, output: &Path) -> Result<()> {
    let table = spreadsheet::convert(input, output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    print_success(&format!(
        "Wrote {} rows x {} columns to {}",
        table.rows.len(),
        table.column_count(),
        output.display()
    ));
    Ok(())
}
