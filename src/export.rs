//! Spreadsheet export.
//!
//! Every row of every table goes into one `.xlsx` workbook, one sheet per table. The first row of
//! each sheet holds the table's column names; nothing is filtered, reformatted or styled.

use crate::db::{Db, Table};
use crate::error::Res;
use crate::model::{Cell, TableRow};
use anyhow::Context;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// The contents of one sheet: a header row and the data rows beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn from_rows<R: TableRow>(name: impl Into<String>, rows: &[R]) -> Self {
        Self {
            name: name.into(),
            headers: R::HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(TableRow::cells).collect(),
        }
    }
}

/// How many rows were written to each sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
}

/// Reads every table in full, in the same order as the tables are listed in `Table::ALL`.
pub(crate) async fn read_sheets(db: &Db) -> Res<Vec<Sheet>> {
    let mut sheets = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let sheet = match table {
            Table::Production => Sheet::from_rows(table.sheet_name(), &db.production_rows().await?),
            Table::Prices => Sheet::from_rows(table.sheet_name(), &db.price_rows().await?),
            Table::Sales => Sheet::from_rows(table.sheet_name(), &db.sales_rows().await?),
        };
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Writes `sheets` to a new workbook at `path`, replacing any file already there.
pub(crate) fn write_workbook(path: &Path, sheets: &[Sheet]) -> Res<Vec<SheetSummary>> {
    let mut workbook = Workbook::new();
    let mut summaries = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        fill_worksheet(worksheet, sheet)
            .with_context(|| format!("Unable to write the '{}' sheet", sheet.name))?;
        summaries.push(SheetSummary {
            name: sheet.name.clone(),
            rows: sheet.rows.len(),
        });
    }
    workbook
        .save(path)
        .with_context(|| format!("Unable to save workbook to {}", path.display()))?;
    debug!("Saved workbook with {} sheets to {}", sheets.len(), path.display());
    Ok(summaries)
}

fn fill_worksheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Res<()> {
    worksheet.set_name(&sheet.name)?;
    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string(0, column(col)?, header)?;
    }
    for (ix, row) in sheet.rows.iter().enumerate() {
        let row_num = u32::try_from(ix + 1).context("Too many rows for one sheet")?;
        for (col, cell) in row.iter().enumerate() {
            let col = column(col)?;
            match cell {
                Cell::Integer(n) => {
                    worksheet.write_number(row_num, col, *n as f64)?;
                }
                Cell::Real(n) => {
                    worksheet.write_number(row_num, col, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(())
}

fn column(ix: usize) -> Res<u16> {
    u16::try_from(ix).context("Too many columns for one sheet")
}
