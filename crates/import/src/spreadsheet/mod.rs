//! Excel workbooks. Only the first worksheet is read; it is flattened into a
//! string matrix so the layout detectors never touch calamine types.

mod generic;
mod sectioned;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use finflow_core::StagedTransaction;
use std::io::Cursor;
use tracing::debug;

use crate::error::ImportError;
use crate::rules::Categorizer;

pub use sectioned::is_sectioned_statement;

/// Row-major cell text of one worksheet. Row 0 is the sheet's first row even
/// when the used range starts further down.
pub type Matrix = Vec<Vec<String>>;

pub fn parse(
    data: &[u8],
    source: &str,
    categorizer: &Categorizer,
) -> Result<Vec<StagedTransaction>, ImportError> {
    let matrix = read_first_sheet(data)?;
    parse_matrix(&matrix, source, categorizer)
}

pub fn parse_matrix(
    matrix: &Matrix,
    source: &str,
    categorizer: &Categorizer,
) -> Result<Vec<StagedTransaction>, ImportError> {
    let rows = if is_sectioned_statement(matrix) {
        debug!(source, "sectioned card statement layout detected");
        sectioned::extract(matrix, source, categorizer)
    } else {
        generic::extract(matrix, source, categorizer)
    };

    debug!(source, rows = rows.len(), sheet_rows = matrix.len(), "parsed spreadsheet");
    if rows.is_empty() {
        return Err(ImportError::no_rows());
    }
    Ok(rows)
}

pub fn read_first_sheet(data: &[u8]) -> Result<Matrix, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyWorkbook)??;

    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or_default();

    let mut matrix: Matrix = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_text));
        matrix.push(cells);
    }
    Ok(matrix)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

pub(crate) fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

pub(crate) fn joined_lowercase(row: &[String]) -> String {
    row.iter()
        .map(|cell| cell.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
pub(crate) fn sheet(rows: &[&[&str]]) -> Matrix {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}
