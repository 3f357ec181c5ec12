use calamine::{open_workbook_auto, DataType, Range, Reader};
use std::path::Path;

use crate::prep::io_common::{assemble_table, parse_text_cell};
use crate::prep::*;

/// Reads a worksheet. The column names are on `header_row` (starting at 1),
/// the rows above it (usually the question texts) are ignored.
pub fn read_excel_table(
    path: &Path,
    header_row: usize,
    worksheet: Option<&str>,
) -> SurveyResult<Table> {
    let p = path.display().to_string();
    let wrange = get_range(path, worksheet)?;

    // The range starts at the first non-empty row of the sheet.
    let first_row = wrange.start().map(|(r, _)| r as usize).unwrap_or(0);
    let to_skip = header_row.saturating_sub(1).saturating_sub(first_row);
    debug!(
        "read_excel_table: range starts at row {}, skipping {} rows",
        first_row, to_skip
    );

    let mut iter = wrange.rows().skip(to_skip);
    let header_cells = iter.next().context(MissingHeaderRowSnafu {
        path: p,
        row: header_row,
    })?;
    let header: Vec<Option<String>> = header_cells.iter().map(header_name).collect();
    debug!("read_excel_table: header: {:?}", header);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cells: Vec<Cell> = row.iter().map(cell_from_excel).collect();
        debug!("read_excel_table: idx: {:?} row: {:?}", idx, &cells);
        rows.push(cells);
    }
    assemble_table(path, &header, rows)
}

fn get_range(path: &Path, worksheet: Option<&str>) -> SurveyResult<Range<DataType>> {
    let p = path.display().to_string();
    debug!("get_range: path: {:?} worksheet: {:?}", &p, &worksheet);
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path: p.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path: p.clone(),
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path: p })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path: p.clone() })?
            .context(OpeningExcelSnafu { path: p })?;
        Ok(wrange)
    }
}

/// Column names may be typed as numbers in the sheet.
fn header_name(dt: &DataType) -> Option<String> {
    match cell_from_excel(dt) {
        Cell::Missing => None,
        c => Some(c.to_string()),
    }
}

fn cell_from_excel(dt: &DataType) -> Cell {
    match dt {
        DataType::Empty => Cell::Missing,
        DataType::Int(i) => Cell::Int(*i),
        // Excel stores every number as a float.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Cell::Int(*f as i64),
        DataType::Float(f) => Cell::Float(*f),
        DataType::String(s) => match parse_text_cell(s) {
            Cell::Missing => Cell::Missing,
            _ => Cell::Text(s.clone()),
        },
        DataType::Bool(b) => Cell::Text(b.to_string()),
        // Serial date number.
        DataType::DateTime(f) => Cell::Float(*f),
        DataType::Error(e) => {
            debug!("cell_from_excel: error cell {:?} read as missing", e);
            Cell::Missing
        }
    }
}
