// Primitives for reading CSV files.

use std::fs::File;
use std::path::Path;

use crate::prep::io_common::{assemble_table, parse_text_cell};
use crate::prep::*;

const BOM: char = '\u{feff}';

/// Reads a UTF-8 CSV file. The column names are on `header_row` (starting at 1),
/// the rows above it are ignored.
pub fn read_csv_table(path: &Path, header_row: usize) -> SurveyResult<Table> {
    let p = path.display().to_string();
    let mut records = get_records(path)?;

    // The index starts at 1 to respect most conventions in the excel world
    for _ in 1..header_row {
        _ = records.next();
    }
    let header_r = records.next().context(MissingHeaderRowSnafu {
        path: p.clone(),
        row: header_row,
    })?;
    let header_rec = header_r.context(CsvParseSnafu {
        path: p.clone(),
        lineno: header_row,
    })?;
    let header: Vec<Option<String>> = header_rec
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let s = if idx == 0 { s.trim_start_matches(BOM) } else { s };
            Some(s.to_string())
        })
        .collect();
    debug!("read_csv_table: header: {:?}", header);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + header_row + 1;
        let line = line_r.context(CsvParseSnafu {
            path: p.clone(),
            lineno,
        })?;
        let row: Vec<Cell> = line.iter().map(parse_text_cell).collect();
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, &row);
        rows.push(row);
    }
    assemble_table(path, &header, rows)
}

fn get_records(path: &Path) -> SurveyResult<csv::StringRecordsIntoIter<File>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.display().to_string(),
        })?;
    Ok(rdr.into_records())
}
