use rust_xlsxwriter::{Workbook, Worksheet};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::prep::io_common::{codebook_csv_path, FileKind};
use crate::prep::*;

/// Spreadsheet programs need it to detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the processed table, as CSV or xlsx depending on the extension.
///
/// With a CSV output the codebook goes to its own `<stem>_codebook.csv` file,
/// with an xlsx output to a second sheet.
pub fn write_processed(
    path: &Path,
    table: &Table,
    codebook: Option<&Table>,
    codebook_sheet: &str,
) -> SurveyResult<()> {
    create_parent(path)?;
    match FileKind::detect(path, None)? {
        FileKind::Csv => {
            write_csv_file(path, table)?;
            if let Some(cb) = codebook {
                let cb_path = codebook_csv_path(path);
                write_csv_file(&cb_path, cb)?;
                info!("write_processed: codebook written to {:?}", cb_path);
            }
            Ok(())
        }
        FileKind::Xlsx => write_xlsx(path, table, codebook, codebook_sheet),
        FileKind::Xls => whatever!("Cannot write {:?}: the xls format is read-only", path),
    }
}

/// Writes each table as `<name>.csv` in a zip archive.
pub fn write_tidy_archive(path: &Path, tables: &[NamedTable]) -> SurveyResult<()> {
    let p = path.display().to_string();
    create_parent(path)?;
    let file = File::create(path).context(IoSnafu { path: p.clone() })?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
    for nt in tables.iter() {
        let name = format!("{}.csv", nt.name);
        debug!(
            "write_tidy_archive: {:?}: {} rows",
            name,
            nt.table.num_rows()
        );
        let mut buffer: Vec<u8> = Vec::new();
        write_csv(&mut buffer, &nt.table, &p)?;
        writer
            .start_file(name, options)
            .context(ZipSnafu { path: p.clone() })?;
        writer.write_all(&buffer).context(IoSnafu { path: p.clone() })?;
    }
    writer.finish().context(ZipSnafu { path: p })?;
    Ok(())
}

fn create_parent(path: &Path) -> SurveyResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).context(IoSnafu {
            path: dir.display().to_string(),
        }),
        _ => Ok(()),
    }
}

fn write_csv_file(path: &Path, table: &Table) -> SurveyResult<()> {
    let p = path.display().to_string();
    let file = File::create(path).context(IoSnafu { path: p.clone() })?;
    write_csv(file, table, &p)
}

/// UTF-8 with a byte order mark; missing cells are empty.
fn write_csv<W: Write>(mut out: W, table: &Table, path: &str) -> SurveyResult<()> {
    out.write_all(UTF8_BOM).context(IoSnafu { path })?;
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(table.column_names())
        .context(CsvWriteSnafu { path })?;
    for row in 0..table.num_rows() {
        let record: Vec<String> = table.row(row).iter().map(|c| c.to_string()).collect();
        wtr.write_record(&record).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(IoSnafu { path })?;
    Ok(())
}

fn write_xlsx(
    path: &Path,
    table: &Table,
    codebook: Option<&Table>,
    codebook_sheet: &str,
) -> SurveyResult<()> {
    let p = path.display().to_string();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet
        .set_name(PROCESSED_SHEET)
        .context(WritingXlsxSnafu { path: p.clone() })?;
    write_sheet(sheet, table, &p)?;

    if let Some(cb) = codebook {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(codebook_sheet)
            .context(WritingXlsxSnafu { path: p.clone() })?;
        write_sheet(sheet, cb, &p)?;
    }

    workbook
        .save(path)
        .context(WritingXlsxSnafu { path: p })?;
    Ok(())
}

fn write_sheet(sheet: &mut Worksheet, table: &Table, path: &str) -> SurveyResult<()> {
    for (idx, col) in table.columns().iter().enumerate() {
        let col_idx = match u16::try_from(idx) {
            Ok(x) => x,
            Err(_) => whatever!("Too many columns for a worksheet: {}", table.num_columns()),
        };
        sheet
            .write_string(0, col_idx, col.name.as_str())
            .context(WritingXlsxSnafu { path })?;
        for (row, cell) in col.cells.iter().enumerate() {
            let row_idx = match u32::try_from(row + 1) {
                Ok(x) => x,
                Err(_) => whatever!("Too many rows for a worksheet: {}", table.num_rows()),
            };
            match cell {
                Cell::Missing => {}
                Cell::Int(i) => {
                    sheet
                        .write_number(row_idx, col_idx, *i as f64)
                        .context(WritingXlsxSnafu { path })?;
                }
                Cell::Float(x) => {
                    sheet
                        .write_number(row_idx, col_idx, *x)
                        .context(WritingXlsxSnafu { path })?;
                }
                Cell::Text(s) => {
                    sheet
                        .write_string(row_idx, col_idx, s.as_str())
                        .context(WritingXlsxSnafu { path })?;
                }
            }
        }
    }
    Ok(())
}
