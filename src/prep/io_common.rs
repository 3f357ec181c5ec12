use std::collections::HashSet;
use std::path::{Path, PathBuf};

use survey_prepro::builder::{parse_cell, TableBuilder};

use crate::prep::*;

/// Cell contents read as missing values.
pub const NA_TOKENS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "NULL", "null", "#N/A"];

/// The supported table formats.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    pub fn from_name(name: &str) -> Option<FileKind> {
        match name.trim().to_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(FileKind::Xlsx),
            "xls" => Some(FileKind::Xls),
            "csv" => Some(FileKind::Csv),
            _ => None,
        }
    }

    /// The explicit type if given, the extension of the file otherwise.
    pub fn detect(path: &Path, explicit: Option<&str>) -> SurveyResult<FileKind> {
        let name = match explicit {
            Some(x) => x.to_string(),
            None => path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
        };
        match FileKind::from_name(&name) {
            Some(k) => Ok(k),
            None => whatever!(
                "Cannot read {:?}: unsupported input type {:?} (expected xlsx, xls or csv)",
                path,
                name
            ),
        }
    }

    /// Spreadsheet exports carry the question texts on the first row.
    pub fn default_header_row(&self) -> usize {
        match self {
            FileKind::Xlsx | FileKind::Xls => 2,
            FileKind::Csv => 1,
        }
    }
}

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Relative paths of a configuration file are relative to its directory.
pub fn resolve_path(root: Option<&Path>, path: &str) -> PathBuf {
    let p = Path::new(path);
    match root {
        Some(r) if p.is_relative() => r.join(p),
        _ => p.to_path_buf(),
    }
}

/// `<stem>_codebook.csv` next to a CSV output.
pub fn codebook_csv_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    output.with_file_name(format!("{}_codebook.csv", stem))
}

/// Types a textual cell, with the usual markers for missing values.
pub fn parse_text_cell(s: &str) -> Cell {
    if NA_TOKENS.contains(&s.trim()) {
        Cell::Missing
    } else {
        parse_cell(s)
    }
}

/// Column names from a header row: empty cells become `Unnamed: <idx>` and
/// repeated names get a `.1`, `.2`, ... suffix.
pub fn header_names(header: &[Option<String>]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut res: Vec<String> = Vec::with_capacity(header.len());
    for (idx, name_o) in header.iter().enumerate() {
        let name = match name_o {
            Some(s) if !s.trim().is_empty() => s.clone(),
            _ => format!("Unnamed: {}", idx),
        };
        let mut candidate = name.clone();
        let mut count = 1;
        while used.contains(&candidate) {
            candidate = format!("{}.{}", name, count);
            count += 1;
        }
        if candidate != name {
            debug!("header_names: column {} renamed to {:?}", idx, candidate);
        }
        used.insert(candidate.clone());
        res.push(candidate);
    }
    res
}

/// Assembles the rows read below a header.
///
/// Short rows are padded with missing cells; rows where every cell is missing
/// are skipped.
pub fn assemble_table(
    path: &Path,
    header: &[Option<String>],
    rows: Vec<Vec<Cell>>,
) -> SurveyResult<Table> {
    let names = header_names(header);
    let mut builder = TableBuilder::new(&names).context(CoreSnafu {})?;
    let mut skipped = 0;
    for mut row in rows {
        if row.iter().all(Cell::is_missing) {
            skipped += 1;
            continue;
        }
        if row.len() < names.len() {
            row.resize(names.len(), Cell::Missing);
        }
        builder.add_row_2(row).context(CoreSnafu {})?;
    }
    if skipped > 0 {
        debug!(
            "assemble_table: {:?}: {} empty rows skipped",
            simplify_file_name(path),
            skipped
        );
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kinds() {
        assert_eq!(
            FileKind::detect(Path::new("a/raw.XLSX"), None).unwrap(),
            FileKind::Xlsx
        );
        assert_eq!(
            FileKind::detect(Path::new("raw.data"), Some("csv")).unwrap(),
            FileKind::Csv
        );
        assert!(FileKind::detect(Path::new("raw"), None).is_err());
        assert_eq!(FileKind::Xls.default_header_row(), 2);
    }

    #[test]
    fn missing_markers() {
        assert_eq!(parse_text_cell("NA"), Cell::Missing);
        assert_eq!(parse_text_cell(" #N/A "), Cell::Missing);
        assert_eq!(parse_text_cell("12"), Cell::Int(12));
        assert_eq!(parse_text_cell("n/a"), Cell::Text("n/a".to_string()));
    }

    #[test]
    fn header_names_are_unique() {
        let header = vec![
            Some("id".to_string()),
            None,
            Some("Q1".to_string()),
            Some("Q1".to_string()),
            Some(" ".to_string()),
            Some("Q1".to_string()),
        ];
        assert_eq!(
            header_names(&header),
            vec!["id", "Unnamed: 1", "Q1", "Q1.1", "Unnamed: 4", "Q1.2"]
        );
    }

    #[test]
    fn paths() {
        assert_eq!(
            resolve_path(Some(Path::new("/jobs")), "raw.csv"),
            PathBuf::from("/jobs/raw.csv")
        );
        assert_eq!(
            resolve_path(Some(Path::new("/jobs")), "/data/raw.csv"),
            PathBuf::from("/data/raw.csv")
        );
        assert_eq!(
            codebook_csv_path(Path::new("out/processed.csv")),
            PathBuf::from("out/processed_codebook.csv")
        );
    }

    #[test]
    fn rows_are_padded() {
        let header = vec![Some("a".to_string()), Some("b".to_string())];
        let rows = vec![vec![Cell::Int(1)], vec![Cell::Missing, Cell::Missing]];
        let t = assemble_table(Path::new("x.csv"), &header, rows).unwrap();
        assert_eq!(t.num_rows(), 1);
        assert_eq!(t.cell(0, "b"), Some(&Cell::Missing));

        let long = vec![vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]];
        assert!(assemble_table(Path::new("x.csv"), &header, long).is_err());
    }
}
