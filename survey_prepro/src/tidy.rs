//! Long ("tidy") exports and the codebook.

use log::{debug, info};
use snafu::ensure;

use std::collections::HashSet;

use crate::config::*;
use crate::detect::SurveyLayout;
use crate::table::*;

/// Name of the table that stacks every code/text pair.
pub const ALL_TIDY: &str = "all_tidy";
pub const TIDY_SUFFIX: &str = "_tidy";

pub const OPTION_COLUMN: &str = "option";
pub const CODE_VALUE_COLUMN: &str = "code_value";
pub const OPTION_TEXT_COLUMN: &str = "option_text";

pub const CODEBOOK_COLUMNS: [&str; 3] = ["variable", "code", "label"];

/// Reshapes coded columns into long tables of `(id, option, code_value, option_text)`.
///
/// There is one row per respondent and code column where the code is recorded.
/// The result holds `all_tidy` (every code/text pair) followed by one
/// `<prefix>_tidy` table per multi-response group. Tables without rows are left out.
pub fn tidy_tables(
    table: &Table,
    id_column: &str,
    rules: &MissingRules,
) -> PrepResult<Vec<NamedTable>> {
    ensure!(
        table.has_column(id_column),
        MissingIdColumnSnafu { column: id_column }
    );
    let layout = SurveyLayout::detect(&table.column_names(), rules.scope, id_column);

    let mut res: Vec<NamedTable> = Vec::new();

    let mut pair_tables: Vec<Table> = Vec::new();
    for pair in layout.pairs.iter() {
        pair_tables.push(long_table(table, id_column, &pair.code, Some(&pair.text))?);
    }
    push_non_empty(&mut res, ALL_TIDY.to_string(), Table::concat(&pair_tables));

    for group in layout.groups.iter() {
        let mut frames: Vec<Table> = Vec::new();
        for member in group.members.iter() {
            frames.push(long_table(
                table,
                id_column,
                member,
                layout.text_for(member),
            )?);
        }
        push_non_empty(
            &mut res,
            format!("{}{}", group.prefix, TIDY_SUFFIX),
            Table::concat(&frames),
        );
    }
    info!(
        "tidy_tables: {} tables: {:?}",
        res.len(),
        res.iter()
            .map(|nt| (nt.name.as_str(), nt.table.num_rows()))
            .collect::<Vec<_>>()
    );
    Ok(res)
}

fn push_non_empty(res: &mut Vec<NamedTable>, name: String, table: Table) {
    if table.num_rows() > 0 {
        res.push(NamedTable { name, table });
    } else {
        debug!("tidy_tables: {:?} has no rows, skipped", name);
    }
}

fn long_table(
    table: &Table,
    id_column: &str,
    code_column: &str,
    text_column: Option<&str>,
) -> PrepResult<Table> {
    let ids = table.column(id_column).map(|c| c.cells.as_slice()).unwrap_or(&[]);
    let codes = table
        .column(code_column)
        .map(|c| c.cells.as_slice())
        .unwrap_or(&[]);
    let texts = text_column.and_then(|t| table.column(t)).map(|c| &c.cells);

    let (mut id_cells, mut option_cells, mut code_cells, mut text_cells) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for (row, code) in codes.iter().enumerate() {
        if code.is_missing() {
            continue;
        }
        id_cells.push(ids.get(row).cloned().unwrap_or_default());
        option_cells.push(Cell::from(code_column));
        code_cells.push(code.clone());
        text_cells.push(
            texts
                .and_then(|t| t.get(row))
                .cloned()
                .unwrap_or_default(),
        );
    }
    Table::new(vec![
        Column::new(id_column, id_cells),
        Column::new(OPTION_COLUMN, option_cells),
        Column::new(CODE_VALUE_COLUMN, code_cells),
        Column::new(OPTION_TEXT_COLUMN, text_cells),
    ])
}

/// Builds the `(variable, code, label)` codebook.
///
/// Expects the table as loaded, before any decoding: every distinct recorded
/// `(code, text)` combination of a pair gives one entry, in order of first
/// appearance. Multi-response columns without a text column get a single
/// `(column, 1, "Selected")` entry, which is what they mean once binarized.
pub fn build_codebook(table: &Table, id_column: &str, rules: &MissingRules) -> Table {
    let layout = SurveyLayout::detect(&table.column_names(), rules.scope, id_column);

    let (mut variables, mut codes, mut labels) = (Vec::new(), Vec::new(), Vec::new());
    for pair in layout.pairs.iter() {
        let (code_col, text_col) = match (table.column(&pair.code), table.column(&pair.text)) {
            (Some(c), Some(t)) => (c, t),
            _ => continue,
        };
        let mut seen: HashSet<(CellKey, CellKey)> = HashSet::new();
        for (code, text) in code_col.cells.iter().zip(text_col.cells.iter()) {
            if code.is_missing() || text.is_missing() {
                continue;
            }
            if seen.insert((code.key(), text.key())) {
                variables.push(Cell::from(pair.code.as_str()));
                codes.push(code.clone());
                labels.push(text.clone());
            }
        }
    }

    let mut synthetic = 0;
    for group in layout.groups.iter() {
        for member in group.members.iter() {
            if layout.text_for(member).is_none() {
                variables.push(Cell::from(member.as_str()));
                codes.push(Cell::Int(1));
                labels.push(Cell::from(SELECTED_LABEL));
                synthetic += 1;
            }
        }
    }
    info!(
        "build_codebook: {} entries ({} for binarized options)",
        variables.len(),
        synthetic
    );

    let [variable, code, label] = CODEBOOK_COLUMNS;
    // Three distinct names of equal length.
    Table::new(vec![
        Column::new(variable, variables),
        Column::new(code, codes),
        Column::new(label, labels),
    ])
    .unwrap_or_default()
}
