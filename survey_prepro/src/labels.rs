use log::{debug, info};

use std::collections::HashSet;

use crate::config::*;
use crate::detect::{CodeTextPair, SurveyLayout};
use crate::table::*;

/// Replaces codes by their labels, using the `(TEXT)` columns.
///
/// For every code/text pair:
/// * a multi-response option column is renamed after its option text (the first
/// recorded text value, skipping the skip label). Without any text, the column
/// keeps its name. Name clashes get a `_1`, `_2`, ... suffix;
/// * any other code column gets the text values in place of the codes.
///
/// The text column is then dropped: the output has exactly one column less per pair.
pub fn label_encode(table: &Table, id_column: &str, rules: &MissingRules) -> Table {
    let layout = SurveyLayout::detect(&table.column_names(), rules.scope, id_column);
    info!("label_encode: {:?}", layout.summary());

    let mut used: HashSet<String> = table.column_names().into_iter().map(String::from).collect();
    let mut res = table.clone();
    let (mut renamed, mut decoded) = (0, 0);
    for pair in layout.pairs.iter() {
        if layout.is_multi_response(&pair.code) {
            let label = option_label(&res, pair, &rules.skip_label);
            let name = unique_name(&label, &pair.code, &mut used);
            debug!("label_encode: rename {:?} -> {:?}", pair.code, name);
            res.rename_column(&pair.code, &name);
            renamed += 1;
        } else {
            let text_cells = res.column(&pair.text).map(|c| c.cells.clone());
            if let (Some(cells), Some(code_col)) = (text_cells, res.column_mut(&pair.code)) {
                code_col.cells = cells;
                decoded += 1;
            }
        }
        res.drop_column(&pair.text);
    }
    info!(
        "label_encode: {} option columns renamed, {} columns decoded",
        renamed, decoded
    );
    res
}

/// The first recorded option text of a pair, or the code column name.
fn option_label(table: &Table, pair: &CodeTextPair, skip_label: &str) -> String {
    table
        .column(&pair.text)
        .and_then(|col| {
            col.cells
                .iter()
                .filter_map(Cell::as_text)
                .map(|s| s.trim().to_string())
                .find(|s| !s.is_empty() && s != skip_label)
        })
        .unwrap_or_else(|| pair.code.clone())
}

/// Picks a name not in `used` and records it there.
///
/// A column may always keep its own name.
fn unique_name(label: &str, own_name: &str, used: &mut HashSet<String>) -> String {
    if label == own_name {
        return label.to_string();
    }
    let mut candidate = label.to_string();
    let mut idx = 1;
    while used.contains(&candidate) {
        candidate = format!("{}_{}", label, idx);
        idx += 1;
    }
    used.insert(candidate.clone());
    candidate
}
