use log::{debug, info};

use crate::config::*;
use crate::detect::SurveyLayout;
use crate::table::*;

/// Normalizes missing values.
///
/// * Multi-response option columns become presence flags: `1` where a value
/// was recorded, `0` where it is missing. The original values are discarded.
/// * Every other column, except the respondent id, that looks categorical
/// (not a float column, at most `categorical_threshold` distinct values) gets
/// the skip label in place of its missing values.
///
/// Running it twice gives the same result as running it once.
pub fn handle_missing(table: &Table, id_column: &str, rules: &MissingRules) -> Table {
    let layout = SurveyLayout::detect(&table.column_names(), rules.scope, id_column);
    let multi = layout.multi_response_columns();
    info!(
        "handle_missing: {} rows, {:?}",
        table.num_rows(),
        layout.summary()
    );

    let mut res = table.clone();
    let mut binarized = 0;
    let mut filled = 0;
    for col in res.columns_mut() {
        if multi.contains(col.name.as_str()) {
            if is_presence_flags(col) {
                debug!("handle_missing: column {:?} already binarized", col.name);
            } else {
                binarize(col);
                binarized += 1;
            }
        } else if col.name != id_column && is_categorical(col, rules.categorical_threshold) {
            let n = fill_missing(col, &rules.skip_label);
            if n > 0 {
                debug!("handle_missing: column {:?}: filled {} cells", col.name, n);
                filled += 1;
            }
        } else {
            debug!(
                "handle_missing: column {:?} left as is ({:?})",
                col.name,
                col.kind()
            );
        }
    }
    info!(
        "handle_missing: {} columns binarized, {} columns filled with {:?}",
        binarized, filled, rules.skip_label
    );
    res
}

/// Textual or integral columns with few distinct values.
pub fn is_categorical(col: &Column, threshold: usize) -> bool {
    col.kind() != ColumnKind::Float && col.distinct_count() <= threshold
}

/// A complete column of `0`/`1` integers, as produced by `binarize`.
fn is_presence_flags(col: &Column) -> bool {
    col.cells
        .iter()
        .all(|c| matches!(c, Cell::Int(0) | Cell::Int(1)))
}

fn binarize(col: &mut Column) {
    for c in col.cells.iter_mut() {
        *c = Cell::Int(if c.is_present() { 1 } else { 0 });
    }
}

fn fill_missing(col: &mut Column, label: &str) -> usize {
    let mut n = 0;
    for c in col.cells.iter_mut().filter(|c| c.is_missing()) {
        *c = Cell::Text(label.to_string());
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;
    use proptest::prelude::*;

    fn survey() -> Table {
        let mut b =
            TableBuilder::new(&["id", "Q1", "Q1(TEXT)", "Q2_1", "Q2_1(TEXT)", "Q2_2", "Q2_2(TEXT)", "score"])
                .unwrap();
        b.add_row_simple(&["1001", "3", "Agree", "1", "Apple", "", "", "2.5"])
            .unwrap();
        b.add_row_simple(&["1002", "", "", "", "", "2", "Pear", ""])
            .unwrap();
        b.add_row_simple(&["", "1", "Disagree", "1", "Apple", "2", "Pear", "3.5"])
            .unwrap();
        b.build()
    }

    #[test]
    fn binarizes_multi_response_columns() {
        let res = handle_missing(&survey(), "id", &MissingRules::default());
        let q21: Vec<Cell> = res.column("Q2_1").unwrap().cells.clone();
        let q22: Vec<Cell> = res.column("Q2_2").unwrap().cells.clone();
        assert_eq!(q21, vec![Cell::Int(1), Cell::Int(0), Cell::Int(1)]);
        assert_eq!(q22, vec![Cell::Int(0), Cell::Int(1), Cell::Int(1)]);
    }

    #[test]
    fn fills_categorical_columns_only() {
        let res = handle_missing(&survey(), "id", &MissingRules::default());
        let skip = Cell::Text(DEFAULT_SKIP_LABEL.to_string());
        assert_eq!(res.cell(1, "Q1"), Some(&skip));
        assert_eq!(res.cell(1, "Q1(TEXT)"), Some(&skip));
        assert_eq!(res.cell(0, "Q2_2(TEXT)"), Some(&skip));
        // Float column untouched.
        assert_eq!(res.cell(1, "score"), Some(&Cell::Missing));
        // The id column is never filled.
        assert_eq!(res.cell(2, "id"), Some(&Cell::Missing));
        // The input is not modified.
        assert_eq!(survey().cell(1, "Q1"), Some(&Cell::Missing));
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut b = TableBuilder::new(&["id", "open"]).unwrap();
        for i in 0..3 {
            b.add_row_simple(&[i.to_string(), format!("answer {}", i)]).unwrap();
        }
        b.add_row_simple(&["9", ""]).unwrap();
        let t = b.build();

        let rules = |threshold| MissingRules {
            categorical_threshold: threshold,
            ..MissingRules::default()
        };
        let at = handle_missing(&t, "id", &rules(3));
        assert_eq!(
            at.cell(3, "open"),
            Some(&Cell::Text(DEFAULT_SKIP_LABEL.to_string()))
        );
        let below = handle_missing(&t, "id", &rules(2));
        assert_eq!(below.cell(3, "open"), Some(&Cell::Missing));
    }

    #[test]
    fn flags_are_not_binarized_again() {
        let once = handle_missing(&survey(), "id", &MissingRules::default());
        assert_eq!(once.cell(1, "Q2_1"), Some(&Cell::Int(0)));
        let twice = handle_missing(&once, "id", &MissingRules::default());
        assert_eq!(twice.cell(1, "Q2_1"), Some(&Cell::Int(0)));
    }

    #[test]
    fn all_missing_column_gets_the_label() {
        let mut b = TableBuilder::new(&["id", "empty"]).unwrap();
        b.add_row_simple(&["1", ""]).unwrap();
        b.add_row_simple(&["2", ""]).unwrap();
        let res = handle_missing(&b.build(), "id", &MissingRules::default());
        assert_eq!(res.column("empty").unwrap().missing_count(), 0);
    }

    #[test]
    fn all_codes_scope_binarizes_unpaired_groups() {
        let mut b = TableBuilder::new(&["id", "Q2_1", "Q2_2"]).unwrap();
        b.add_row_simple(&["1001", "x", ""]).unwrap();
        let t = b.build();
        let paired = handle_missing(&t, "id", &MissingRules::default());
        assert_eq!(paired.cell(0, "Q2_1"), Some(&Cell::Text("x".to_string())));

        let rules = MissingRules {
            scope: MultiResponseScope::AllCodes,
            ..MissingRules::default()
        };
        let all = handle_missing(&t, "id", &rules);
        assert_eq!(all.cell(0, "Q2_1"), Some(&Cell::Int(1)));
        assert_eq!(all.cell(0, "Q2_2"), Some(&Cell::Int(0)));
    }

    #[test]
    fn idempotent_on_sample() {
        let once = handle_missing(&survey(), "id", &MissingRules::default());
        let twice = handle_missing(&once, "id", &MissingRules::default());
        assert_eq!(once, twice);
    }

    fn cell_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            (0i64..30).prop_map(|i| i.to_string()),
            (0i64..30).prop_map(|i| format!("{}.5", i)),
            "[a-d]{1,2}",
        ]
    }

    proptest! {
        #[test]
        fn idempotent(rows in prop::collection::vec(prop::collection::vec(cell_strategy(), 5), 0..40)) {
            let mut b = TableBuilder::new(&["id", "A_1", "A_1(TEXT)", "A_2", "A_2(TEXT)"]).unwrap();
            for r in rows.iter() {
                b.add_row_simple(r.as_slice()).unwrap();
            }
            let t = b.build();
            let rules = MissingRules::default();
            let once = handle_missing(&t, "id", &rules);
            let twice = handle_missing(&once, "id", &rules);
            prop_assert_eq!(once, twice);
        }
    }
}
