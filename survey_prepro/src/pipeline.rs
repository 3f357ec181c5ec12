use log::{info, warn};
use snafu::{ensure, OptionExt};

use crate::config::*;
use crate::detect::{LayoutSummary, SurveyLayout};
use crate::labels::label_encode;
use crate::missing::handle_missing;
use crate::table::*;
use crate::tidy::{build_codebook, tidy_tables};
use crate::weights::add_weights;

#[derive(PartialEq, Debug, Clone)]
pub struct PipelineOutput {
    /// The processed survey table.
    pub table: Table,
    /// Long tables, empty unless the tidy step ran.
    pub tidy: Vec<NamedTable>,
    pub codebook: Option<Table>,
    /// What was detected on the input table.
    pub layout: LayoutSummary,
}

/// Runs the selected steps over a survey table.
///
/// The order is fixed: weights, missing values, then the long tables from a
/// snapshot of the table at that point, then label decoding. The codebook is
/// always built from `raw`, so it carries the original codes.
///
/// Configuration problems are reported before any step runs.
pub fn run_pipeline(
    raw: &Table,
    population: Option<&Table>,
    rules: &PrepRules,
) -> PrepResult<PipelineOutput> {
    let steps = rules.steps;
    let id = rules.id_column.as_str();
    info!(
        "run_pipeline: {} rows, {} columns, steps: {:?}",
        raw.num_rows(),
        raw.num_columns(),
        steps
    );

    let population = if steps.weights {
        Some(population.context(MissingPopulationSnafu {})?)
    } else {
        None
    };
    if steps.tidy {
        ensure!(raw.has_column(id), MissingIdColumnSnafu { column: id });
    }

    let layout =
        SurveyLayout::detect(&raw.column_names(), rules.missing.scope, id).summary();
    info!("run_pipeline: detected {:?}", layout);
    if layout.pairs == 0 && layout.groups == 0 {
        warn!(
            "run_pipeline: no {} columns and no multi-response groups found, \
             only categorical missing values will change",
            crate::detect::TEXT_SUFFIX
        );
    }

    let mut cur: Table = raw.clone();
    if let Some(pop) = population {
        cur = add_weights(&cur, pop, &rules.weights)?;
    }
    if steps.missing {
        cur = handle_missing(&cur, id, &rules.missing);
    }

    let tidy = if steps.tidy {
        tidy_tables(&cur, id, &rules.missing)?
    } else {
        Vec::new()
    };
    if steps.tidy && tidy.is_empty() {
        warn!("run_pipeline: the tidy export has no rows");
    }

    let codebook = if steps.codebook {
        let cb = build_codebook(raw, id, &rules.missing);
        if cb.num_rows() == 0 {
            warn!("run_pipeline: the codebook is empty, it will not be written");
            None
        } else {
            Some(cb)
        }
    } else {
        None
    };

    if steps.labels {
        cur = label_encode(&cur, id, &rules.missing);
    }

    Ok(PipelineOutput {
        table: cur,
        tidy,
        codebook,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn survey() -> Table {
        let mut b = TableBuilder::new(&[
            "id", "region", "Q1", "Q1(TEXT)", "Q2_1", "Q2_1(TEXT)", "Q2_2", "Q2_2(TEXT)",
        ])
        .unwrap();
        b.add_row_simple(&["1", "A", "3", "Agree", "1", "Apple", "", ""])
            .unwrap();
        b.add_row_simple(&["2", "B", "", "", "1", "Apple", "2", "Pear"])
            .unwrap();
        b.build()
    }

    fn population() -> Table {
        let mut b = TableBuilder::new(&["region", "pop_share"]).unwrap();
        b.add_row_simple(&["A", "0.3"]).unwrap();
        b.add_row_simple(&["B", "0.7"]).unwrap();
        b.build()
    }

    fn all_steps() -> PrepRules {
        PrepRules {
            id_column: "id".to_string(),
            weights: WeightRules::new(&["region"]),
            steps: PrepSteps {
                weights: true,
                missing: true,
                tidy: true,
                labels: true,
                codebook: true,
            },
            ..PrepRules::default()
        }
    }

    #[test]
    fn full_run() {
        init();
        let raw = survey();
        let out = run_pipeline(&raw, Some(&population()), &all_steps()).unwrap();
        assert_eq!(
            out.table.column_names(),
            vec!["id", "region", "Q1", "Apple", "Pear", "weight"]
        );
        assert_eq!(out.table.cell(0, "Q1"), Some(&Cell::from("Agree")));
        assert_eq!(out.table.cell(0, "Pear"), Some(&Cell::Int(0)));
        assert_eq!(out.table.cell(1, "weight"), Some(&Cell::Float(1.4)));
        assert_eq!(
            out.layout,
            LayoutSummary {
                pairs: 3,
                groups: 1,
                multi_response_columns: 2
            }
        );

        // Long tables come from the table before decoding.
        assert_eq!(out.tidy[0].name, "all_tidy");
        assert_eq!(out.tidy[1].name, "Q2_tidy");
        assert!(out.tidy[0].table.column("option").is_some());

        // The codebook keeps the raw codes.
        let cb = out.codebook.unwrap();
        assert_eq!(cb.row(0), vec![&Cell::from("Q1"), &Cell::Int(3), &Cell::from("Agree")]);

        // The input is untouched.
        assert_eq!(raw, survey());
    }

    #[test]
    fn weights_need_a_population() {
        let err = run_pipeline(&survey(), None, &all_steps()).unwrap_err();
        assert!(matches!(err, PrepError::MissingPopulation {}));
    }

    #[test]
    fn tidy_needs_the_id_column() {
        let mut rules = all_steps();
        rules.id_column = "respondent".to_string();
        let err = run_pipeline(&survey(), Some(&population()), &rules).unwrap_err();
        assert!(matches!(err, PrepError::MissingIdColumn { .. }));
    }

    #[test]
    fn default_steps() {
        init();
        let rules = PrepRules {
            id_column: "id".to_string(),
            ..PrepRules::default()
        };
        let out = run_pipeline(&survey(), None, &rules).unwrap();
        assert!(out.tidy.is_empty());
        assert!(out.codebook.is_none());
        assert!(!out.table.has_column("weight"));
        assert_eq!(
            out.table.cell(1, "Q1"),
            Some(&Cell::from(DEFAULT_SKIP_LABEL))
        );
    }
}
