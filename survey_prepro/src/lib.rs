/*!
Pre-processing of raw survey exports.

Survey tools export one row per respondent and one column per item, with two
naming conventions that this crate relies on instead of a declared schema:
`X(TEXT)` holds the label of the code column `X`, and `Q_1`, `Q_2`, ... are the
options of the multi-response question `Q`. See the [`manual`] for details.

Four independent transformations are provided, each a pure function from a
borrowed [`Table`] to a new one:

* [`handle_missing`]: binarizes multi-response options and fills sparse categorical columns;
* [`add_weights`]: post-stratification weights against a population table;
* [`label_encode`]: replaces codes by labels and renames option columns;
* [`tidy_tables`] and [`build_codebook`]: long exports and the codebook.

[`run_pipeline`] runs a selection of them in the usual order.

```
use survey_prepro::builder::TableBuilder;
use survey_prepro::*;

let mut builder = TableBuilder::new(&["id", "Q1", "Q1(TEXT)"])?;
builder.add_row_simple(&["1001", "3", "Agree"])?;
let raw = builder.build();

let rules = PrepRules {
    id_column: "id".to_string(),
    ..PrepRules::default()
};
let out = run_pipeline(&raw, None, &rules)?;
assert_eq!(out.table.cell(0, "Q1"), Some(&Cell::from("Agree")));
# Ok::<(), PrepError>(())
```
*/

pub mod builder;
mod config;
pub mod detect;
pub mod manual;
mod missing;
mod pipeline;
mod labels;
mod table;
mod tidy;
mod weights;

pub use crate::config::*;
pub use crate::detect::{
    detect_multiresp, detect_pairs, CodeTextPair, LayoutSummary, MultiResponseGroup, SurveyLayout,
    TEXT_SUFFIX,
};
pub use crate::labels::label_encode;
pub use crate::missing::{handle_missing, is_categorical};
pub use crate::pipeline::{run_pipeline, PipelineOutput};
pub use crate::table::*;
pub use crate::tidy::{build_codebook, tidy_tables, ALL_TIDY, CODEBOOK_COLUMNS, TIDY_SUFFIX};
pub use crate::weights::{add_weights, strata_keys, StrataKey};
