// ********* Shared constants ***********

use snafu::Snafu;

/// The label written into sparse categorical columns when a respondent skipped
/// the question ("skipped / not applicable").
pub const DEFAULT_SKIP_LABEL: &str = "스킵(해당 없음)";

/// Columns with at most this many distinct non-missing values are treated as
/// categorical and receive the skip label in place of missing values.
pub const DEFAULT_CATEGORICAL_THRESHOLD: usize = 20;

/// Label used in the codebook for binarized multi-response columns.
pub const SELECTED_LABEL: &str = "Selected";

pub const DEFAULT_ID_COLUMN: &str = "회원ID";
pub const DEFAULT_POPULATION_SHARE_COLUMN: &str = "pop_share";
pub const DEFAULT_WEIGHT_COLUMN: &str = "weight";

// ********* Configuration **********

/// Which columns are candidates for multi-response grouping.
///
/// - `PairedCodes` only considers code columns that have a `(TEXT)` partner.
/// A stray `age_group` / `age_band` pair of columns is not grouped.
///
/// - `AllCodes` considers every column that is neither a `(TEXT)` column nor the
/// respondent id. Use it for exports where multi-response items carry no text
/// columns at all.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum MultiResponseScope {
    #[default]
    PairedCodes,
    AllCodes,
}

/// What happens to a respondent whose stratum is absent from the population reference.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum UnmatchedStratumPolicy {
    /// The population share is taken as zero, so the weight is zero.
    #[default]
    Zero,
    /// The weight is left missing.
    Missing,
    /// The whole weighting step fails.
    Fail,
}

#[derive(PartialEq, Debug, Clone)]
pub struct MissingRules {
    pub skip_label: String,
    pub categorical_threshold: usize,
    pub scope: MultiResponseScope,
}

impl Default for MissingRules {
    fn default() -> Self {
        MissingRules {
            skip_label: DEFAULT_SKIP_LABEL.to_string(),
            categorical_threshold: DEFAULT_CATEGORICAL_THRESHOLD,
            scope: MultiResponseScope::PairedCodes,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct WeightRules {
    /// The stratification columns. They must exist in both the survey and the population table.
    pub strata: Vec<String>,
    pub population_share_column: String,
    pub weight_column: String,
    pub unmatched: UnmatchedStratumPolicy,
}

impl WeightRules {
    pub fn new(strata: &[&str]) -> WeightRules {
        WeightRules {
            strata: strata.iter().map(|s| s.to_string()).collect(),
            ..WeightRules::default()
        }
    }
}

impl Default for WeightRules {
    fn default() -> Self {
        WeightRules {
            strata: Vec::new(),
            population_share_column: DEFAULT_POPULATION_SHARE_COLUMN.to_string(),
            weight_column: DEFAULT_WEIGHT_COLUMN.to_string(),
            unmatched: UnmatchedStratumPolicy::Zero,
        }
    }
}

/// The stages to run. The order in which they run is fixed, see `pipeline`.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct PrepSteps {
    pub weights: bool,
    pub missing: bool,
    pub tidy: bool,
    pub labels: bool,
    pub codebook: bool,
}

impl PrepSteps {
    pub const DEFAULT_STEPS: PrepSteps = PrepSteps {
        weights: false,
        missing: true,
        tidy: false,
        labels: true,
        codebook: false,
    };
}

impl Default for PrepSteps {
    fn default() -> Self {
        PrepSteps::DEFAULT_STEPS
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct PrepRules {
    pub id_column: String,
    pub missing: MissingRules,
    pub weights: WeightRules,
    pub steps: PrepSteps,
}

impl Default for PrepRules {
    fn default() -> Self {
        PrepRules {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            missing: MissingRules::default(),
            weights: WeightRules::default(),
            steps: PrepSteps::default(),
        }
    }
}

// ********* Errors **********

/// Errors that prevent a transformation from running.
///
/// All of them are raised before any output table is produced.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PrepError {
    #[snafu(display("weighting requires at least one strata column"))]
    EmptyStrata {},

    #[snafu(display("strata column {column:?} is missing from the {table} table"))]
    MissingStrataColumn { column: String, table: String },

    #[snafu(display("population share column {column:?} is missing from the population table"))]
    MissingShareColumn { column: String },

    #[snafu(display("population share in row {row} is not numeric: {value:?}"))]
    NonNumericShare { row: usize, value: String },

    #[snafu(display("stratum {key} appears more than once in the population table"))]
    DuplicateStratum { key: String },

    #[snafu(display("stratum {key} has no entry in the population table"))]
    UnmatchedStratum { key: String },

    #[snafu(display("weighting was requested but no population table was provided"))]
    MissingPopulation {},

    #[snafu(display("respondent id column {column:?} is missing"))]
    MissingIdColumn { column: String },

    #[snafu(display("column {name:?} appears more than once"))]
    DuplicateColumn { name: String },

    #[snafu(display("column {name:?} has {found} cells, expected {expected}"))]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[snafu(display("row {row} has {found} cells, expected {expected}"))]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type PrepResult<T> = Result<T, PrepError>;
