use clap::Parser;

/// This is a pre-processing program for survey exports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the job. Every option below overrides
    /// the corresponding entry of the configuration file.
    /// For more information about the file format, read the documentation of the survey_prepro crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The raw survey export.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx, xls or csv) The type of the input. If not specified, it is inferred from the
    /// extension of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default 2 for Excel files, 1 for CSV files) The row holding the column names, starting at 1.
    /// The rows above it are ignored.
    #[clap(long, value_parser)]
    pub header_row: Option<usize>,

    /// (default: the first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default 회원ID) The column holding the respondent identifier.
    #[clap(long, value_parser)]
    pub id_column: Option<String>,

    /// (file path, optional) A table of population shares, in the same formats as the input.
    /// If provided, a weight column is added.
    #[clap(short, long, value_parser)]
    pub population: Option<String>,

    /// (list of comma-separated values) The strata columns used for weighting. They must be
    /// present in both the input and the population file.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub strata: Option<Vec<String>>,

    /// (default pop_share) The column of the population file holding the shares.
    #[clap(long, value_parser)]
    pub population_share_column: Option<String>,

    /// If passed as an argument, missing values are left as they are.
    #[clap(long, takes_value = false)]
    pub no_missing: bool,

    /// If passed as an argument, codes are not replaced by their labels.
    #[clap(long, takes_value = false)]
    pub no_labels: bool,

    /// If passed as an argument, the long tables are written to the archive given by --tidy-out.
    #[clap(long, takes_value = false)]
    pub tidy: bool,

    /// If passed as an argument, the codebook is written along with the processed table.
    #[clap(long, takes_value = false)]
    pub codebook: bool,

    /// If passed as an argument, every column is considered when looking for multi-response
    /// questions, not only the columns that have a (TEXT) column.
    #[clap(long, takes_value = false)]
    pub all_columns_multi_response: bool,

    /// (file path, default processed.xlsx) The processed table, in xlsx or csv format
    /// depending on the extension.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, default tidy_outputs.zip) The zip archive of long tables.
    #[clap(long, value_parser)]
    pub tidy_out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
