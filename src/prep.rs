use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_prepro::*;

use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::prep::config_reader::*;
use crate::prep::io_common::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_output;

pub const DEFAULT_OUTPUT_PATH: &str = "processed.xlsx";
pub const DEFAULT_TIDY_ARCHIVE_PATH: &str = "tidy_outputs.zip";
pub const DEFAULT_CODEBOOK_SHEET: &str = "codebook";
pub const PROCESSED_SHEET: &str = "processed";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("{path} has no row {row} to read the column names from"))]
    MissingHeaderRow { path: String, row: usize },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error reading the configuration {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingXlsx {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing the archive {path}"))]
    Zip {
        source: zip::result::ZipError,
        path: String,
    },
    #[snafu(display("I/O error on {path}"))]
    Io {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    Core { source: PrepError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Everything needed for one run, after merging the configuration file and
/// the command line.
#[derive(PartialEq, Debug, Clone)]
pub struct PrepJob {
    pub input: PathBuf,
    pub input_kind: FileKind,
    pub header_row: usize,
    pub worksheet: Option<String>,
    pub population: Option<PathBuf>,
    pub output: PathBuf,
    pub tidy_archive: PathBuf,
    pub codebook_sheet: String,
    pub rules: PrepRules,
}

fn validate_scope(s: &str) -> SurveyResult<MultiResponseScope> {
    let res = match s {
        "pairedCodes" => MultiResponseScope::PairedCodes,
        "allCodes" => MultiResponseScope::AllCodes,
        x => whatever!(
            "Failed to understand multiResponseScope option {:?}: expected pairedCodes or allCodes",
            x
        ),
    };
    Ok(res)
}

fn validate_unmatched(s: &str) -> SurveyResult<UnmatchedStratumPolicy> {
    let res = match s {
        "zero" => UnmatchedStratumPolicy::Zero,
        "missing" => UnmatchedStratumPolicy::Missing,
        "fail" => UnmatchedStratumPolicy::Fail,
        x => whatever!(
            "Failed to understand unmatchedStratum option {:?}: expected zero, missing or fail",
            x
        ),
    };
    Ok(res)
}

/// Merges the configuration file (if any) with the command line arguments.
/// The command line wins.
pub fn build_job(args: &Args) -> SurveyResult<PrepJob> {
    let (config, root) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p).parent().map(Path::to_path_buf);
            (config, root)
        }
        None => (JobConfig::default(), None),
    };
    let root_p = root.as_deref();
    debug!("build_job: config: {:?} root: {:?}", config, root_p);

    let input_s = config.input_settings.clone().unwrap_or_default();
    let weighting = config.weighting.clone().unwrap_or_default();
    let steps_s = config.steps.clone().unwrap_or_default();
    let rules_s = config.rules.clone().unwrap_or_default();
    let output_s = config.output_settings.clone().unwrap_or_default();

    // Command line paths are taken as given, configuration paths relative to the file.
    let input: PathBuf = match (&args.input, &input_s.file_path) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => resolve_path(root_p, p),
        (None, None) => whatever!("No input file: use --input or inputSettings.filePath"),
    };
    let provider = args.input_type.clone().or_else(|| input_s.provider.clone());
    let input_kind = FileKind::detect(&input, provider.as_deref())?;
    let header_row = match args.header_row {
        Some(x) => x,
        None => input_s
            .header_row_index()?
            .unwrap_or_else(|| input_kind.default_header_row()),
    };
    ensure_whatever!(header_row >= 1, "The header row starts at 1, got {}", header_row);

    let population: Option<PathBuf> = match (&args.population, &weighting.population_file_path) {
        (Some(p), _) => Some(PathBuf::from(p)),
        (None, Some(p)) => Some(resolve_path(root_p, p)),
        (None, None) => None,
    };

    let mut rules = PrepRules::default();
    if let Some(id) = args.id_column.clone().or_else(|| input_s.id_column.clone()) {
        rules.id_column = id;
    }

    if let Some(label) = rules_s.skip_label.clone() {
        rules.missing.skip_label = label;
    }
    if let Some(threshold) = rules_s.categorical_threshold {
        rules.missing.categorical_threshold = threshold;
    }
    rules.missing.scope = if args.all_columns_multi_response {
        MultiResponseScope::AllCodes
    } else {
        match &rules_s.multi_response_scope {
            Some(s) => validate_scope(s)?,
            None => MultiResponseScope::default(),
        }
    };

    rules.weights.strata = args
        .strata
        .clone()
        .or_else(|| weighting.strata.clone())
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if let Some(col) = args
        .population_share_column
        .clone()
        .or_else(|| weighting.population_share_column.clone())
    {
        rules.weights.population_share_column = col;
    }
    if let Some(col) = weighting.weight_column.clone() {
        rules.weights.weight_column = col;
    }
    if let Some(s) = &weighting.unmatched_stratum {
        rules.weights.unmatched = validate_unmatched(s)?;
    }

    let defaults = PrepSteps::default();
    rules.steps = PrepSteps {
        // Strata without a population file is reported by the pipeline.
        weights: population.is_some() || !rules.weights.strata.is_empty(),
        missing: !args.no_missing && steps_s.handle_missing.unwrap_or(defaults.missing),
        tidy: args.tidy || steps_s.tidy_export.unwrap_or(defaults.tidy),
        labels: !args.no_labels && steps_s.label_encode.unwrap_or(defaults.labels),
        codebook: args.codebook || steps_s.codebook.unwrap_or(defaults.codebook),
    };

    let output = match (&args.out, &output_s.output_path) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => resolve_path(root_p, p),
        (None, None) => PathBuf::from(DEFAULT_OUTPUT_PATH),
    };
    let tidy_archive = match (&args.tidy_out, &output_s.tidy_archive_path) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => resolve_path(root_p, p),
        (None, None) => PathBuf::from(DEFAULT_TIDY_ARCHIVE_PATH),
    };

    Ok(PrepJob {
        input,
        input_kind,
        header_row,
        worksheet: args
            .excel_worksheet_name
            .clone()
            .or_else(|| input_s.excel_worksheet_name.clone()),
        population,
        output,
        tidy_archive,
        codebook_sheet: output_s
            .codebook_sheet_name
            .clone()
            .unwrap_or_else(|| DEFAULT_CODEBOOK_SHEET.to_string()),
        rules,
    })
}

/// Reads a table in any of the supported formats.
pub fn read_table(
    path: &Path,
    kind: FileKind,
    header_row: usize,
    worksheet: Option<&str>,
) -> SurveyResult<Table> {
    info!(
        "read_table: reading {:?} as {:?}, header on row {}",
        path, kind, header_row
    );
    let table = match kind {
        FileKind::Xlsx | FileKind::Xls => io_excel::read_excel_table(path, header_row, worksheet)?,
        FileKind::Csv => io_csv::read_csv_table(path, header_row)?,
    };
    info!(
        "read_table: {:?}: {} rows, {} columns",
        simplify_file_name(path),
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

pub fn run_job(job: &PrepJob) -> SurveyResult<PipelineOutput> {
    let raw = read_table(
        &job.input,
        job.input_kind,
        job.header_row,
        job.worksheet.as_deref(),
    )?;
    // Reference tables have no question row above the header.
    let population = match &job.population {
        Some(p) => Some(read_table(p, FileKind::detect(p, None)?, 1, None)?),
        None => None,
    };

    let out = run_pipeline(&raw, population.as_ref(), &job.rules).context(CoreSnafu {})?;

    io_output::write_processed(
        &job.output,
        &out.table,
        out.codebook.as_ref(),
        &job.codebook_sheet,
    )?;
    info!("run_job: wrote {:?}", job.output);

    if job.rules.steps.tidy {
        if out.tidy.is_empty() {
            warn!(
                "run_job: no long table to export, {:?} is not written",
                job.tidy_archive
            );
        } else {
            io_output::write_tidy_archive(&job.tidy_archive, &out.tidy)?;
            info!(
                "run_job: wrote {} tables to {:?}",
                out.tidy.len(),
                job.tidy_archive
            );
        }
    }
    Ok(out)
}

pub fn run_prep(args: &Args) -> SurveyResult<()> {
    let job = build_job(args)?;
    info!("run_prep: job: {:?}", job);
    let out = run_job(&job)?;
    info!(
        "run_prep: done: {} rows, {} columns, {:?}",
        out.table.num_rows(),
        out.table.num_columns(),
        out.layout
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::io::Read;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const SURVEY_CSV: &str = "\u{feff}id,region,Q1,Q1(TEXT),Q2_1,Q2_1(TEXT),Q2_2,Q2_2(TEXT)\n\
        1,A,3,Agree,1,Apple,,\n\
        2,B,,,1,Apple,2,Pear\n\
        3,Z,1,Disagree,,,2,Pear\n";

    const POPULATION_CSV: &str = "region,pop_share\nA,0.6\nB,0.4\n";

    fn args(v: &[&str]) -> Args {
        let mut all = vec!["surveyprep"];
        all.extend_from_slice(v);
        Args::parse_from(all)
    }

    fn path_str(dir: &Path, name: &str) -> String {
        dir.join(name).display().to_string()
    }

    #[test]
    fn csv_end_to_end() {
        init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY_CSV).unwrap();
        fs::write(dir.path().join("population.csv"), POPULATION_CSV).unwrap();

        let a = args(&[
            "--input",
            &path_str(dir.path(), "survey.csv"),
            "--id-column",
            "id",
            "--population",
            &path_str(dir.path(), "population.csv"),
            "--strata",
            "region",
            "--tidy",
            "--codebook",
            "--out",
            &path_str(dir.path(), "processed.csv"),
            "--tidy-out",
            &path_str(dir.path(), "tidy.zip"),
        ]);
        run_prep(&a).unwrap();

        let processed = fs::read_to_string(dir.path().join("processed.csv")).unwrap();
        assert!(processed.starts_with('\u{feff}'));
        let mut lines = processed.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next(), Some("id,region,Q1,Apple,Pear,weight"));
        // Region A is a third of the sample and 60% of the population.
        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first[..5], ["1", "A", "Agree", "1", "0"]);
        assert!((first[5].parse::<f64>().unwrap() - 1.8).abs() < 1e-9);
        // Region Z is not in the population table.
        assert_eq!(lines.nth(1), Some("3,Z,Disagree,0,1,0"));

        let codebook = fs::read_to_string(dir.path().join("processed_codebook.csv")).unwrap();
        assert!(codebook.contains("variable,code,label"));
        assert!(codebook.contains("Q1,3,Agree"));

        let file = fs::File::open(dir.path().join("tidy.zip")).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["Q2_tidy.csv", "all_tidy.csv"]);
        let mut all_tidy = String::new();
        archive
            .by_name("all_tidy.csv")
            .unwrap()
            .read_to_string(&mut all_tidy)
            .unwrap();
        assert!(all_tidy.starts_with("\u{feff}id,option,code_value,option_text"));
    }

    #[test]
    fn xlsx_output_has_two_sheets() {
        init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY_CSV).unwrap();
        let out = dir.path().join("processed.xlsx");
        let a = args(&[
            "--input",
            &path_str(dir.path(), "survey.csv"),
            "--id-column",
            "id",
            "--codebook",
            "--out",
            &out.display().to_string(),
        ]);
        run_prep(&a).unwrap();

        use calamine::Reader;
        let mut workbook = calamine::open_workbook_auto(&out).unwrap();
        assert_eq!(
            workbook.sheet_names().to_vec(),
            vec![PROCESSED_SHEET.to_string(), DEFAULT_CODEBOOK_SHEET.to_string()]
        );
        let processed = workbook.worksheet_range(PROCESSED_SHEET).unwrap().unwrap();
        // Header plus three respondents.
        assert_eq!(processed.height(), 4);
        assert_eq!(
            processed.get_value((0, 2)),
            Some(&calamine::DataType::String("Q1".to_string()))
        );
        assert_eq!(
            processed.get_value((1, 2)),
            Some(&calamine::DataType::String("Agree".to_string()))
        );
    }

    #[test]
    fn configuration_file_and_overrides() {
        init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY_CSV).unwrap();
        let config = r#"{
            "inputSettings": { "filePath": "survey.csv", "idColumn": "id", "headerRowIndex": "1" },
            "weighting": { "populationFilePath": "population.csv", "strata": ["region"], "unmatchedStratum": "missing" },
            "steps": { "labelEncode": false, "tidyExport": true },
            "rules": { "skipLabel": "n/a", "multiResponseScope": "allCodes" },
            "outputSettings": { "outputPath": "out/processed.csv" }
        }"#;
        let config_path = path_str(dir.path(), "job.json");
        fs::write(&config_path, config).unwrap();

        let job = build_job(&args(&["--config", &config_path, "--no-missing"])).unwrap();
        assert_eq!(job.input, dir.path().join("survey.csv"));
        assert_eq!(job.input_kind, FileKind::Csv);
        assert_eq!(job.header_row, 1);
        assert_eq!(job.population, Some(dir.path().join("population.csv")));
        assert_eq!(job.output, dir.path().join("out/processed.csv"));
        assert_eq!(job.tidy_archive, PathBuf::from(DEFAULT_TIDY_ARCHIVE_PATH));
        assert_eq!(job.rules.id_column, "id");
        assert_eq!(job.rules.missing.skip_label, "n/a");
        assert_eq!(job.rules.missing.scope, MultiResponseScope::AllCodes);
        assert_eq!(job.rules.weights.strata, vec!["region".to_string()]);
        assert_eq!(job.rules.weights.unmatched, UnmatchedStratumPolicy::Missing);
        assert_eq!(
            job.rules.steps,
            PrepSteps {
                weights: true,
                missing: false,
                tidy: true,
                labels: false,
                codebook: false,
            }
        );

        let job = build_job(&args(&["--config", &config_path, "--input", "other.xlsx"])).unwrap();
        assert_eq!(job.input, PathBuf::from("other.xlsx"));
        assert_eq!(job.input_kind, FileKind::Xlsx);
        // The configured header row still applies.
        assert_eq!(job.header_row, 1);
    }

    #[test]
    fn default_job() {
        let job = build_job(&args(&["--input", "raw.xlsx"])).unwrap();
        assert_eq!(job.header_row, 2);
        assert_eq!(job.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(job.rules.id_column, DEFAULT_ID_COLUMN);
        assert_eq!(job.rules.steps, PrepSteps::default());

        let job = build_job(&args(&["--input", "raw.csv", "--strata", "sex,age"])).unwrap();
        assert_eq!(job.header_row, 1);
        assert_eq!(job.rules.weights.strata, vec!["sex", "age"]);
        assert!(job.rules.steps.weights);
    }

    #[test]
    fn bad_configurations() {
        assert!(build_job(&args(&[])).is_err());
        assert!(build_job(&args(&["--input", "raw.txt"])).is_err());
        assert!(build_job(&args(&["--input", "raw.xlsx", "--header-row", "0"])).is_err());

        let dir = tempfile::tempdir().unwrap();
        let config_path = path_str(dir.path(), "job.json");
        fs::write(
            &config_path,
            r#"{ "inputSettings": { "filePath": "a.csv" }, "rules": { "multiResponseScope": "some" } }"#,
        )
        .unwrap();
        assert!(build_job(&args(&["--config", &config_path])).is_err());

        fs::write(&config_path, "{ not json").unwrap();
        let err = build_job(&args(&["--config", &config_path])).unwrap_err();
        assert!(matches!(err, SurveyError::ParsingJson { .. }));
    }

    #[test]
    fn strata_without_population_fail_before_writing() {
        init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY_CSV).unwrap();
        let out = dir.path().join("processed.csv");
        let a = args(&[
            "--input",
            &path_str(dir.path(), "survey.csv"),
            "--id-column",
            "id",
            "--strata",
            "region",
            "--out",
            &out.display().to_string(),
        ]);
        let err = run_prep(&a).unwrap_err();
        assert!(matches!(
            err,
            SurveyError::Core {
                source: PrepError::MissingPopulation {}
            }
        ));
        assert!(!out.exists());
    }
}
