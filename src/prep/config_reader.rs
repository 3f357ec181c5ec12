use crate::prep::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "headerRowIndex")]
    _header_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
}

impl InputSettings {
    /// The header row, starting at 1. Accepts numbers and numeric strings.
    pub fn header_row_index(&self) -> SurveyResult<Option<usize>> {
        if self._header_row_index.is_some() {
            read_js_int(&self._header_row_index).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightingSettings {
    #[serde(rename = "populationFilePath")]
    pub population_file_path: Option<String>,
    pub strata: Option<Vec<String>>,
    #[serde(rename = "populationShareColumn")]
    pub population_share_column: Option<String>,
    #[serde(rename = "weightColumn")]
    pub weight_column: Option<String>,
    #[serde(rename = "unmatchedStratum")]
    pub unmatched_stratum: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSettings {
    #[serde(rename = "handleMissing")]
    pub handle_missing: Option<bool>,
    #[serde(rename = "labelEncode")]
    pub label_encode: Option<bool>,
    #[serde(rename = "tidyExport")]
    pub tidy_export: Option<bool>,
    pub codebook: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(rename = "skipLabel")]
    pub skip_label: Option<String>,
    #[serde(rename = "categoricalThreshold")]
    pub categorical_threshold: Option<usize>,
    #[serde(rename = "multiResponseScope")]
    pub multi_response_scope: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "tidyArchivePath")]
    pub tidy_archive_path: Option<String>,
    #[serde(rename = "codebookSheetName")]
    pub codebook_sheet_name: Option<String>,
}

/// A job description, as written in a JSON configuration file.
/// Every section is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "inputSettings")]
    pub input_settings: Option<InputSettings>,
    pub weighting: Option<WeightingSettings>,
    pub steps: Option<StepSettings>,
    pub rules: Option<RuleSettings>,
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
}

pub fn read_config(path: &str) -> SurveyResult<JobConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let config: JobConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

fn read_js_int(x: &Option<JSValue>) -> SurveyResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(x) => Ok(x),
        None => whatever!("Expected a positive integer, got {:?}", x),
    }
}
