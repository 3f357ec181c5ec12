/*!

This is the long-form manual for `survey_prepro` and `surveyprep`.

## Column conventions

Nothing about the structure of a survey is configured: it is read from the
column names of the export. Names are compared exactly (no trimming, no case
folding). Columns that do not follow the conventions are passed through as they
are; check the detected counts logged at the start of a run (or
`PipelineOutput::layout`) when the output looks unchanged.

### Code and text columns

A column named `X(TEXT)` is the text column of `X` when a column `X` exists.
`X` holds codes (`1`, `2`, ...), `X(TEXT)` the labels shown to the respondent.

| id   | Q1 | Q1(TEXT) |
|------|----|----------|
| 1001 | 3  | Agree    |

### Multi-response questions

Columns sharing the text before their first `_` form one multi-response
question when there are at least two of them: `Q2_1`, `Q2_2`, `Q2_3` are the
options of `Q2`. A column without `_` is never an option.

By default only code columns with a text column are considered (`PairedCodes`).
With `AllCodes` (`--all-columns-multi-response`) every column other than the
text columns and the respondent id is considered. This is needed for exports
where options carry no text column, but it also groups unrelated columns such
as `age_group` and `age_band`.

## Steps

The steps always run in this order:

1. **weights** `weight = population_share / sample_share` per stratum. Strata
 absent from the population table get a weight of `0` (configurable:
 `zero`, `missing`, `fail`).
2. **missing values** options become `1`/`0` presence flags; categorical
 columns (not float, at most 20 distinct values by default) get
 `스킵(해당 없음)` in place of missing values. The respondent id is never filled.
3. **tidy export** one long table of `(id, option, code_value, option_text)`
 for all pairs (`all_tidy`) and one per multi-response question (`<prefix>_tidy`).
4. **label decoding** code columns get their labels, option columns are
 renamed after their label, and the text columns are dropped.

The codebook, when requested, is built from the table as loaded.

## Input formats

* `xlsx`, `xls` The first worksheet (or `--excel-worksheet-name`). The header is
 on row 2 by default: row 1 of survey exports holds the question texts.
* `csv` UTF-8, header on row 1. Empty cells and the usual `NA` markers are missing.

## Configuration

All the command line options can be given in a JSON file with `--config`.
Options given on the command line take precedence.

```json
{
  "inputSettings": {
    "filePath": "raw.xlsx",
    "provider": "xlsx",
    "headerRowIndex": 2,
    "idColumn": "회원ID"
  },
  "weighting": {
    "populationFilePath": "population.csv",
    "strata": ["region", "age_group"],
    "populationShareColumn": "pop_share",
    "unmatchedStratum": "zero"
  },
  "steps": {
    "handleMissing": true,
    "labelEncode": true,
    "tidyExport": true,
    "codebook": true
  },
  "rules": {
    "skipLabel": "스킵(해당 없음)",
    "categoricalThreshold": 20,
    "multiResponseScope": "pairedCodes"
  },
  "outputSettings": {
    "outputPath": "processed.xlsx",
    "tidyArchivePath": "tidy_outputs.zip",
    "codebookSheetName": "codebook"
  }
}
```

Relative paths are resolved from the directory of the configuration file.
Weighting is enabled as soon as a population file is given.

## Outputs

* the processed table, as `.xlsx` (with the codebook on a second sheet) or as
 `.csv` (the codebook then goes to `<name>_codebook.csv`);
* the tidy tables, as one CSV file each inside a zip archive.

CSV files are written in UTF-8 with a byte order mark, so that spreadsheet
programs open Korean and other non-Latin text correctly.

*/
