//! Structure inference from column names.
//!
//! Survey exports do not ship a schema. Two naming conventions are enough to
//! recover the structure needed by the other stages:
//!
//! * a column `X(TEXT)` holds the human-readable label of the code column `X`;
//! * code columns sharing the text before their first `_` (`Q2_1`, `Q2_2`, ...)
//! are the options of one multi-response question.
//!
//! Everything here is a pure function of the column names. Cell values are never read.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::config::MultiResponseScope;

/// The suffix that marks a text column.
pub const TEXT_SUFFIX: &str = "(TEXT)";

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CodeTextPair {
    pub code: String,
    pub text: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MultiResponseGroup {
    pub prefix: String,
    /// Members in the order of the input columns. Always at least two.
    pub members: Vec<String>,
}

/// Counts of what was detected, so that callers can tell a silent no-op
/// (naming conventions not followed) from an actual transformation.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct LayoutSummary {
    pub pairs: usize,
    pub groups: usize,
    pub multi_response_columns: usize,
}

/// Finds the code/text column pairs.
///
/// A pair is reported for every column `X(TEXT)` such that `X` is also a column.
/// Pairs are returned in the order of the text columns.
pub fn detect_pairs<S: AsRef<str>>(columns: &[S]) -> Vec<CodeTextPair> {
    let names: HashSet<&str> = columns.iter().map(|c| c.as_ref()).collect();
    columns
        .iter()
        .filter_map(|c| {
            let text = c.as_ref();
            let code = text.strip_suffix(TEXT_SUFFIX)?;
            if names.contains(code) {
                Some(CodeTextPair {
                    code: code.to_string(),
                    text: text.to_string(),
                })
            } else {
                None
            }
        })
        .collect()
}

/// The part of a column name before its first `_`, if there is an `_`.
pub fn group_prefix(column: &str) -> Option<&str> {
    column.split_once('_').map(|(prefix, _)| prefix)
}

/// Groups code columns by prefix, keeping only the groups with at least two members.
///
/// Groups are returned in the order in which their prefix first appears.
pub fn detect_multiresp<S: AsRef<str>>(code_columns: &[S]) -> Vec<MultiResponseGroup> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<MultiResponseGroup> = Vec::new();
    for c in code_columns.iter().map(|c| c.as_ref()) {
        let prefix = match group_prefix(c) {
            Some(p) => p,
            None => continue,
        };
        let idx = *positions.entry(prefix).or_insert_with(|| {
            groups.push(MultiResponseGroup {
                prefix: prefix.to_string(),
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].members.push(c.to_string());
    }
    groups.retain(|g| g.members.len() >= 2);
    groups
}

/// The detected structure of a table.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SurveyLayout {
    pub pairs: Vec<CodeTextPair>,
    pub groups: Vec<MultiResponseGroup>,
}

impl SurveyLayout {
    /// Detects pairs, then multi-response groups over the code columns selected by `scope`.
    pub fn detect<S: AsRef<str>>(
        columns: &[S],
        scope: MultiResponseScope,
        id_column: &str,
    ) -> SurveyLayout {
        let pairs = detect_pairs(columns);
        let code_columns: Vec<&str> = match scope {
            MultiResponseScope::PairedCodes => pairs.iter().map(|p| p.code.as_str()).collect(),
            MultiResponseScope::AllCodes => columns
                .iter()
                .map(|c| c.as_ref())
                .filter(|c| *c != id_column && !c.ends_with(TEXT_SUFFIX))
                .collect(),
        };
        let groups = detect_multiresp(&code_columns);
        let layout = SurveyLayout { pairs, groups };
        debug!("SurveyLayout::detect: scope: {:?} {:?}", scope, layout.summary());
        layout
    }

    pub fn text_for(&self, code: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.code == code)
            .map(|p| p.text.as_str())
    }

    pub fn multi_response_columns(&self) -> HashSet<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().map(String::as_str))
            .collect()
    }

    pub fn is_multi_response(&self, column: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.members.iter().any(|m| m == column))
    }

    pub fn summary(&self) -> LayoutSummary {
        LayoutSummary {
            pairs: self.pairs.len(),
            groups: self.groups.len(),
            multi_response_columns: self.groups.iter().map(|g| g.members.len()).sum(),
        }
    }
}
