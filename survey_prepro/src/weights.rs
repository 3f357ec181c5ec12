use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use std::collections::HashMap;
use std::fmt::Display;

use crate::config::*;
use crate::table::*;

/// The values of the strata columns for one row. Compared exactly.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct StrataKey(pub Vec<CellKey>);

impl Display for StrataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|k| match k {
                CellKey::Missing => "<missing>".to_string(),
                CellKey::Int(i) => i.to_string(),
                CellKey::Float(bits) => f64::from_bits(*bits).to_string(),
                CellKey::Text(s) => format!("{:?}", s),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Post-stratification weights.
///
/// For each respondent, `weight = population_share / sample_share`, where
/// `sample_share` is the fraction of respondents in the same stratum and
/// `population_share` is read from the population table.
///
/// Respondents whose stratum is not in the population table get a weight
/// according to `rules.unmatched`; with the default policy the weight is `0`.
///
/// Returns the survey columns plus the weight column. Fails before computing
/// anything if the strata or share columns are not where they should be.
pub fn add_weights(table: &Table, population: &Table, rules: &WeightRules) -> PrepResult<Table> {
    check_columns(table, population, rules)?;

    let population_shares = read_population_shares(population, rules)?;
    let keys = strata_keys(table, &rules.strata);

    let mut counts: HashMap<&StrataKey, usize> = HashMap::new();
    for k in keys.iter() {
        *counts.entry(k).or_insert(0) += 1;
    }
    info!(
        "add_weights: {} rows in {} strata, {} strata in the population table",
        table.num_rows(),
        counts.len(),
        population_shares.len()
    );

    let total = table.num_rows() as f64;
    let mut weights: Vec<Cell> = Vec::with_capacity(keys.len());
    let mut unmatched: HashMap<&StrataKey, usize> = HashMap::new();
    for k in keys.iter() {
        // Never zero: the row itself is counted.
        let sample_share = counts[k] as f64 / total;
        let weight = match population_shares.get(k) {
            Some(pop_share) => Cell::Float(pop_share / sample_share),
            None => {
                *unmatched.entry(k).or_insert(0) += 1;
                match rules.unmatched {
                    UnmatchedStratumPolicy::Zero => Cell::Float(0.0),
                    UnmatchedStratumPolicy::Missing => Cell::Missing,
                    UnmatchedStratumPolicy::Fail => {
                        return UnmatchedStratumSnafu { key: k.to_string() }.fail();
                    }
                }
            }
        };
        weights.push(weight);
    }

    for (k, n) in unmatched.iter() {
        warn!(
            "add_weights: stratum {} ({} rows) is not in the population table, policy: {:?}",
            k, n, rules.unmatched
        );
    }

    let mut res = table.clone();
    res.set_column(Column::new(&rules.weight_column, weights))?;
    Ok(res)
}

fn check_columns(table: &Table, population: &Table, rules: &WeightRules) -> PrepResult<()> {
    ensure!(!rules.strata.is_empty(), EmptyStrataSnafu {});
    for s in rules.strata.iter() {
        ensure!(
            table.has_column(s),
            MissingStrataColumnSnafu {
                column: s.clone(),
                table: "survey",
            }
        );
        ensure!(
            population.has_column(s),
            MissingStrataColumnSnafu {
                column: s.clone(),
                table: "population",
            }
        );
    }
    ensure!(
        population.has_column(&rules.population_share_column),
        MissingShareColumnSnafu {
            column: rules.population_share_column.clone()
        }
    );
    Ok(())
}

pub fn strata_keys(table: &Table, strata: &[String]) -> Vec<StrataKey> {
    let cols: Vec<&Column> = strata.iter().filter_map(|s| table.column(s)).collect();
    (0..table.num_rows())
        .map(|row| StrataKey(cols.iter().map(|c| c.cells[row].key()).collect()))
        .collect()
}

/// Population share per stratum. Missing shares count as zero.
fn read_population_shares(
    population: &Table,
    rules: &WeightRules,
) -> PrepResult<HashMap<StrataKey, f64>> {
    let share_col = population
        .column(&rules.population_share_column)
        .context(MissingShareColumnSnafu {
            column: rules.population_share_column.clone(),
        })?;
    let keys = strata_keys(population, &rules.strata);

    let mut res: HashMap<StrataKey, f64> = HashMap::new();
    for (row, (key, cell)) in keys.into_iter().zip(share_col.cells.iter()).enumerate() {
        let share = match cell {
            Cell::Missing => 0.0,
            Cell::Int(i) => *i as f64,
            Cell::Float(x) => *x,
            Cell::Text(s) => s.trim().parse::<f64>().ok().context(NonNumericShareSnafu {
                row,
                value: s.clone(),
            })?,
        };
        debug!("read_population_shares: {} -> {}", key, share);
        ensure!(
            !res.contains_key(&key),
            DuplicateStratumSnafu {
                key: key.to_string()
            }
        );
        res.insert(key, share);
    }
    Ok(res)
}
