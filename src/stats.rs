use crate::error::{Error, Result};
use crate::models::{SeriesKey, Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics for a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub key: Vec<String>,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

pub fn mean(vals: &[f64]) -> Option<f64> {
    if vals.is_empty() {
        None
    } else {
        Some(vals.iter().copied().sum::<f64>() / vals.len() as f64)
    }
}

pub fn median(vals: &[f64]) -> Option<f64> {
    let mut v = vals.to_vec();
    v.sort_by(f64::total_cmp);
    let n = v.len();
    if n == 0 {
        None
    } else if n % 2 == 1 {
        Some(v[n / 2])
    } else {
        Some((v[n / 2 - 1] + v[n / 2]) / 2.0)
    }
}

/// Sample standard deviation (n - 1); undefined below two values.
pub fn sample_std(vals: &[f64]) -> Option<f64> {
    if vals.len() < 2 {
        return None;
    }
    let m = mean(vals)?;
    let ss: f64 = vals.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (vals.len() - 1) as f64).sqrt())
}

/// Compute grouped statistics of `value_col` by the `keys` columns.
///
/// Null cells count as missing; text or date cells are an error.
pub fn grouped_summary(table: &Table, value_col: &str, keys: &[&str]) -> Result<Vec<Summary>> {
    let v_idx = table.column_index(value_col)?;
    let k_idx: Vec<usize> = keys
        .iter()
        .map(|k| table.column_index(k))
        .collect::<Result<_>>()?;

    let mut groups: BTreeMap<SeriesKey, Vec<f64>> = BTreeMap::new();
    let mut missing: BTreeMap<SeriesKey, usize> = BTreeMap::new();
    for row in table.rows() {
        let key = SeriesKey(k_idx.iter().map(|&i| row[i].clone()).collect());
        match &row[v_idx] {
            Value::Null => *missing.entry(key).or_default() += 1,
            v => match v.as_f64() {
                Some(x) => groups.entry(key).or_default().push(x),
                None => {
                    return Err(Error::NonNumeric {
                        column: value_col.to_string(),
                        value: v.to_string(),
                    });
                }
            },
        }
    }
    // groups that only ever saw nulls still get a row
    for key in missing.keys() {
        groups.entry(key.clone()).or_default();
    }

    let mut out = Vec::new();
    for (key, vals) in groups {
        let miss = missing.get(&key).cloned().unwrap_or(0);
        out.push(Summary {
            key: key.0.iter().map(|v| v.to_string()).collect(),
            count: vals.len(),
            missing: miss,
            min: vals.iter().copied().reduce(f64::min),
            max: vals.iter().copied().reduce(f64::max),
            mean: mean(&vals),
            median: median(&vals),
        });
    }
    Ok(out)
}
