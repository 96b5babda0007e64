//! Group-and-reduce of a value column, one output row per (group keys x x-value).

use crate::error::{Error, Result};
use crate::models::{SeriesKey, Table, Value, columns::UID};
use crate::stats;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;

/// Reduction applied to the value column inside each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Mean,
    Median,
    Sum,
    /// Sample standard deviation (n - 1).
    StdDev,
}

impl AggFunc {
    /// Parse a user-facing function name; unknown names give `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "mean" | "average" | "avg" => Some(AggFunc::Mean),
            "median" => Some(AggFunc::Median),
            "sum" | "total" => Some(AggFunc::Sum),
            "std" | "stddev" | "std dev" | "sd" | "standard deviation" => Some(AggFunc::StdDev),
            _ => None,
        }
    }

    fn reduce(self, vals: &[Value]) -> Value {
        // NaN counts as missing
        let nums: Vec<f64> = vals
            .iter()
            .filter_map(Value::as_f64)
            .filter(|v| !v.is_nan())
            .collect();
        let opt = |v: Option<f64>| v.map(Value::Float).unwrap_or(Value::Null);
        match self {
            AggFunc::Sum => {
                let ints = vals.iter().try_fold(0i64, |acc, v| match v {
                    Value::Int(i) => acc.checked_add(*i),
                    Value::Null => Some(acc),
                    _ => None,
                });
                match ints {
                    Some(total) => Value::Int(total),
                    // mixed types or i64 overflow
                    None => Value::Float(nums.iter().sum()),
                }
            }
            AggFunc::Mean => opt(stats::mean(&nums)),
            AggFunc::Median => opt(stats::median(&nums)),
            AggFunc::StdDev => opt(stats::sample_std(&nums)),
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggFunc::Mean => "Mean",
            AggFunc::Median => "Median",
            AggFunc::Sum => "Sum",
            AggFunc::StdDev => "Standard Deviation",
        })
    }
}

/// What to aggregate. `func: None` leaves the rows unreduced.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub x: String,
    pub y: String,
    pub group_by: Vec<String>,
    pub func: Option<AggFunc>,
}

impl Aggregation {
    pub fn new(x: &str, y: &str, group_by: &[&str], func: Option<AggFunc>) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            group_by: group_by.iter().map(|s| s.to_string()).collect(),
            func,
        }
    }

    /// Build from a free-form function name; unknown names log a warning and
    /// fall through to the unreduced pass-through.
    pub fn with_func_name(x: &str, y: &str, group_by: &[&str], func: &str) -> Self {
        let parsed = AggFunc::parse(func);
        if parsed.is_none() {
            warn!("unknown aggregation function `{func}`; rows are left unreduced");
        }
        Self::new(x, y, group_by, parsed)
    }
}

/// Output of [`aggregate`]: the reduced table plus the columns that make up a series key.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub table: Table,
    pub x: String,
    pub y: String,
    /// Group-key columns minus the axis columns; these identify a series.
    pub uid_columns: Vec<String>,
    uid_idx: Vec<usize>,
}

impl Aggregated {
    /// Series identity of one row of `self.table`.
    pub fn series_key(&self, row: &[Value]) -> SeriesKey {
        SeriesKey(self.uid_idx.iter().map(|&i| row[i].clone()).collect())
    }

    /// Distinct series keys in first-appearance order.
    pub fn series_keys(&self) -> Vec<SeriesKey> {
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        for row in self.table.rows() {
            let k = self.series_key(row);
            if seen.insert(k.clone()) {
                out.push(k);
            }
        }
        out
    }
}

/// Group `table` by `plan.group_by` plus the x column and reduce `plan.y`.
///
/// Output columns: key columns in table order, then the value column, then `UID`.
/// Rows are sorted by x (stable), then by group key.
pub fn aggregate(table: &Table, plan: &Aggregation) -> Result<Aggregated> {
    table.column_index(&plan.x)?;
    let y_idx = table.column_index(&plan.y)?;
    for g in &plan.group_by {
        table.column_index(g)?;
    }

    let is_key = |c: &str| c != plan.y && (c == plan.x || plan.group_by.iter().any(|g| g == c));
    let key_cols: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| is_key(c) && c.as_str() != UID)
        .cloned()
        .collect();
    let key_idx: Vec<usize> = key_cols
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<_>>()?;

    for row in table.rows() {
        let v = &row[y_idx];
        if !v.is_null() && v.as_f64().is_none() {
            return Err(Error::NonNumeric {
                column: plan.y.clone(),
                value: v.to_string(),
            });
        }
    }

    let rows: Vec<Vec<Value>> = match plan.func {
        Some(func) => {
            let mut groups: BTreeMap<Vec<Value>, Vec<Value>> = BTreeMap::new();
            for row in table.rows() {
                let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
                groups.entry(key).or_default().push(row[y_idx].clone());
            }
            debug!(
                "aggregated {} rows into {} groups with {func}",
                table.len(),
                groups.len()
            );
            groups
                .into_iter()
                .map(|(mut key, vals)| {
                    key.push(func.reduce(&vals));
                    key
                })
                .collect()
        }
        None => table
            .rows()
            .iter()
            .map(|row| {
                let mut out: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
                out.push(row[y_idx].clone());
                out
            })
            .collect(),
    };

    let mut out_cols = key_cols.clone();
    out_cols.push(plan.y.clone());
    let mut out = Table::new(out_cols, rows)?;
    out.sort_by_column(&plan.x)?;

    let uid_columns: Vec<String> = key_cols
        .iter()
        .filter(|c| **c != plan.x && plan.group_by.iter().any(|g| g == *c))
        .cloned()
        .collect();
    let uid_idx: Vec<usize> = uid_columns
        .iter()
        .map(|c| out.column_index(c))
        .collect::<Result<_>>()?;
    let labels: Vec<Value> = out
        .rows()
        .iter()
        .map(|r| {
            let key = SeriesKey(uid_idx.iter().map(|&i| r[i].clone()).collect());
            Value::Text(key.label())
        })
        .collect();
    out.push_column(UID, labels)?;

    Ok(Aggregated {
        table: out,
        x: plan.x.clone(),
        y: plan.y.clone(),
        uid_columns,
        uid_idx,
    })
}
