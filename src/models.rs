use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Column names used by the count datasets after normalization.
pub mod columns {
    pub const DATE: &str = "DATE";
    pub const DAM: &str = "DAM";
    pub const LOCATION: &str = "LOCATION";
    pub const SPECIES: &str = "SPECIES";
    pub const COUNT: &str = "COUNT";
    pub const DOY: &str = "DOY";
    pub const WOY: &str = "WOY";
    pub const MONTH: &str = "MONTH";
    pub const YEAR: &str = "YEAR";
    pub const YEAR_MONTH: &str = "YEAR_MONTH";
    pub const YEAR_WEEK: &str = "YEAR_WEEK";
    pub const DOY_ZSCORE: &str = "DOY_ZSCORE";
    pub const LAT: &str = "LAT";
    pub const LON: &str = "LON";
    pub const TYPE: &str = "TYPE";
    pub const GEOMETRY: &str = "GEOMETRY";
    /// Synthetic group identifier written by the aggregator.
    pub const UID: &str = "UID";
}

/// One cell of a [`Table`].
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    /// Numeric view of the value; dates and text are not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Position on a continuous scale: numbers as-is, dates as days since CE.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Date(d) => Some(chrono::Datelike::num_days_from_ce(d) as f64),
            other => other.as_f64(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Date(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) if a.rank() == 1 && b.rank() == 1 => {
                // as_f64 is always Some for numeric ranks
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) => serializer.serialize_none(),
            Value::Date(_) | Value::Text(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

/// Identity of one rendered series: the group-key values in column order.
///
/// Structured so that `("A-B")` and `("A", "B")` are different series even though
/// their joined labels coincide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SeriesKey(pub Vec<Value>);

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            // Int and Float compare equal by magnitude, so both hash the f64 bits.
            Value::Int(_) | Value::Float(_) => {
                let v = self.as_f64().unwrap_or(0.0);
                let v = if v == 0.0 { 0.0 } else { v };
                v.to_bits().hash(state)
            }
            Value::Date(d) => d.hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl SeriesKey {
    /// The display identifier (UID): values joined with `-`.
    pub fn label(&self) -> String {
        self.0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A rectangular table of [`Value`]s with named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, checking every row against the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::RaggedRow {
                    row: i,
                    found: row.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Index of `name`, or the typed invalid-column error.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::InvalidColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Append a column; `values` must have one entry per row.
    pub fn push_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::RaggedRow {
                row: values.len(),
                found: values.len(),
                expected: self.rows.len(),
            });
        }
        self.columns.push(name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(())
    }

    /// Replace the values of an existing column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&Value) -> Result<Value>,
    {
        let idx = self.column_index(name)?;
        for row in self.rows.iter_mut() {
            row[idx] = f(&row[idx])?;
        }
        Ok(())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|r| keep(r));
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Project onto the given columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let idx: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<_>>()?;
        Ok(Table {
            columns: names.iter().map(|s| s.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Stable sort by the values of one column.
    pub fn sort_by_column(&mut self, name: &str) -> Result<()> {
        let idx = self.column_index(name)?;
        self.rows.sort_by(|a, b| a[idx].cmp(&b[idx]));
        Ok(())
    }

    /// Rename a column in place.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.column_index(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_compare_across_variants() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert!(Value::Int(2) < Value::Float(2.5));
        assert!(Value::Null < Value::Int(-10));
        assert!(Value::Int(10) < Value::Text("a".into()));
    }

    #[test]
    fn series_key_label_joins_with_dash() {
        let k = SeriesKey(vec!["Chinook".into(), Value::Int(2020)]);
        assert_eq!(k.label(), "Chinook-2020");
        let a = SeriesKey(vec!["A-B".into()]);
        let b = SeriesKey(vec!["A".into(), "B".into()]);
        assert_eq!(a.label(), b.label());
        assert_ne!(a, b);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::new(vec!["A".into(), "B".into()], vec![vec![Value::Int(1)]]).unwrap_err();
        assert!(matches!(err, Error::RaggedRow { row: 0, found: 1, expected: 2 }));
    }

    #[test]
    fn missing_column_is_typed_error() {
        let t = Table::new(vec!["A".into()], vec![]).unwrap();
        let err = t.column_index("B").unwrap_err();
        assert!(matches!(err, Error::InvalidColumn { ref column, .. } if column == "B"));
    }
}
