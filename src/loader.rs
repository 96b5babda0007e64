//! Reading count datasets: CSV/JSON parsing, column normalization, derived temporal
//! fields and base-directory path resolution.

use crate::cache::LoadCache;
use crate::config::DataConfig;
use crate::models::{Table, Value, columns};
use crate::stats;
use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a load attempt. A missing file is a degraded state, not an error.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<Table>),
    Unavailable(Unavailable),
}

/// Diagnostics for a dataset that could not be found.
#[derive(Debug, Clone, PartialEq)]
pub struct Unavailable {
    /// Every candidate path that was probed.
    pub searched: Vec<PathBuf>,
    /// Entries of the base directory, to help spot a wrong base path.
    pub listing: Vec<String>,
}

impl LoadOutcome {
    pub fn table(&self) -> Option<&Arc<Table>> {
        match self {
            LoadOutcome::Loaded(t) => Some(t),
            LoadOutcome::Unavailable(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Arc<Table>> {
        match self {
            LoadOutcome::Loaded(t) => Some(t),
            LoadOutcome::Unavailable(_) => None,
        }
    }
}

/// Resolves dataset paths against an injected base directory and memoizes loads.
#[derive(Debug)]
pub struct Loader {
    base_dir: PathBuf,
    fallback_dirs: Vec<PathBuf>,
    cache: LoadCache,
}

impl Loader {
    pub fn new(base_dir: impl Into<PathBuf>, fallback_dirs: Vec<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            fallback_dirs,
            cache: LoadCache::new(),
        }
    }

    pub fn from_config(cfg: &DataConfig) -> Self {
        Self::new(cfg.base_dir.clone(), cfg.fallback_dirs.clone())
    }

    /// Candidate locations for `path`, in probe order.
    pub fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        if path.is_absolute() {
            return vec![path.to_path_buf()];
        }
        let mut out = vec![self.base_dir.join(path)];
        out.extend(
            self.fallback_dirs
                .iter()
                .map(|d| self.base_dir.join(d).join(path)),
        );
        out
    }

    /// First existing candidate, or every path that was tried.
    pub fn resolve(&self, path: &Path) -> std::result::Result<PathBuf, Vec<PathBuf>> {
        let candidates = self.candidates(path);
        match candidates.iter().find(|c| c.exists()) {
            Some(found) => Ok(found.clone()),
            None => Err(candidates),
        }
    }

    /// Load and prepare a count dataset, served from the cache after the first call.
    pub fn load_counts(&self, path: &Path) -> Result<LoadOutcome> {
        let resolved = match self.resolve(path) {
            Ok(p) => p,
            Err(searched) => {
                let listing = list_dir(&self.base_dir);
                warn!(
                    "dam counts unavailable: {} not found (searched {:?}); {} contains {:?}",
                    path.display(),
                    searched,
                    self.base_dir.display(),
                    listing
                );
                return Ok(LoadOutcome::Unavailable(Unavailable { searched, listing }));
            }
        };
        let table = self.cache.get_or_load(&resolved, read_counts)?;
        Ok(LoadOutcome::Loaded(table))
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Read a count file and apply normalization and derived fields.
pub fn read_counts(path: &Path) -> Result<Table> {
    let raw = read_table(path)?;
    let table = prepare_counts(raw)?;
    info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Read a CSV (header row) or JSON (array of records) file by extension.
pub fn read_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let (headers, cells) = match ext.as_str() {
        "csv" => read_csv_cells(path)?,
        "json" => read_json_cells(path)?,
        other => bail!(
            "unsupported dataset format `{other}` for {} (expected .csv or .json)",
            path.display()
        ),
    };
    build_table(headers, cells).with_context(|| format!("in {}", path.display()))
}

type Cells = (Vec<String>, Vec<Vec<String>>);

fn read_csv_cells(path: &Path) -> Result<Cells> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        rows.push(rec.iter().map(|c| c.to_string()).collect());
    }
    Ok((headers, rows))
}

fn read_json_cells(path: &Path) -> Result<Cells> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(&raw).context("expected a JSON array of objects")?;
    let mut headers: Vec<String> = Vec::new();
    for rec in &records {
        for k in rec.keys() {
            if !headers.contains(k) {
                headers.push(k.clone());
            }
        }
    }
    let rows = records
        .iter()
        .map(|rec| {
            headers
                .iter()
                .map(|h| match rec.get(h) {
                    None | Some(serde_json::Value::Null) => String::new(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();
    Ok((headers, rows))
}

/// Cell type shared by a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Kind {
    Int,
    Float,
    Date,
    Text,
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

/// Tokens read as a missing value, compared case-insensitively.
const MISSING_TOKENS: &[&str] = &["na", "n/a", "#n/a", "<na>", "nan", "-nan", "null", "none"];

fn is_missing(s: &str) -> bool {
    s.is_empty() || MISSING_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

fn cell_kind(s: &str) -> Kind {
    if s.parse::<i64>().is_ok() {
        Kind::Int
    } else if s.parse::<f64>().is_ok() {
        Kind::Float
    } else if parse_date(s).is_some() {
        Kind::Date
    } else {
        Kind::Text
    }
}

fn column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> Kind {
    let mut kind: Option<Kind> = None;
    for s in cells.filter(|s| !is_missing(s)) {
        let k = cell_kind(s);
        kind = Some(match (kind, k) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(Kind::Int), Kind::Float) | (Some(Kind::Float), Kind::Int) => Kind::Float,
            _ => Kind::Text,
        });
        if kind == Some(Kind::Text) {
            break;
        }
    }
    kind.unwrap_or(Kind::Text)
}

fn convert(s: &str, kind: Kind) -> Value {
    if is_missing(s) {
        return Value::Null;
    }
    match kind {
        Kind::Int => s.parse().map(Value::Int).unwrap_or(Value::Null),
        Kind::Float => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .unwrap_or(Value::Null),
        Kind::Date => parse_date(s).map(Value::Date).unwrap_or(Value::Null),
        Kind::Text => Value::Text(s.to_string()),
    }
}

fn build_table(headers: Vec<String>, cells: Vec<Vec<String>>) -> Result<Table> {
    let kinds: Vec<Kind> = (0..headers.len())
        .map(|i| column_kind(cells.iter().map(|r| r.get(i).map(String::as_str).unwrap_or(""))))
        .collect();
    debug!(
        "inferred column types: {:?}",
        headers.iter().zip(&kinds).collect::<Vec<_>>()
    );
    let rows = cells
        .iter()
        .map(|r| {
            kinds
                .iter()
                .enumerate()
                .map(|(i, k)| convert(r.get(i).map(String::as_str).unwrap_or(""), *k))
                .collect()
        })
        .collect();
    Ok(Table::new(headers, rows)?)
}

/// Upper-case, trim and underscore a header: ` dam name ` -> `DAM_NAME`.
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Normalize headers, alias `DAM` to `LOCATION` and add missing derived fields.
pub fn prepare_counts(mut table: Table) -> Result<Table> {
    let names: Vec<String> = table.columns().to_vec();
    for name in names {
        let norm = normalize_column_name(&name);
        if norm != name {
            table.rename_column(&name, &norm)?;
        }
    }

    if table.has_column(columns::DAM) && !table.has_column(columns::LOCATION) {
        let dams: Vec<Value> = table.column(columns::DAM)?.into_iter().cloned().collect();
        table.push_column(columns::LOCATION, dams)?;
    }

    if table.has_column(columns::DATE) {
        derive_temporal(&mut table)?;
    }
    if !table.has_column(columns::DOY_ZSCORE)
        && [columns::LOCATION, columns::SPECIES, columns::COUNT, columns::DOY]
            .iter()
            .all(|c| table.has_column(c))
    {
        let z = doy_zscore(&table)?;
        table.push_column(columns::DOY_ZSCORE, z)?;
    }
    Ok(table)
}

fn derive_temporal(table: &mut Table) -> Result<()> {
    let dates: Vec<Option<NaiveDate>> = table
        .column(columns::DATE)?
        .into_iter()
        .map(|v| match v {
            Value::Date(d) => Some(*d),
            _ => None,
        })
        .collect();
    if dates.iter().all(Option::is_none) && !table.is_empty() {
        warn!("DATE column holds no parseable dates; temporal fields not derived");
        return Ok(());
    }

    type Derive = fn(&NaiveDate) -> Value;
    let derived: [(&str, Derive); 6] = [
        (columns::DOY, |d| Value::Int(d.ordinal() as i64)),
        (columns::WOY, |d| Value::Int(d.iso_week().week() as i64)),
        (columns::MONTH, |d| Value::Int(d.month() as i64)),
        (columns::YEAR, |d| Value::Int(d.year() as i64)),
        (columns::YEAR_MONTH, |d| {
            Value::Text(format!("{:04}-{:02}", d.year(), d.month()))
        }),
        (columns::YEAR_WEEK, |d| {
            let w = d.iso_week();
            Value::Text(format!("{:04}-W{:02}", w.year(), w.week()))
        }),
    ];
    for (name, f) in derived {
        if table.has_column(name) {
            continue;
        }
        let vals = dates
            .iter()
            .map(|d| d.as_ref().map(f).unwrap_or(Value::Null))
            .collect();
        table.push_column(name, vals)?;
    }
    Ok(())
}

/// z-score of `COUNT` within its (LOCATION, SPECIES, DOY) group, i.e. how unusual a
/// day's count is compared with the same day in other years. Zero when the group has no
/// spread.
fn doy_zscore(table: &Table) -> Result<Vec<Value>> {
    let key_idx = [
        table.column_index(columns::LOCATION)?,
        table.column_index(columns::SPECIES)?,
        table.column_index(columns::DOY)?,
    ];
    let c_idx = table.column_index(columns::COUNT)?;
    let key_of =
        |row: &[Value]| -> Vec<Value> { key_idx.iter().map(|&i| row[i].clone()).collect() };

    let mut groups: HashMap<Vec<Value>, Vec<f64>> = HashMap::new();
    for row in table.rows() {
        if let Some(c) = row[c_idx].as_f64() {
            groups.entry(key_of(row)).or_default().push(c);
        }
    }
    let moments: BTreeMap<Vec<Value>, (f64, Option<f64>)> = groups
        .into_iter()
        .filter_map(|(k, v)| stats::mean(&v).map(|m| (k, (m, stats::sample_std(&v)))))
        .collect();

    Ok(table
        .rows()
        .iter()
        .map(|row| {
            let Some(c) = row[c_idx].as_f64() else {
                return Value::Null;
            };
            match moments.get(&key_of(row)) {
                Some((m, Some(sd))) if *sd > 0.0 => Value::Float((c - m) / sd),
                Some(_) => Value::Float(0.0),
                None => Value::Null,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_column_name(" dam name "), "DAM_NAME");
        assert_eq!(normalize_column_name("Count"), "COUNT");
    }

    #[test]
    fn column_kind_widens() {
        assert_eq!(column_kind(["1", "2"].into_iter()), Kind::Int);
        assert_eq!(column_kind(["1", "2.5", ""].into_iter()), Kind::Float);
        assert_eq!(column_kind(["2020-01-01", ""].into_iter()), Kind::Date);
        assert_eq!(column_kind(["2020-01-01", "7"].into_iter()), Kind::Text);
        assert_eq!(column_kind(std::iter::empty()), Kind::Text);
    }

    #[test]
    fn missing_tokens_do_not_widen_to_text() {
        assert_eq!(column_kind(["10", "NA", "20"].into_iter()), Kind::Int);
        assert_eq!(column_kind(["1.5", "nan", "N/A", "null"].into_iter()), Kind::Float);
        assert_eq!(convert("NaN", Kind::Int), Value::Null);
        assert_eq!(convert("inf", Kind::Float), Value::Null);
        assert_eq!(convert("None", Kind::Text), Value::Null);
    }
}
