//! Dam point reference layer (GeoJSON) and its attribute join onto count tables.

use crate::models::{Table, Value, columns};
use anyhow::{Context, Result, bail};
use geojson::GeoJson;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One dam location with its descriptive attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DamSite {
    pub lon: f64,
    pub lat: f64,
    /// Feature properties with upper-cased keys (`NAME`, `DAM`, `TYPE`, ...).
    pub properties: BTreeMap<String, Value>,
}

impl DamSite {
    pub fn name(&self) -> Option<String> {
        self.properties.get("NAME").map(|v| v.to_string())
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Read point features from a GeoJSON `FeatureCollection`; non-point features are skipped.
pub fn load_dam_sites(path: &Path) -> Result<Vec<DamSite>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid GeoJSON in {}", path.display()))?;
    let GeoJson::FeatureCollection(fc) = geojson else {
        bail!("{} is not a FeatureCollection", path.display());
    };

    let mut sites = Vec::new();
    let mut skipped = 0usize;
    for feature in fc.features {
        let coords = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(geojson::Value::Point(c)) if c.len() >= 2 => (c[0], c[1]),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let properties = feature
            .properties
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| (k.trim().to_uppercase(), json_to_value(v)))
            .collect();
        sites.push(DamSite {
            lon: coords.0,
            lat: coords.1,
            properties,
        });
    }
    if skipped > 0 {
        warn!("skipped {skipped} non-point features in {}", path.display());
    }
    Ok(sites)
}

/// Inner-join site attributes onto `table` where `table[on] == site.properties[on]`.
///
/// Adds every site property not already a table column, plus `LON` / `LAT`. Rows with no
/// matching site are dropped.
pub fn join_sites(table: &Table, sites: &[DamSite], on: &str) -> Result<Table> {
    let on_idx = table.column_index(on)?;
    let by_key: BTreeMap<String, &DamSite> = sites
        .iter()
        .filter_map(|s| s.properties.get(on).map(|k| (k.to_string(), s)))
        .collect();

    let mut extra: BTreeSet<String> = sites
        .iter()
        .flat_map(|s| s.properties.keys().cloned())
        .filter(|k| !table.has_column(k) && k != columns::GEOMETRY)
        .collect();
    extra.remove(columns::LON);
    extra.remove(columns::LAT);
    let mut cols: Vec<String> = table.columns().to_vec();
    cols.extend(extra.iter().cloned());
    let with_coords = !table.has_column(columns::LON) && !table.has_column(columns::LAT);
    if with_coords {
        cols.push(columns::LON.to_string());
        cols.push(columns::LAT.to_string());
    }

    let mut rows = Vec::new();
    for row in table.rows() {
        let Some(site) = by_key.get(&row[on_idx].to_string()) else {
            continue;
        };
        let mut out = row.clone();
        out.extend(
            extra
                .iter()
                .map(|k| site.properties.get(k).cloned().unwrap_or(Value::Null)),
        );
        if with_coords {
            out.push(Value::Float(site.lon));
            out.push(Value::Float(site.lat));
        }
        rows.push(out);
    }
    let dropped = table.len() - rows.len();
    if dropped > 0 {
        info!("{dropped} rows had no matching site on {on} and were dropped");
    }
    Ok(Table::new(cols, rows)?)
}
