//! Turn an aggregated table into ordered, colored plot series.

use crate::aggregate::Aggregated;
use crate::color::{ColorMap, Rgb};
use crate::error::Result;
use crate::models::{SeriesKey, Value};
use crate::viz::ChartKind;
use std::collections::BTreeMap;

/// One rendered series.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub key: SeriesKey,
    /// Display identifier (the UID).
    pub label: String,
    pub color: Rgb,
    /// (x, y) pairs sorted by x; null y values are dropped.
    pub points: Vec<(Value, f64)>,
    /// Sum of the y values.
    pub total: f64,
    /// Draw position: 0 is drawn first, the highest index ends up on top.
    pub z_order: usize,
}

/// Group the rows of `agg` into series and order them for drawing.
///
/// Area charts draw the largest total first so smaller areas stay visible. Line and bar
/// charts order by the color-by value, then by first appearance.
pub fn build_series(
    agg: &Aggregated,
    colors: &ColorMap,
    color_by: Option<&str>,
    kind: ChartKind,
) -> Result<Vec<PlotSeries>> {
    let x_idx = agg.table.column_index(&agg.x)?;
    let y_idx = agg.table.column_index(&agg.y)?;
    let c_idx = match color_by {
        Some(c) => Some(agg.table.column_index(c)?),
        None => None,
    };

    let order = agg.series_keys();
    let mut points: BTreeMap<SeriesKey, Vec<(Value, f64)>> = BTreeMap::new();
    let mut color_value: BTreeMap<SeriesKey, Value> = BTreeMap::new();
    for row in agg.table.rows() {
        let key = agg.series_key(row);
        if let Some(ci) = c_idx {
            color_value
                .entry(key.clone())
                .or_insert_with(|| row[ci].clone());
        }
        let entry = points.entry(key).or_default();
        if let Some(y) = row[y_idx].as_f64().filter(|y| y.is_finite()) {
            entry.push((row[x_idx].clone(), y));
        }
    }

    let fallback = Rgb(0, 0, 0);
    let mut series: Vec<PlotSeries> = order
        .into_iter()
        .map(|key| {
            let mut pts = points.remove(&key).unwrap_or_default();
            pts.sort_by(|a, b| a.0.cmp(&b.0));
            let total = pts.iter().map(|(_, y)| *y).sum();
            PlotSeries {
                label: key.label(),
                color: colors.get(&key).unwrap_or(fallback),
                key,
                points: pts,
                total,
                z_order: 0,
            }
        })
        .collect();

    match kind {
        ChartKind::Area => {
            series.sort_by(|a, b| b.total.total_cmp(&a.total));
        }
        _ if c_idx.is_some() => {
            let null = Value::Null;
            series.sort_by(|a, b| {
                let va = color_value.get(&a.key).unwrap_or(&null);
                let vb = color_value.get(&b.key).unwrap_or(&null);
                va.cmp(vb)
            });
        }
        _ => {}
    }
    for (i, s) in series.iter_mut().enumerate() {
        s.z_order = i;
    }
    Ok(series)
}
