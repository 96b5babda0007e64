//! Selection -> aggregated table -> colored, ordered series.

use crate::aggregate::Aggregated;
use crate::axis::{axis_label, normalize_x};
use crate::color::{ColorMap, Palettes, assign_colors};
use crate::error::Result;
use crate::models::Table;
use crate::selection::Selection;
use crate::series::{PlotSeries, build_series};
use crate::viz::ChartKind;
use log::info;

/// Everything a chart needs, derived from one dataset and one selection.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub aggregated: Aggregated,
    pub colors: ColorMap,
    pub series: Vec<PlotSeries>,
    pub x_label: String,
    pub y_label: String,
}

/// Normalize the x axis (year-week -> Monday dates), then filter and aggregate.
pub fn aggregate_selection(table: &Table, selection: &Selection) -> Result<Aggregated> {
    let mut input = table.clone();
    normalize_x(&mut input, &selection.x)?;
    selection.apply(&input)
}

pub fn prepare(
    table: &Table,
    selection: &Selection,
    palettes: &Palettes,
    color_steps: usize,
    kind: ChartKind,
) -> Result<Prepared> {
    let aggregated = aggregate_selection(table, selection)?;
    let color_by = selection.effective_color_by();
    let colors = assign_colors(&aggregated, color_by, palettes, color_steps)?;
    let series = build_series(&aggregated, &colors, color_by, kind)?;
    info!(
        "prepared {} rows into {} series ({:?} colors)",
        aggregated.table.len(),
        series.len(),
        colors.policy
    );
    Ok(Prepared {
        x_label: axis_label(&aggregated.x),
        y_label: axis_label(&aggregated.y),
        aggregated,
        colors,
        series,
    })
}
