//! Public types and constants for the visualization module.

use std::path::PathBuf;

/// Legend placement options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendMode {
    /// Overlay legend inside the plotting area (may overlap data).
    Inside,
    /// Separate, non-overlapping legend panel on the right side.
    #[default]
    Right,
    /// Separate, non-overlapping legend band at the bottom.
    Bottom,
}

impl LegendMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inside" => Some(LegendMode::Inside),
            "right" => Some(LegendMode::Right),
            "bottom" => Some(LegendMode::Bottom),
            _ => None,
        }
    }
}

/// Chart types offered by the analysis view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    /// One line per series (default).
    #[default]
    Line,
    /// Grouped bars per x value.
    Bar,
    /// Overlapping filled areas from the baseline, largest total drawn first.
    Area,
    /// No chart; raw preview of the loaded rows.
    Table,
}

/// Everything the renderer needs besides the series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub legend: LegendMode,
    /// Locale tag for y tick labels (`en`, `de`, ...).
    pub locale: String,
    /// TrueType font to register before drawing text.
    pub font: Option<PathBuf>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            width: 1000,
            height: 600,
            legend: LegendMode::default(),
            locale: "en".into(),
            font: None,
        }
    }
}
