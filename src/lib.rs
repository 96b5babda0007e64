//! salmon_signals
//!
//! Aggregation and chart preparation for dam-counted salmon observations. Pairs with the
//! `salmon-signals` CLI.
//!
//! ### Features
//! - Load dam count tables (CSV or JSON) with derived calendar fields and a DOY z-score
//! - Group by any columns, reduce with mean, median, sum or standard deviation
//! - Continuous or categorical series colors, deterministic draw order
//! - Render line, grouped bar and area charts to SVG/PNG
//! - Grouped summary statistics, dam site layers, CSV/JSON export
//!
//! ### Example
//! ```no_run
//! use salmon_signals::{Loader, Palettes, Selection, pipeline, viz};
//! use std::path::Path;
//!
//! let loader = Loader::new(".", vec![]);
//! let outcome = loader.load_counts(Path::new("dam_counts.csv"))?;
//! let table = outcome.table().ok_or_else(|| anyhow::anyhow!("no data"))?;
//! let selection = Selection::default();
//! let prepared = pipeline::prepare(
//!     table,
//!     &selection,
//!     &Palettes::default(),
//!     50,
//!     viz::ChartKind::Line,
//! )?;
//! let opts = viz::ChartOptions {
//!     title: selection.title("Columbia River", table),
//!     x_label: prepared.x_label.clone(),
//!     y_label: prepared.y_label.clone(),
//!     ..Default::default()
//! };
//! viz::render_chart(&prepared.series, viz::ChartKind::Line, "chinook.svg", &opts)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod aggregate;
pub mod auth;
pub mod axis;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod layers;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod preview;
pub mod regions;
pub mod selection;
pub mod series;
pub mod stats;
pub mod storage;
pub mod viz;

pub use aggregate::{AggFunc, Aggregated, Aggregation, aggregate};
pub use color::{ColorMap, Palettes, Rgb, assign_colors};
pub use config::Settings;
pub use error::{Error, Result};
pub use loader::{LoadOutcome, Loader};
pub use models::{SeriesKey, Table, Value};
pub use selection::Selection;
pub use series::{PlotSeries, build_series};
