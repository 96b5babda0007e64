//! Chart rendering: draw prepared [`PlotSeries`] to **SVG** or **PNG**.
//!
//! - Line, grouped bar and overlapping area charts
//! - Numeric, date and categorical x axes
//! - Locale-aware y tick labels (`30,000` vs `30.000`)
//! - Legend placement: `Inside`, `Right`, `Bottom` (external legends never overlap the plot)

pub mod legend;
pub mod text;
pub mod types;
pub mod util;

pub use types::{ChartKind, ChartOptions, LegendMode};

use crate::series::PlotSeries;
use anyhow::{Result, anyhow, bail};
use log::{debug, warn};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::{AreaSeries, LineSeries};
use plotters::style::{FontFamily, FontStyle};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::OnceLock;

use legend::{draw_legend_panel, estimate_bottom_legend_height_px};
use util::{XScale, compute_left_label_area_px, format_tick, map_locale, min_spacing, to_rgba};

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Register a "sans-serif" face for the `ab_glyph` text path, which does not discover OS fonts.
///
/// The first call decides: `preferred` is tried before the system candidates. Returns whether
/// text can be drawn.
pub fn ensure_fonts_registered(preferred: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = preferred
            .into_iter()
            .map(Path::to_path_buf)
            .chain(SYSTEM_FONTS.iter().map(|p| Path::new(p).to_path_buf()));
        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if plotters::style::register_font("sans-serif", FontStyle::Normal, bytes).is_ok() {
                debug!("registered chart font {}", path.display());
                return true;
            }
        }
        warn!("no usable TrueType font found; charts are drawn without text");
        false
    })
}

/// Render `series` (already ordered and colored) to `out_path`. The extension picks the
/// backend: `.svg` for SVG, anything else for a bitmap.
pub fn render_chart<P: AsRef<Path>>(
    series: &[PlotSeries],
    kind: ChartKind,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    if kind == ChartKind::Table {
        bail!("the table view has no chart; use the table preview instead");
    }
    if series.iter().all(|s| s.points.is_empty()) {
        return Err(anyhow!("no data to plot"));
    }
    let has_text = ensure_fonts_registered(opts.font.as_deref());
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let size = (opts.width, opts.height);

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), size).into_drawing_area();
        draw_chart(root, series, kind, opts, has_text)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
        draw_chart(root, series, kind, opts, has_text)?;
    }
    debug!("wrote {} ({} series)", out_path.display(), series.len());
    Ok(())
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    series: &[PlotSeries],
    kind: ChartKind,
    opts: &ChartOptions,
    has_text: bool,
) -> Result<()>
where
    DB: DrawingBackend,
{
    const MARGIN: i32 = 16;
    const Y_LABELS: usize = 10;
    let locale = map_locale(&opts.locale);

    // 1) Positions
    let scale = XScale::from_series(series);
    let positioned: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter_map(|(x, y)| scale.position(x).map(|p| (p, *y)))
                .collect()
        })
        .collect();
    let xs: Vec<f64> = positioned.iter().flatten().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = positioned.iter().flatten().map(|(_, y)| *y).collect();
    if xs.is_empty() {
        return Err(anyhow!("no plottable x values"));
    }

    let spacing = min_spacing(&xs);
    let (mut x_min, mut x_max) = (
        xs.iter().cloned().fold(f64::INFINITY, f64::min),
        xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    if kind == ChartKind::Bar || matches!(scale, XScale::Categorical(_)) {
        x_min -= spacing / 2.0;
        x_max += spacing / 2.0;
    }
    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }

    let (mut y_min, mut y_max) = (
        ys.iter().cloned().fold(0.0f64, f64::min),
        ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    } else {
        y_max += (y_max - y_min) * 0.05;
    }

    // 2) Gutters and legend area
    let left_label_width_px = if has_text {
        compute_left_label_area_px(y_min, y_max, Y_LABELS, 12, locale)
    } else {
        MARGIN as u32
    };
    let axis_x_start_px = MARGIN + left_label_width_px as i32;
    let legend_texts: Vec<String> = series.iter().map(|s| s.label.clone()).collect();

    let (root_w_u32, root_h_u32) = root.dim_in_pixel();
    let (root_w, root_h) = (root_w_u32 as i32, root_h_u32 as i32);
    let legend = if has_text {
        opts.legend
    } else {
        LegendMode::Inside
    };

    let (plot_area, legend_area_opt): (DrawingArea<DB, Shift>, Option<DrawingArea<DB, Shift>>) =
        match legend {
            LegendMode::Right => {
                let (plot, legend) = root.split_horizontally((80).percent_width());
                (plot, Some(legend))
            }
            LegendMode::Bottom => {
                let h = estimate_bottom_legend_height_px(&legend_texts, axis_x_start_px, root_w)
                    .max(40);
                let (plot, legend) = root.split_vertically((root_h - h).max(40));
                (plot, Some(legend))
            }
            LegendMode::Inside => (root, None),
        };

    plot_area
        .fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    // 3) Chart and mesh
    let mut builder = ChartBuilder::on(&plot_area);
    builder
        .margin(MARGIN as u32)
        .set_label_area_size(LabelAreaPosition::Left, left_label_width_px)
        .set_label_area_size(LabelAreaPosition::Bottom, if has_text { 56 } else { 8 });
    let title = opts.title.trim();
    if has_text && !title.is_empty() {
        builder.caption(title, (FontFamily::SansSerif, 22));
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let x_label_fmt = |x: &f64| scale.label(*x);
    let y_label_fmt = |v: &f64| format_tick(*v, locale);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_formatter(&x_label_fmt)
            .y_label_formatter(&y_label_fmt)
            .label_style((FontFamily::SansSerif, 12))
            .axis_desc_style((FontFamily::SansSerif, 16));
        if has_text {
            mesh.x_labels(scale.label_count(x_max - x_min))
                .y_labels(Y_LABELS)
                .x_desc(opts.x_label.as_str())
                .y_desc(opts.y_label.as_str());
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }

    // 4) Series
    let inside_labels = has_text && legend == LegendMode::Inside;
    let mut legend_items: Vec<(String, RGBAColor)> = Vec::new();
    let n_series = series.len().max(1);
    let group_width = 0.8 * spacing;
    let bar_w = group_width / n_series as f64;

    for (idx, (s, pts)) in series.iter().zip(&positioned).enumerate() {
        let color = to_rgba(s.color);
        legend_items.push((s.label.clone(), color));
        let elem = match kind {
            ChartKind::Line => {
                let style = ShapeStyle {
                    color,
                    filled: false,
                    stroke_width: 2,
                };
                if pts.len() == 1 {
                    chart
                        .draw_series(pts.iter().map(|p| Circle::new(*p, 3, color.filled())))
                        .map_err(|e| anyhow::anyhow!("{:?}", e))?
                } else {
                    chart
                        .draw_series(LineSeries::new(pts.clone(), style))
                        .map_err(|e| anyhow::anyhow!("{:?}", e))?
                }
            }
            ChartKind::Bar => chart
                .draw_series(pts.iter().map(|(x, v)| {
                    let x0 = x - group_width / 2.0 + idx as f64 * bar_w;
                    Rectangle::new(
                        [(x0, 0.0f64.min(*v)), (x0 + bar_w, 0.0f64.max(*v))],
                        color.filled(),
                    )
                }))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?,
            ChartKind::Area => {
                let fill = color.mix(0.35).filled();
                let border = color.stroke_width(1);
                chart
                    .draw_series(AreaSeries::new(pts.clone(), 0.0, fill).border_style(border))
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?
            }
            ChartKind::Table => bail!("the table view has no chart"),
        };
        if inside_labels {
            elem.label(s.label.clone())
                .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
        }
    }

    // 5) Legend
    if inside_labels {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 14))
            .draw()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    } else if let Some(ref legend_area) = legend_area_opt {
        draw_legend_panel(legend_area, &legend_items, legend, axis_x_start_px)?;
    }

    plot_area
        .present()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    if let Some(ref legend_area) = legend_area_opt {
        legend_area
            .present()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}
