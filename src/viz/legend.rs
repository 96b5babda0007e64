//! Legend layout and drawing for external legend placement.

use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::{estimate_text_width_px, truncate_to_width, wrap_text_to_width};
use super::types::LegendMode;

// Layout constants shared by the estimator and the painter.
const FONT_PX: u32 = 14;
const LINE_H: i32 = FONT_PX as i32 + 2;
const ROW_GAP: i32 = 4;
const PAD: i32 = 8;
const SWATCH: i32 = 10;
const SWATCH_GAP: i32 = 8;
const TRAILING_GAP: i32 = 16;
/// Widest label cell in a bottom band, as a fraction of the band.
const MAX_CELL_FRACTION: f32 = 0.45;

fn cell_width(label: &str, cap_px: i32) -> i32 {
    let text_w = estimate_text_width_px(label, FONT_PX) as i32;
    SWATCH + SWATCH_GAP + text_w.min(cap_px) + TRAILING_GAP
}

/// Greedy flow of labels into rows for a band starting at `start_x` and `total_w` wide.
fn flow_rows(labels: &[String], start_x: i32, total_w: i32) -> Vec<Vec<usize>> {
    let cap = ((total_w - start_x) as f32 * MAX_CELL_FRACTION).max(80.0) as i32;
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut cur: Vec<usize> = Vec::new();
    let mut x = start_x;
    for (i, label) in labels.iter().enumerate() {
        let w = cell_width(label, cap);
        if x + w > total_w - PAD && !cur.is_empty() {
            rows.push(std::mem::take(&mut cur));
            x = start_x;
        }
        x += w;
        cur.push(i);
    }
    if !cur.is_empty() {
        rows.push(cur);
    }
    rows
}

/// Height in pixels the bottom legend band needs to fit every label.
pub fn estimate_bottom_legend_height_px(labels: &[String], start_x: i32, total_w: i32) -> i32 {
    let rows = flow_rows(labels, start_x, total_w).len().max(1) as i32;
    2 * PAD + rows * LINE_H + (rows - 1) * ROW_GAP
}

fn swatch<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x: i32,
    y_center: i32,
    color: &RGBAColor,
) -> Result<()> {
    let half = SWATCH / 2;
    area.draw(&Rectangle::new(
        [(x, y_center - half), (x + SWATCH, y_center + half)],
        color.filled(),
    ))
    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(())
}

/// Draw the legend panel: Right is a single wrapped column, Bottom a flowing band aligned
/// with the plot's x axis start.
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBAColor)],
    placement: LegendMode,
    axis_x_start_px: i32,
) -> Result<()> {
    legend_area
        .fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let (w_u32, h_u32) = legend_area.dim_in_pixel();
    let (w, h) = (w_u32 as i32, h_u32 as i32);
    let style: TextStyle =
        TextStyle::from((FontFamily::SansSerif, FONT_PX)).pos(Pos::new(HPos::Left, VPos::Center));

    match placement {
        LegendMode::Right => {
            let text_x = PAD + SWATCH + SWATCH_GAP;
            let max_text_w = (w - text_x - PAD).max(40) as u32;
            let mut y = 2 * PAD;
            for (label, color) in items {
                let lines = wrap_text_to_width(label, FONT_PX, max_text_w);
                let block_h = lines.len().max(1) as i32 * LINE_H;
                if y + block_h > h {
                    break;
                }
                swatch(legend_area, PAD, y + LINE_H / 2, color)?;
                for (i, line) in lines.iter().enumerate() {
                    let cy = y + i as i32 * LINE_H + LINE_H / 2;
                    legend_area
                        .draw(&Text::new(line.as_str(), (text_x, cy), style.clone()))
                        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                }
                y += block_h + ROW_GAP;
            }
        }
        LegendMode::Bottom => {
            let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
            let cap = ((w - axis_x_start_px) as f32 * MAX_CELL_FRACTION).max(80.0) as i32;
            let mut y = PAD + LINE_H / 2;
            for row in flow_rows(&labels, axis_x_start_px, w) {
                let mut x = axis_x_start_px;
                for i in row {
                    let (label, color) = &items[i];
                    swatch(legend_area, x, y, color)?;
                    let text = truncate_to_width(label, FONT_PX, cap as u32);
                    legend_area
                        .draw(&Text::new(text, (x + SWATCH + SWATCH_GAP, y), style.clone()))
                        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                    x += cell_width(label, cap);
                }
                y += LINE_H + ROW_GAP;
            }
        }
        // drawn by plotters' own series labels
        LegendMode::Inside => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_band_grows_with_rows() {
        let few: Vec<String> = vec!["Chinook".into()];
        let many: Vec<String> = (0..40).map(|i| format!("Bonneville-Chinook-{i}")).collect();
        let h1 = estimate_bottom_legend_height_px(&few, 60, 800);
        let h2 = estimate_bottom_legend_height_px(&many, 60, 800);
        assert_eq!(h1, 2 * PAD + LINE_H);
        assert!(h2 > h1);
    }
}
