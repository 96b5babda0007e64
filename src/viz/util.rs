//! Utility functions for visualization: colors, x-axis scales, locale-aware tick labels.

use crate::color::Rgb;
use crate::models::Value;
use crate::series::PlotSeries;
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;
use std::collections::BTreeSet;

use super::text::estimate_text_width_px;

#[inline]
pub fn to_rgba(c: Rgb) -> RGBAColor {
    RGBColor(c.0, c.1, c.2).to_rgba()
}

/// How x values map onto the horizontal axis.
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Numeric,
    /// Days since CE, labelled as `%Y-%m-%d`.
    Date,
    /// Text (or mixed) values at positions 0, 1, 2, ... in sorted order.
    Categorical(Vec<Value>),
}

impl XScale {
    pub fn from_series(series: &[PlotSeries]) -> Self {
        let xs = || series.iter().flat_map(|s| s.points.iter().map(|(x, _)| x));
        if xs().all(|x| x.as_f64().is_some()) {
            XScale::Numeric
        } else if xs().all(|x| matches!(x, Value::Date(_))) {
            XScale::Date
        } else {
            let distinct: BTreeSet<&Value> = xs().collect();
            XScale::Categorical(distinct.into_iter().cloned().collect())
        }
    }

    pub fn position(&self, x: &Value) -> Option<f64> {
        match self {
            XScale::Numeric | XScale::Date => x.as_scalar(),
            XScale::Categorical(cats) => cats.iter().position(|c| c == x).map(|i| i as f64),
        }
    }

    pub fn label(&self, pos: f64) -> String {
        match self {
            XScale::Numeric => {
                if (pos - pos.round()).abs() < 1e-9 {
                    format!("{}", pos.round() as i64)
                } else {
                    format!("{pos:.2}")
                }
            }
            XScale::Date => NaiveDate::from_num_days_from_ce_opt(pos.round() as i32)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            XScale::Categorical(cats) => {
                let i = pos.round();
                if (pos - i).abs() > 1e-6 || i < 0.0 {
                    return String::new();
                }
                cats.get(i as usize).map(|v| v.to_string()).unwrap_or_default()
            }
        }
    }

    /// Sensible number of tick labels for this scale.
    pub fn label_count(&self, span: f64) -> usize {
        match self {
            XScale::Categorical(cats) => cats.len().clamp(1, 24),
            _ => ((span as usize) + 1).clamp(2, 12),
        }
    }
}

/// Smallest gap between distinct positions (1.0 when fewer than two).
pub fn min_spacing(positions: &[f64]) -> f64 {
    let mut p: Vec<f64> = positions.to_vec();
    p.sort_by(f64::total_cmp);
    p.dedup();
    let gap = p
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);
    if gap.is_finite() { gap } else { 1.0 }
}

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `de`, `fr`, `es`, `it`, `pt`, `nl`.
/// Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en,
    }
}

/// Tick label: grouped thousands for large magnitudes, a few decimals for small ones.
pub fn format_tick(v: f64, locale: &Locale) -> String {
    let a = v.abs();
    if a >= 1000.0 {
        (v.round() as i64).to_formatted_string(locale)
    } else if a >= 100.0 || (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else if a >= 10.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Left label area width (px) that fits the widest y tick label.
pub fn compute_left_label_area_px(
    ymin: f64,
    ymax: f64,
    ticks: usize,
    font_px: u32,
    locale: &Locale,
) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 { 0.0 } else { i as f64 / ticks as f64 };
        let s = format_tick(ymin + (ymax - ymin) * t, locale);
        max_px = max_px.max(estimate_text_width_px(&s, font_px));
    }
    max_px.saturating_add(18).clamp(48, 140)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_labels_group_thousands_per_locale() {
        assert_eq!(format_tick(30000.0, map_locale("en")), "30,000");
        assert_eq!(format_tick(30000.0, map_locale("de")), "30.000");
        assert_eq!(format_tick(12.0, map_locale("en")), "12");
        assert_eq!(format_tick(0.25, map_locale("en")), "0.25");
    }

    #[test]
    fn spacing_of_positions() {
        assert_eq!(min_spacing(&[1.0, 3.0, 4.0, 4.0]), 1.0);
        assert_eq!(min_spacing(&[5.0]), 1.0);
        assert_eq!(min_spacing(&[0.0, 7.0, 14.0]), 7.0);
    }
}
