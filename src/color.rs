//! Series color assignment: continuous interpolation, categorical palette, or
//! first-appearance order.

use crate::aggregate::Aggregated;
use crate::error::{Error, Result};
use crate::models::{SeriesKey, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Default number of discrete interpolation levels for continuous color-by columns.
pub const DEFAULT_COLOR_STEPS: usize = 50;

/// 5-stop sequential palette for continuous color-by columns.
pub const SEQUENTIAL5: [&str; 5] = ["#440154", "#3B528B", "#21918C", "#5EC962", "#FDE725"];

/// Qualitative palette for categorical color-by columns (one hue per Columbia/Snake site).
pub const DAM_PALETTE: [&str; 17] = [
    "#01295F", "#321129", "#41EAD4", "#E60049", "#0BB4FF", "#50E991", "#E6D800", "#9B19F5",
    "#FFA300", "#DC0AB4", "#B3D4FF", "#00BFA0", "#1A53FF", "#FDCCE5", "#32462F", "#9B8C6F",
    "#A5BE00",
];

/// Fixed dam colors, so a site keeps its hue whichever other sites are shown.
pub const DAM_COLORS: [(&str, &str); 17] = [
    ("Pacific", "#01295F"),
    ("Willapa Bay", "#321129"),
    ("Columbia Mouth", "#41EAD4"),
    ("Willamette", "#E60049"),
    ("Bonneville", "#0BB4FF"),
    ("Dalles", "#50E991"),
    ("John Day", "#E6D800"),
    ("McNary", "#9B19F5"),
    ("Ice Harbor", "#FFA300"),
    ("Lower Monumental", "#DC0AB4"),
    ("Little Goose", "#B3D4FF"),
    ("Lower Granite", "#00BFA0"),
    ("Priest Rapids", "#1A53FF"),
    ("Wannapum", "#FDCCE5"),
    ("Rock Island", "#32462F"),
    ("Rocky Reach", "#9B8C6F"),
    ("Wells", "#A5BE00"),
];

/// Microsoft Office (2013+) chart series palette, used when nothing drives the color.
pub const OFFICE10: [&str; 10] = [
    "#4472C4", "#ED7D31", "#A5A5A5", "#FFC000", "#5B9BD5", "#70AD47", "#264478", "#9E480E",
    "#636363", "#997300",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let h = hex.trim().trim_start_matches('#');
        if h.len() != 6 || !h.is_ascii() {
            return Err(Error::InvalidColor(hex.to_string()));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&h[i..i + 2], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        Ok(Rgb(byte(0)?, byte(2)?, byte(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The palettes used by [`assign_colors`].
///
/// `named` pins a color to a categorical value; values it does not list cycle
/// through `qualitative`.
#[derive(Debug, Clone, PartialEq)]
pub struct Palettes {
    pub sequential: Vec<Rgb>,
    pub qualitative: Vec<Rgb>,
    pub default: Vec<Rgb>,
    pub named: BTreeMap<String, Rgb>,
}

impl Palettes {
    /// Build from hex strings; each palette needs at least one color. No named colors.
    pub fn from_hex(
        sequential: &[String],
        qualitative: &[String],
        default: &[String],
    ) -> Result<Self> {
        let parse = |v: &[String]| -> Result<Vec<Rgb>> {
            if v.is_empty() {
                return Err(Error::InvalidColor("<empty palette>".into()));
            }
            v.iter().map(|s| Rgb::from_hex(s)).collect()
        };
        Ok(Self {
            sequential: parse(sequential)?,
            qualitative: parse(qualitative)?,
            default: parse(default)?,
            named: BTreeMap::new(),
        })
    }

    /// Replace the named colors with `named` (value -> `#RRGGBB`).
    pub fn with_named(mut self, named: &BTreeMap<String, String>) -> Result<Self> {
        self.named = named
            .iter()
            .map(|(k, hex)| -> Result<(String, Rgb)> { Ok((k.clone(), Rgb::from_hex(hex)?)) })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Pinned color for a categorical value, if any.
    pub fn named_color(&self, value: &Value) -> Option<Rgb> {
        match value {
            Value::Null => None,
            v => self.named.get(&v.to_string()).copied(),
        }
    }

    /// Color at position `t` in [0, 1] along the sequential stops.
    pub fn interpolate(&self, t: f64) -> Rgb {
        let stops = &self.sequential;
        if stops.len() == 1 || !t.is_finite() {
            return stops[0];
        }
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (stops.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(stops.len() - 2);
        stops[i].lerp(stops[i + 1], scaled - i as f64)
    }
}

impl Default for Palettes {
    fn default() -> Self {
        // constant tables above are valid hex
        let parse = |v: &[&str]| v.iter().filter_map(|s| Rgb::from_hex(s).ok()).collect();
        Self {
            sequential: parse(&SEQUENTIAL5),
            qualitative: parse(&DAM_PALETTE),
            default: parse(&OFFICE10),
            named: DAM_COLORS
                .iter()
                .filter_map(|(name, hex)| Some((name.to_string(), Rgb::from_hex(hex).ok()?)))
                .collect(),
        }
    }
}

/// How colors were chosen for a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorPolicy {
    Continuous { min: f64, max: f64, steps: usize },
    Categorical,
    Appearance,
}

/// Series key -> color, plus the policy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub policy: ColorPolicy,
    pub colors: BTreeMap<SeriesKey, Rgb>,
}

impl ColorMap {
    pub fn get(&self, key: &SeriesKey) -> Option<Rgb> {
        self.colors.get(key).copied()
    }
}

/// Assign one color per series of `agg`.
///
/// - No `color_by`: default palette in first-appearance order, cycling.
/// - Text `color_by`: the value's named color, otherwise the qualitative palette in
///   sorted distinct-value order, cycling.
/// - Numeric/date `color_by`: min-max normalization quantized to `steps` levels, then
///   interpolated on the sequential palette. All-equal values map to its first stop.
pub fn assign_colors(
    agg: &Aggregated,
    color_by: Option<&str>,
    palettes: &Palettes,
    steps: usize,
) -> Result<ColorMap> {
    let keys = agg.series_keys();
    let Some(col) = color_by else {
        let colors = keys
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k, palettes.default[i % palettes.default.len()]))
            .collect();
        return Ok(ColorMap {
            policy: ColorPolicy::Appearance,
            colors,
        });
    };

    let idx = agg.table.column_index(col)?;
    // first value seen for each series
    let mut value_of: BTreeMap<SeriesKey, Value> = BTreeMap::new();
    for row in agg.table.rows() {
        value_of
            .entry(agg.series_key(row))
            .or_insert_with(|| row[idx].clone());
    }

    let non_null: Vec<&Value> = value_of.values().filter(|v| !v.is_null()).collect();
    let continuous = !non_null.is_empty() && non_null.iter().all(|v| v.as_scalar().is_some());

    if continuous {
        let scalars: Vec<f64> = non_null.iter().filter_map(|v| v.as_scalar()).collect();
        let min = scalars.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scalars.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        let first = palettes.sequential[0];
        let colors = value_of
            .into_iter()
            .map(|(k, v)| {
                let c = match v.as_scalar() {
                    Some(s) if span > 0.0 => {
                        let t = (s - min) / span;
                        let levels = steps.max(2) - 1;
                        let step = (t * levels as f64).round();
                        palettes.interpolate(step / levels as f64)
                    }
                    _ => first,
                };
                (k, c)
            })
            .collect();
        return Ok(ColorMap {
            policy: ColorPolicy::Continuous { min, max, steps },
            colors,
        });
    }

    // named values keep their color; the rest cycle in sorted order
    let unnamed: Vec<&Value> = non_null
        .iter()
        .copied()
        .filter(|v| palettes.named_color(v).is_none())
        .collect::<BTreeSet<&Value>>()
        .into_iter()
        .collect();
    let pal = &palettes.qualitative;
    let colors = value_of
        .iter()
        .map(|(k, v)| {
            let c = palettes.named_color(v).unwrap_or_else(|| {
                let i = unnamed.iter().position(|d| *d == v).unwrap_or(0);
                pal[i % pal.len()]
            });
            (k.clone(), c)
        })
        .collect();
    Ok(ColorMap {
        policy: ColorPolicy::Categorical,
        colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_and_errors() {
        assert_eq!(Rgb::from_hex("#0bb4ff").unwrap(), Rgb(11, 180, 255));
        assert_eq!(Rgb(11, 180, 255).to_hex(), "#0BB4FF");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn interpolation_hits_stops() {
        let p = Palettes::default();
        assert_eq!(p.interpolate(0.0), Rgb::from_hex(SEQUENTIAL5[0]).unwrap());
        assert_eq!(p.interpolate(1.0), Rgb::from_hex(SEQUENTIAL5[4]).unwrap());
        assert_eq!(p.interpolate(0.5), Rgb::from_hex(SEQUENTIAL5[2]).unwrap());
    }

    #[test]
    fn named_colors_match_dam_palette() {
        let p = Palettes::default();
        assert_eq!(p.named.len(), DAM_COLORS.len());
        for ((name, hex), pal) in DAM_COLORS.iter().zip(DAM_PALETTE) {
            assert_eq!(hex, &pal);
            assert_eq!(p.named_color(&Value::Text(name.to_string())), Rgb::from_hex(hex).ok());
        }
        assert_eq!(p.named_color(&Value::Null), None);
    }
}
