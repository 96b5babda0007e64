//! TOML settings: data paths, chart defaults, palettes and credentials.

use crate::color::{
    DAM_COLORS, DAM_PALETTE, DEFAULT_COLOR_STEPS, OFFICE10, Palettes, SEQUENTIAL5,
};
use crate::viz::LegendMode;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "salmon-signals";
/// Looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_FILE: &str = "salmon-signals.toml";

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub chart: ChartConfig,
    pub palette: PaletteConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Directory that relative data paths are resolved against.
    pub base_dir: PathBuf,
    /// Extra directories (relative to `base_dir`) searched when a file is not found.
    pub fallback_dirs: Vec<PathBuf>,
    /// Dam count dataset (CSV or JSON).
    pub counts: PathBuf,
    /// Dam point layer (GeoJSON); optional.
    pub dams: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            fallback_dirs: vec![PathBuf::from("..")],
            counts: PathBuf::from("data/processed/FPC_DAM_COUNTS/dam_counts.csv"),
            dams: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// `right`, `bottom` or `inside`.
    pub legend: String,
    /// Locale tag for tick labels (`en`, `de`, ...).
    pub locale: String,
    /// Discrete interpolation levels for continuous color-by columns.
    pub color_steps: usize,
    /// TrueType font to register for chart text.
    pub font: Option<PathBuf>,
    /// Rows shown by the table view.
    pub preview_rows: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            legend: "right".into(),
            locale: "en".into(),
            color_steps: DEFAULT_COLOR_STEPS,
            font: None,
            preview_rows: crate::preview::PREVIEW_ROWS,
        }
    }
}

impl ChartConfig {
    pub fn legend_mode(&self) -> LegendMode {
        LegendMode::parse(&self.legend).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
    pub sequential: Vec<String>,
    pub qualitative: Vec<String>,
    pub default: Vec<String>,
    /// `[palette.named]`: categorical value -> fixed color.
    pub named: BTreeMap<String, String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let own = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        Self {
            sequential: own(&SEQUENTIAL5),
            qualitative: own(&DAM_PALETTE),
            default: own(&OFFICE10),
            named: DAM_COLORS
                .iter()
                .map(|(name, hex)| (name.to_string(), hex.to_string()))
                .collect(),
        }
    }
}

impl PaletteConfig {
    pub fn palettes(&self) -> Result<Palettes> {
        Palettes::from_hex(&self.sequential, &self.qualitative, &self.default)
            .and_then(|p| p.with_named(&self.named))
            .context("invalid [palette] configuration")
    }
}

/// Username -> lowercase hex SHA-256 of the password. Empty disables the login gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub users: BTreeMap<String, String>,
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.users.is_empty()
    }
}

impl Settings {
    /// Parse settings from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse settings")
    }

    /// Read one settings file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// Explicit path, else `./salmon-signals.toml`, else the user config dir, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::from_path(p);
        }
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(APP_NAME).join("config.toml"));
        }
        for c in candidates {
            if c.is_file() {
                debug!("using config {}", c.display());
                return Self::from_path(&c);
            }
        }
        Ok(Self::default())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }
}
