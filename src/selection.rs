//! The user's axis / grouping / filter choices and the options offered for them.

use crate::aggregate::{AggFunc, Aggregated, Aggregation, aggregate};
use crate::error::{Error, Result};
use crate::models::{Table, columns};
use std::collections::BTreeSet;

/// Value columns; never offered as x-axis candidates.
const VALUE_COLUMNS: &[&str] = &[columns::COUNT, columns::DOY_ZSCORE];
/// Attribute columns that never make sense as a grouping level.
const NON_GROUP_COLUMNS: &[&str] = &[columns::LAT, columns::LON, columns::TYPE, columns::GEOMETRY];

/// X-axis candidates: `DOY` first (when present), then every non-value column.
pub fn x_axis_options(table: &Table) -> Vec<String> {
    let mut out = Vec::new();
    if table.has_column(columns::DOY) {
        out.push(columns::DOY.to_string());
    }
    out.extend(
        table
            .columns()
            .iter()
            .filter(|c| !VALUE_COLUMNS.contains(&c.as_str()) && c.as_str() != columns::DOY)
            .cloned(),
    );
    out
}

/// Y-axis candidates present in the table.
pub fn y_axis_options(table: &Table) -> Vec<String> {
    VALUE_COLUMNS
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| c.to_string())
        .collect()
}

/// Columns that may be used as grouping levels.
pub fn group_by_options(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| !NON_GROUP_COLUMNS.contains(&c.as_str()))
        .cloned()
        .collect()
}

/// Everything the analysis controls decide.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub x: String,
    pub y: String,
    /// When false, every group-by option is a key and nothing is reduced.
    pub aggregate: bool,
    pub group_by: Vec<String>,
    /// `None` means an unrecognized function name: rows pass through unreduced.
    pub func: Option<AggFunc>,
    pub color_by: Option<String>,
    /// Allowed `SPECIES` values; `None` keeps all.
    pub species: Option<BTreeSet<String>>,
    /// Allowed `LOCATION` values; `None` keeps all.
    pub locations: Option<BTreeSet<String>>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            x: columns::DOY.to_string(),
            y: columns::COUNT.to_string(),
            aggregate: true,
            group_by: vec![columns::SPECIES.to_string()],
            func: Some(AggFunc::Mean),
            color_by: None,
            species: None,
            locations: None,
        }
    }
}

impl Selection {
    /// Grouping columns actually used, after the aggregate toggle.
    pub fn effective_group_by(&self, table: &Table) -> Vec<String> {
        if self.aggregate {
            self.group_by.clone()
        } else {
            group_by_options(table)
        }
    }

    /// Color-by column actually used; the aggregate toggle off disables it.
    pub fn effective_color_by(&self) -> Option<&str> {
        if self.aggregate {
            self.color_by.as_deref()
        } else {
            None
        }
    }

    /// Rows of `table` that pass the species / location filters.
    pub fn filter(&self, table: &Table) -> Result<Table> {
        let mut out = table.clone();
        for (col, allowed) in [
            (columns::SPECIES, &self.species),
            (columns::LOCATION, &self.locations),
        ] {
            if let Some(allowed) = allowed {
                let idx = out.column_index(col)?;
                out.retain(|row| allowed.contains(&row[idx].to_string()));
            }
        }
        Ok(out)
    }

    /// Filter, then aggregate according to the selection.
    pub fn apply(&self, table: &Table) -> Result<Aggregated> {
        let group_by = self.effective_group_by(table);
        if let Some(c) = self.effective_color_by() {
            if !group_by.iter().any(|g| g == c) {
                return Err(Error::InvalidColumn {
                    column: c.to_string(),
                    available: group_by,
                });
            }
        }
        let filtered = self.filter(table)?;
        let plan = Aggregation {
            x: self.x.clone(),
            y: self.y.clone(),
            group_by,
            func: if self.aggregate { self.func } else { None },
        };
        aggregate(&filtered, &plan)
    }

    /// Chart title, e.g. `Columbia River Dam Analysis: SPECIES by LOCATION, SPECIES over DOY`.
    pub fn title(&self, region_title: &str, table: &Table) -> String {
        let mut groups: Vec<String> = self
            .effective_group_by(table)
            .iter()
            .map(|g| g.to_uppercase())
            .collect();
        groups.sort();
        format!(
            "{region_title} Dam Analysis: SPECIES by {} over {}",
            groups.join(", "),
            self.x.to_uppercase()
        )
    }
}
