use crate::models::Table;
use anyhow::Result;
use csv::WriterBuilder;
use serde_json::{Map, Value as Json};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save a table as CSV with header.
pub fn save_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a table as a pretty JSON array of objects keyed by column name.
pub fn save_json<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let records: Vec<Map<String, Json>> = table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(c, v)| Ok((c.clone(), serde_json::to_value(v)?)))
                .collect::<Result<_>>()
        })
        .collect::<Result<_>>()?;
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&records)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
