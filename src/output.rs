//! Writers for translated tables.
//!
//! - **TSV**: header line, then one line per row; tab separated, no quoting
//!   (the input format cannot carry tabs or newlines inside a field).
//! - **JSON Lines**: the header as a JSON array, then each row as a JSON array.

use crate::table::Table;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output encodings understood by [`write_table`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Tsv,
    Jsonl,
}

/// Write `table` as TSV.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if any record fails to write or flush.
pub fn write_table_tsv<W: Write>(table: &Table, w: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .flexible(true)
        .from_writer(w);
    wtr.write_record(table.header()).context("write TSV header")?;
    for (i, row) in table.rows().iter().enumerate() {
        wtr.write_record(row)
            .with_context(|| format!("write TSV row #{}", i + 1))?;
    }
    wtr.flush()?;
    Ok(table.len())
}

/// Write `table` as JSON Lines.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if any line fails to serialize or flush.
pub fn write_table_jsonl<W: Write>(table: &Table, w: W) -> Result<usize> {
    let mut w = BufWriter::new(w);
    serde_json::to_writer(&mut w, table.header()).context("serialize header")?;
    w.write_all(b"\n")?;
    for (i, row) in table.rows().iter().enumerate() {
        serde_json::to_writer(&mut w, row).with_context(|| format!("serialize row #{}", i + 1))?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(table.len())
}

/// Write `table` in `format` to any writer.
///
/// # Errors
/// See [`write_table_tsv`] and [`write_table_jsonl`].
pub fn write_table<W: Write>(table: &Table, format: OutputFormat, w: W) -> Result<usize> {
    match format {
        OutputFormat::Tsv => write_table_tsv(table, w),
        OutputFormat::Jsonl => write_table_jsonl(table, w),
    }
}

/// Write `table` to `path`, creating parent directories as needed.
///
/// # Errors
/// Returns an error if the file or its directories cannot be created, or if
/// writing fails.
pub fn write_table_file(
    table: &Table,
    format: OutputFormat,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_table(table, format, f).with_context(|| format!("write {}", path.display()))
}
