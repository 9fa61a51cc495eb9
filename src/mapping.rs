//! Column and row-id mapping tables.
//!
//! A [`MappingTable`] holds two immutable lookups:
//! - the **column mapping** (external header name → internal column name), which
//!   also decides which input columns survive into the output;
//! - the **row mapping** (external row id → internal row id), which also
//!   decides which data rows survive.
//!
//! Tables are built once, wrapped in an `Arc`, and shared read-only by every
//! partition task. Mapping files are two-column TSV (`key\tvalue`, no header)
//! and are read with [`load_mapping`].

use crate::error::{MappingKind, TranslateError};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Immutable column and row-id lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    columns: HashMap<String, String>,
    rows: HashMap<String, String>,
}

impl MappingTable {
    /// Start building a mapping table. Both mappings must be supplied.
    pub fn builder() -> MappingTableBuilder {
        MappingTableBuilder::default()
    }

    /// Load both mappings from two-column TSV files.
    ///
    /// # Errors
    /// Fails if either file cannot be read or is malformed (see [`load_mapping`]).
    pub fn from_files(columns: impl AsRef<Path>, rows: impl AsRef<Path>) -> Result<Self> {
        let columns = load_mapping(columns).context("load column mapping")?;
        let rows = load_mapping(rows).context("load row mapping")?;
        MappingTable::builder()
            .column_mapping(columns)
            .row_mapping(rows)
            .build()
    }

    /// Internal column name for an external header, if the column is kept.
    #[inline]
    pub fn column(&self, external: &str) -> Option<&str> {
        self.columns.get(external).map(String::as_str)
    }

    /// Internal row id for an external row id, if the row is kept.
    #[inline]
    pub fn row(&self, external: &str) -> Option<&str> {
        self.rows.get(external).map(String::as_str)
    }

    pub fn column_mapping(&self) -> &HashMap<String, String> {
        &self.columns
    }

    pub fn row_mapping(&self) -> &HashMap<String, String> {
        &self.rows
    }

    /// Wrap in an `Arc` for sharing with a [`Translator`](crate::Translator).
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Builder for [`MappingTable`].
#[derive(Debug, Default, Clone)]
pub struct MappingTableBuilder {
    columns: Option<HashMap<String, String>>,
    rows: Option<HashMap<String, String>>,
}

impl MappingTableBuilder {
    /// External column name → internal column name.
    #[must_use]
    pub fn column_mapping<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.columns = Some(
            mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// External row id → internal row id.
    #[must_use]
    pub fn row_mapping<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.rows = Some(
            mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// # Errors
    /// Returns [`TranslateError::MissingMapping`] if either mapping was not set.
    pub fn build(self) -> Result<MappingTable> {
        let columns = self
            .columns
            .ok_or(TranslateError::MissingMapping(MappingKind::Column))?;
        let rows = self
            .rows
            .ok_or(TranslateError::MissingMapping(MappingKind::Row))?;
        Ok(MappingTable { columns, rows })
    }
}

/// Read a two-column TSV mapping file into a `HashMap`.
///
/// Each non-empty line is `key\tvalue`; fields past the second are ignored.
///
/// # Errors
/// Returns an error if the file cannot be read, a line has fewer than two
/// fields ([`TranslateError::MalformedMappingLine`]), or a key repeats
/// ([`TranslateError::DuplicateKey`]).
pub fn load_mapping(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_mapping(f).with_context(|| format!("read mapping {}", path.display()))
}

/// Same as [`load_mapping`] over any reader.
///
/// # Errors
/// See [`load_mapping`].
pub fn read_mapping<R: Read>(rdr: R) -> Result<HashMap<String, String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(rdr);
    let mut out = HashMap::new();
    for rec in rdr.records() {
        let rec = rec?;
        let line = rec.position().map_or(0, |p| p.line());
        let (Some(key), Some(value)) = (rec.get(0), rec.get(1)) else {
            return Err(TranslateError::MalformedMappingLine { line }.into());
        };
        if out.insert(key.to_string(), value.to_string()).is_some() {
            return Err(TranslateError::DuplicateKey {
                key: key.to_string(),
                line,
            }
            .into());
        }
    }
    Ok(out)
}
