//! Temporary input and mapping files for tests.

use crate::mapping::MappingTable;
use crate::scheduler::{InlineScheduler, RayonScheduler};
use crate::translator::Translator;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Builder for an input TSV file plus its column and row mapping files.
///
/// The files live in a [`TempDir`] removed when the fixture is dropped.
pub struct TsvFixture {
    dir: TempDir,
    content: Vec<u8>,
    columns: Vec<(String, String)>,
    rows: Vec<(String, String)>,
    trailing_newline: bool,
}

impl TsvFixture {
    /// # Errors
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create fixture dir")?,
            content: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            trailing_newline: true,
        })
    }

    #[must_use]
    pub fn header(self, names: &[&str]) -> Self {
        self.line(names)
    }

    /// Append one record, tab joined and newline terminated.
    #[must_use]
    pub fn line(mut self, fields: &[&str]) -> Self {
        self.content.extend_from_slice(fields.join("\t").as_bytes());
        self.content.push(b'\n');
        self
    }

    /// Append already formatted bytes verbatim.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.content.extend_from_slice(bytes);
        self
    }

    /// Drop the final `\n` when writing the input file.
    #[must_use]
    pub fn without_trailing_newline(mut self) -> Self {
        self.trailing_newline = false;
        self
    }

    #[must_use]
    pub fn column_mapping(mut self, pairs: &[(&str, &str)]) -> Self {
        self.columns = to_owned_pairs(pairs);
        self
    }

    #[must_use]
    pub fn row_mapping(mut self, pairs: &[(&str, &str)]) -> Self {
        self.rows = to_owned_pairs(pairs);
        self
    }

    /// Write `input.tsv`, `columns.tsv` and `rows.tsv`.
    ///
    /// # Errors
    /// Returns an error if any file cannot be written.
    pub fn write(mut self) -> Result<Self> {
        if !self.trailing_newline && self.content.last() == Some(&b'\n') {
            self.content.pop();
        }
        fs::write(self.input(), &self.content).context("write fixture input")?;
        fs::write(self.columns_path(), join_pairs(&self.columns))
            .context("write fixture column mapping")?;
        fs::write(self.rows_path(), join_pairs(&self.rows)).context("write fixture row mapping")?;
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("input.tsv")
    }

    pub fn columns_path(&self) -> PathBuf {
        self.dir.path().join("columns.tsv")
    }

    pub fn rows_path(&self) -> PathBuf {
        self.dir.path().join("rows.tsv")
    }

    /// Bytes of the input file as written.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Mapping table built from the fixture's pairs (no file round trip).
    ///
    /// # Errors
    /// Never fails for a fixture; kept fallible to match [`MappingTable::builder`].
    pub fn mapping(&self) -> Result<Arc<MappingTable>> {
        Ok(MappingTable::builder()
            .column_mapping(self.columns.iter().cloned())
            .row_mapping(self.rows.iter().cloned())
            .build()?
            .into_shared())
    }

    /// Translator running on the calling thread.
    ///
    /// # Errors
    /// An invalid partition size.
    pub fn translator_inline(&self, partition_size: usize) -> Result<Translator> {
        Translator::new(Arc::new(InlineScheduler), partition_size, self.mapping()?)
    }

    /// Translator running on a dedicated pool of `threads` workers.
    ///
    /// # Errors
    /// An invalid partition size or a pool that cannot be built.
    pub fn translator_pooled(&self, partition_size: usize, threads: usize) -> Result<Translator> {
        Translator::new(
            Arc::new(RayonScheduler::new(Some(threads))?),
            partition_size,
            self.mapping()?,
        )
    }
}

/// `n` data lines of the form `id{i}\tv{i}_1\t..\tv{i}_{width - 1}`.
pub fn generated_lines(n: usize, width: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            std::iter::once(format!("id{i}"))
                .chain((1..width).map(|c| format!("v{i}_{c}")))
                .collect()
        })
        .collect()
}

fn to_owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn join_pairs(pairs: &[(String, String)]) -> String {
    pairs.iter().map(|(k, v)| format!("{k}\t{v}\n")).collect()
}
