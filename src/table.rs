//! The translated, in-memory table.

use crate::error::TranslateError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One output row: the internal row id followed by the included values.
pub type Row = Vec<String>;

/// Output header plus rows in source-file order. Immutable once built.
///
/// Deserializing goes through the same empty-header check as [`Table::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Assemble a table from a finished header and the complete row sequence.
    ///
    /// # Errors
    /// [`TranslateError::EmptyHeader`] if `header` is empty.
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if header.is_empty() {
            return Err(TranslateError::EmptyHeader.into());
        }
        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take ownership of the header and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.header, self.rows)
    }
}

#[derive(Deserialize)]
struct TableParts {
    header: Vec<String>,
    rows: Vec<Row>,
}

impl TryFrom<TableParts> for Table {
    type Error = TranslateError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        if parts.header.is_empty() {
            return Err(TranslateError::EmptyHeader);
        }
        Ok(Self {
            header: parts.header,
            rows: parts.rows,
        })
    }
}
