//! Header resolution: output header and per-column inclusion flags.

use crate::error::TranslateError;
use crate::mapping::MappingTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub(crate) const FIELD_SEPARATOR: char = '\t';
pub(crate) const LINE_TERMINATOR: u8 = b'\n';

/// How the header line relates to the id field of each data row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdColumn {
    /// The header names every field, including the id field at position 0.
    /// Header column `i` describes data field `i`.
    #[default]
    Named,
    /// The header names only the value fields. Header column `j` describes
    /// data field `j + 1`.
    Unnamed,
}

/// Per-input-field inclusion flags, indexed by data field position.
///
/// Computed once per parse and shared read-only by every partition task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnFlags {
    flags: Box<[bool]>,
    required: usize,
}

impl ColumnFlags {
    pub fn new(flags: Vec<bool>) -> Self {
        let required = flags.iter().rposition(|&f| f).map_or(1, |i| i + 1).max(1);
        Self {
            flags: flags.into_boxed_slice(),
            required,
        }
    }

    /// Whether data field `index` is carried into the output. Fields past the
    /// end of the flag set are never included.
    #[inline]
    pub fn is_included(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// Minimum number of fields a data row needs for projection.
    #[inline]
    pub fn required_fields(&self) -> usize {
        self.required
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of `true` flags.
    pub fn included_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }
}

/// Result of reading and resolving a file's header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    /// Internal names of the included columns, in input order.
    pub header: Vec<String>,
    pub flags: ColumnFlags,
    /// Byte offset of the first data line.
    pub data_offset: u64,
}

/// Project a header line through the column mapping.
///
/// Returns the output header and the inclusion flags indexed by data field.
pub fn resolve_header(
    line: &str,
    mapping: &MappingTable,
    layout: IdColumn,
) -> (Vec<String>, ColumnFlags) {
    let mut header = Vec::new();
    let mut flags = match layout {
        IdColumn::Named => Vec::new(),
        IdColumn::Unnamed => vec![false],
    };
    for name in line.split(FIELD_SEPARATOR) {
        match mapping.column(name) {
            Some(internal) => {
                flags.push(true);
                header.push(internal.to_string());
            }
            None => flags.push(false),
        }
    }
    (header, ColumnFlags::new(flags))
}

/// The first line of a file, before any mapping is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    /// Line text without the terminator.
    pub text: String,
    /// Byte offset of the first data line.
    pub data_offset: u64,
}

impl HeaderLine {
    /// The header names exactly as they appear in the file.
    pub fn fields(&self) -> Vec<String> {
        self.text.split(FIELD_SEPARATOR).map(str::to_string).collect()
    }

    /// Project through the column mapping.
    pub fn resolve(self, mapping: &MappingTable, layout: IdColumn) -> ResolvedHeader {
        let (header, flags) = resolve_header(&self.text, mapping, layout);
        ResolvedHeader {
            header,
            flags,
            data_offset: self.data_offset,
        }
    }
}

/// Read the first line of `rdr`.
///
/// # Errors
/// [`TranslateError::EmptyInput`] when there is no header line,
/// [`TranslateError::InvalidHeader`] when it is not UTF-8, or the underlying
/// I/O error.
pub fn read_header_line<R: Read>(rdr: R) -> Result<HeaderLine> {
    let mut rdr = BufReader::new(rdr);
    let mut buf = Vec::new();
    let n = rdr.read_until(LINE_TERMINATOR, &mut buf)?;
    if n == 0 {
        return Err(TranslateError::EmptyInput.into());
    }
    if buf.last() == Some(&LINE_TERMINATOR) {
        buf.pop();
    }
    let text = String::from_utf8(buf).map_err(|_| TranslateError::InvalidHeader)?;
    Ok(HeaderLine {
        text,
        data_offset: n as u64,
    })
}

/// [`read_header_line`] for a file on disk.
///
/// # Errors
/// See [`read_header_line`]; open failures carry the path.
pub fn read_header_line_file(path: impl AsRef<Path>) -> Result<HeaderLine> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_header_line(f).with_context(|| format!("read header of {}", path.display()))
}

/// Read the first line of `rdr` and resolve it.
///
/// # Errors
/// See [`read_header_line`].
pub fn read_header<R: Read>(
    rdr: R,
    mapping: &MappingTable,
    layout: IdColumn,
) -> Result<ResolvedHeader> {
    Ok(read_header_line(rdr)?.resolve(mapping, layout))
}

/// [`read_header`] for a file on disk.
///
/// # Errors
/// See [`read_header_line`]; open failures carry the path.
pub fn read_header_file(
    path: impl AsRef<Path>,
    mapping: &MappingTable,
    layout: IdColumn,
) -> Result<ResolvedHeader> {
    Ok(read_header_line_file(path)?.resolve(mapping, layout))
}
