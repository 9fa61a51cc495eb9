//! Error taxonomy for translation.
//!
//! Fallible functions in this crate return [`anyhow::Result`]. The concrete
//! failure is a [`TranslateError`] (or an I/O error with context), so callers
//! that need to branch on the kind of failure can use
//! [`anyhow::Error::downcast_ref`]:
//!
//! ```no_run
//! use tsvmap::error::TranslateError;
//! # fn check(err: anyhow::Error) {
//! if let Some(TranslateError::Cancelled) = err.downcast_ref::<TranslateError>() {
//!     // the caller asked us to stop
//! }
//! # }
//! ```
//!
//! Partition failures are wrapped in a [`PartitionContext`] so the byte range
//! of the failing partition shows up in the error chain.

use std::fmt;

/// Which half of a [`MappingTable`](crate::MappingTable) a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Column,
    Row,
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingKind::Column => write!(f, "column"),
            MappingKind::Row => write!(f, "row"),
        }
    }
}

/// Failures raised by the translation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A required mapping was not supplied when building the mapping table.
    MissingMapping(MappingKind),
    /// The target partition size must be at least one byte.
    InvalidPartitionSize,
    /// The input file has no header line.
    EmptyInput,
    /// The header line is not valid UTF-8.
    InvalidHeader,
    /// A table cannot be built without at least one output column.
    EmptyHeader,
    /// A data row has fewer fields than the inclusion flags require.
    /// `offset` is the absolute byte offset of the line.
    MalformedRow {
        offset: u64,
        expected: usize,
        found: usize,
    },
    /// An included field of a data row is not valid UTF-8.
    InvalidUtf8Row { offset: u64, field: usize },
    /// A mapping file line has fewer than two tab-separated fields.
    MalformedMappingLine { line: u64 },
    /// A mapping file repeats a key.
    DuplicateKey { key: String, line: u64 },
    /// The parse was cancelled before all partitions were collected.
    Cancelled,
    /// A partition task panicked.
    TaskPanicked(String),
    /// A partition task was dropped by its scheduler without producing a result.
    TaskLost,
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::MissingMapping(kind) => write!(f, "{kind} mapping not set"),
            TranslateError::InvalidPartitionSize => {
                write!(f, "partition size must be greater than zero")
            }
            TranslateError::EmptyInput => write!(f, "input has no header line"),
            TranslateError::InvalidHeader => write!(f, "header line is not valid UTF-8"),
            TranslateError::EmptyHeader => write!(f, "header is empty"),
            TranslateError::MalformedRow {
                offset,
                expected,
                found,
            } => write!(
                f,
                "malformed row at byte {offset}: expected at least {expected} fields, found {found}"
            ),
            TranslateError::InvalidUtf8Row { offset, field } => {
                write!(f, "malformed row at byte {offset}: field {field} is not valid UTF-8")
            }
            TranslateError::MalformedMappingLine { line } => {
                write!(f, "mapping line {line}: expected key and value separated by a tab")
            }
            TranslateError::DuplicateKey { key, line } => {
                write!(f, "mapping line {line}: duplicate key '{key}'")
            }
            TranslateError::Cancelled => write!(f, "parse cancelled"),
            TranslateError::TaskPanicked(msg) => write!(f, "partition task panicked: {msg}"),
            TranslateError::TaskLost => write!(f, "partition task finished without a result"),
        }
    }
}

impl std::error::Error for TranslateError {}

/// Context attached to errors coming out of a partition task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionContext {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl fmt::Display for PartitionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partition #{} (bytes {}..{}) failed",
            self.index, self.start, self.end
        )
    }
}

/// Returns `true` if `err` (or anything in its chain) is a cancellation.
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<TranslateError>(),
            Some(TranslateError::Cancelled)
        )
    })
}
