//! Partition parsing: turn one line-aligned byte range into output rows.
//!
//! Each call opens its own read-only file handle and maps only `[start, end)`.
//! Both are owned by the call and dropped on every return path, including
//! malformed-row failures.
//!
//! Per line, with fields `f` split on `\t`, a [`Projection::Mapped`] parse does:
//! 1. `f[0]` not in the row mapping → line dropped (counted as unmapped)
//! 2. fewer than [`ColumnFlags::required_fields`] fields, or an included field
//!    that is not UTF-8 → handled by the [`RowPolicy`]
//! 3. otherwise emit `[row_mapping[f[0]], f[i] for i >= 1 where flags[i]]`
//!
//! A [`Projection::Raw`] parse emits every line as all of its fields; only a
//! field that is not UTF-8 goes to the [`RowPolicy`].

use crate::error::TranslateError;
use crate::header::{ColumnFlags, LINE_TERMINATOR};
use crate::mapping::MappingTable;
use crate::planner::PartitionRange;
use crate::table::Row;
use crate::validation::{RowPolicy, Verdict};
use anyhow::{Context, Result};
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;

const FIELD_SEPARATOR: u8 = b'\t';

/// Counters gathered while parsing one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionStats {
    pub bytes: u64,
    pub lines: u64,
    pub unmapped: u64,
    pub malformed: u64,
    pub emitted: u64,
}

impl PartitionStats {
    pub fn merge(&mut self, other: &PartitionStats) {
        self.bytes += other.bytes;
        self.lines += other.lines;
        self.unmapped += other.unmapped;
        self.malformed += other.malformed;
        self.emitted += other.emitted;
    }
}

/// How data lines become output rows.
#[derive(Debug, Clone, Copy)]
pub enum Projection<'a> {
    /// Remap the row id and keep the flagged fields; unmapped rows are dropped.
    Mapped {
        flags: &'a ColumnFlags,
        mapping: &'a MappingTable,
    },
    /// Keep every line with all of its fields.
    Raw,
}

/// Rows produced by one partition, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionOutput {
    pub rows: Vec<Row>,
    pub stats: PartitionStats,
}

/// Parse the partition `range` of the file at `path`.
///
/// # Errors
/// I/O failures opening or mapping the file, or a malformed row under
/// [`RowPolicy::FailFast`].
pub fn parse_partition(
    path: &Path,
    range: PartitionRange,
    projection: Projection<'_>,
    policy: RowPolicy,
) -> Result<PartitionOutput> {
    if range.is_empty() {
        return Ok(PartitionOutput::default());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = usize::try_from(range.len()).context("partition does not fit in memory")?;
    // SAFETY: the mapping is read-only and private to this call; the input is
    // not expected to change while a parse is running.
    let view = unsafe {
        MmapOptions::new()
            .offset(range.start)
            .len(len)
            .map(&file)
            .with_context(|| {
                format!(
                    "map bytes {}..{} of {}",
                    range.start,
                    range.end,
                    path.display()
                )
            })?
    };
    parse_bytes(&view, range.start, projection, policy)
}

/// Parse an in-memory slice of data lines. `base_offset` is the absolute file
/// offset of `data[0]`, used in error messages.
///
/// # Errors
/// A malformed row under [`RowPolicy::FailFast`].
pub fn parse_bytes(
    data: &[u8],
    base_offset: u64,
    projection: Projection<'_>,
    policy: RowPolicy,
) -> Result<PartitionOutput> {
    let mut out = PartitionOutput::default();
    out.stats.bytes = data.len() as u64;
    let mut fields: Vec<&[u8]> = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let line_end = data[pos..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR)
            .map_or(data.len(), |i| pos + i);
        let line = &data[pos..line_end];
        let offset = base_offset + pos as u64;
        pos = line_end + 1;
        out.stats.lines += 1;

        fields.clear();
        fields.extend(line.split(|&b| b == FIELD_SEPARATOR));

        let projected = match projection {
            Projection::Mapped { flags, mapping } => {
                // Mapping keys are UTF-8, so an id that isn't can never match.
                let Some(id) = std::str::from_utf8(fields[0])
                    .ok()
                    .and_then(|raw| mapping.row(raw))
                else {
                    out.stats.unmapped += 1;
                    continue;
                };
                project(id, &fields, flags, offset)
            }
            Projection::Raw => split_all(&fields, offset),
        };

        match projected {
            Ok(row) => {
                out.rows.push(row);
                out.stats.emitted += 1;
            }
            Err(err) => match policy.judge(err) {
                Verdict::Skip => out.stats.malformed += 1,
                Verdict::Fail(err) => return Err(err.into()),
            },
        }
    }
    Ok(out)
}

fn project(
    id: &str,
    fields: &[&[u8]],
    flags: &ColumnFlags,
    offset: u64,
) -> Result<Row, TranslateError> {
    let expected = flags.required_fields();
    if fields.len() < expected {
        return Err(TranslateError::MalformedRow {
            offset,
            expected,
            found: fields.len(),
        });
    }
    let mut row = Vec::with_capacity(flags.included_count() + 1);
    row.push(id.to_string());
    for (i, raw) in fields.iter().enumerate().skip(1) {
        if !flags.is_included(i) {
            continue;
        }
        let value = std::str::from_utf8(raw)
            .map_err(|_| TranslateError::InvalidUtf8Row { offset, field: i })?;
        row.push(value.to_string());
    }
    Ok(row)
}

fn split_all(fields: &[&[u8]], offset: u64) -> Result<Row, TranslateError> {
    fields
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            std::str::from_utf8(raw)
                .map(str::to_string)
                .map_err(|_| TranslateError::InvalidUtf8Row { offset, field: i })
        })
        .collect()
}
