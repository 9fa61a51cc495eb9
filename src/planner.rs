//! Partition planning: split the data section of a file into line-aligned
//! byte ranges.
//!
//! Starting at the first data byte, each partition takes `target_size` bytes
//! and then extends forward to the next `\n` (inclusive) or end of file. The
//! extension is unconditional, so a line is never split between two
//! partitions; a single line longer than `target_size` simply produces one
//! oversized partition.
//!
//! Ranges are contiguous, non-overlapping and together cover exactly
//! `[data_offset, file_len)`.

use crate::error::TranslateError;
use crate::header::LINE_TERMINATOR;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// A contiguous byte range `[start, end)` of the input, handed to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionRange {
    /// Position of this range in file order.
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl PartitionRange {
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Plan partitions over any seekable source of known length.
///
/// `len` is the total length of the source; `data_offset` is where the first
/// data line starts.
///
/// # Errors
/// [`TranslateError::InvalidPartitionSize`] when `target_size` is zero, or any
/// I/O error from seeking/reading.
pub fn plan_ranges<R: Read + Seek>(
    src: R,
    len: u64,
    data_offset: u64,
    target_size: u64,
) -> Result<Vec<PartitionRange>> {
    if target_size == 0 {
        return Err(TranslateError::InvalidPartitionSize.into());
    }
    let mut rdr = BufReader::new(src);
    let mut ranges = Vec::new();
    let mut start = data_offset;
    while start < len {
        let target = start.saturating_add(target_size);
        let end = if target >= len {
            len
        } else {
            rdr.seek(SeekFrom::Start(target))?;
            let skipped = rdr.skip_until(LINE_TERMINATOR)? as u64;
            (target + skipped).min(len)
        };
        ranges.push(PartitionRange {
            index: ranges.len(),
            start,
            end,
        });
        start = end;
    }
    Ok(ranges)
}

/// Plan partitions over a file on disk.
///
/// # Errors
/// See [`plan_ranges`]; open and metadata failures carry the path.
pub fn plan_partitions(
    path: impl AsRef<Path>,
    data_offset: u64,
    target_size: u64,
) -> Result<Vec<PartitionRange>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = f
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    plan_ranges(f, len, data_offset, target_size)
        .with_context(|| format!("plan partitions of {}", path.display()))
}
