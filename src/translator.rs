//! The translation engine.
//!
//! A [`Translator`] turns a TSV file into a [`Table`]:
//! 1. read the header line and resolve it against the column mapping
//! 2. plan line-aligned partitions over the rest of the file
//! 3. submit one parse task per partition to the scheduler, in file order,
//!    before waiting on any of them
//! 4. wait on the handles **in submission order**, appending each
//!    partition's rows
//! 5. assemble the table
//!
//! Because collection is sequential by partition index, the row order is the
//! file order no matter how many workers ran or which finished first.
//!
//! The first failing partition aborts the parse: the error is wrapped in a
//! [`PartitionContext`], tasks that have not started yet are told to stand
//! down, and no partial table is returned.
//!
//! [`Translator::parse_raw`] runs the same plan/parse/collect loop without the
//! mapping: the header and every data line come back exactly as split.

use crate::config::TranslatorConfig;
use crate::error::{is_cancelled, PartitionContext, TranslateError};
use crate::header::{read_header_line_file, ColumnFlags, IdColumn};
use crate::mapping::MappingTable;
use crate::metrics::{MetricsCollector, PARSES_FAILED};
use crate::partition::{parse_partition, PartitionStats, Projection};
use crate::planner::{plan_partitions, PartitionRange};
use crate::scheduler::{
    CancellationToken, InlineScheduler, RayonScheduler, Scheduler, Task, TaskHandle,
};
use crate::table::Table;
use crate::validation::RowPolicy;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Partitioned, concurrent TSV translator.
///
/// Holds only shared, immutable state, so one translator can run any number
/// of parses, including from several threads at once.
#[derive(Clone)]
pub struct Translator {
    scheduler: Arc<dyn Scheduler>,
    partition_size: u64,
    mapping: Arc<MappingTable>,
    row_policy: RowPolicy,
    id_column: IdColumn,
    metrics: Option<MetricsCollector>,
}

impl Translator {
    /// # Errors
    /// [`TranslateError::InvalidPartitionSize`] if `partition_size_bytes` is 0.
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        partition_size_bytes: usize,
        mapping: Arc<MappingTable>,
    ) -> Result<Self> {
        if partition_size_bytes == 0 {
            return Err(TranslateError::InvalidPartitionSize.into());
        }
        Ok(Self {
            scheduler,
            partition_size: partition_size_bytes as u64,
            mapping,
            row_policy: RowPolicy::default(),
            id_column: IdColumn::default(),
            metrics: None,
        })
    }

    /// Build a translator and its scheduler from a config.
    ///
    /// # Errors
    /// An invalid config or a thread pool that cannot be created.
    pub fn from_config(config: &TranslatorConfig, mapping: Arc<MappingTable>) -> Result<Self> {
        config.validate()?;
        let scheduler: Arc<dyn Scheduler> = if config.inline {
            Arc::new(InlineScheduler)
        } else {
            Arc::new(RayonScheduler::new(config.threads)?)
        };
        Ok(Self::new(scheduler, config.partition_size_bytes, mapping)?
            .with_row_policy(config.row_policy)
            .with_id_column(config.id_column))
    }

    #[must_use]
    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    #[must_use]
    pub fn with_id_column(mut self, layout: IdColumn) -> Self {
        self.id_column = layout;
        self
    }

    /// Record statistics of every parse into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn partition_size(&self) -> u64 {
        self.partition_size
    }

    /// Translate the file at `path`, blocking until it is fully processed.
    ///
    /// # Errors
    /// Any I/O, header, malformed-row (under [`RowPolicy::FailFast`]) or task
    /// failure. See [`TranslateError`].
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<Table> {
        self.parse_cancellable(path, &CancellationToken::new())
    }

    /// Like [`parse`](Self::parse), but gives up with
    /// [`TranslateError::Cancelled`] as soon as `cancel` fires.
    ///
    /// # Errors
    /// See [`parse`](Self::parse).
    pub fn parse_cancellable(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<Table> {
        self.run(path.as_ref(), cancel, Mode::Mapped)
    }

    /// Split the file at `path` into its header and every data line, with no
    /// mapping applied. Partitioning, ordering and row policy work exactly as
    /// in [`parse`](Self::parse).
    ///
    /// # Errors
    /// See [`parse`](Self::parse); only non-UTF-8 fields can be malformed.
    pub fn parse_raw(&self, path: impl AsRef<Path>) -> Result<Table> {
        self.parse_raw_cancellable(path, &CancellationToken::new())
    }

    /// Like [`parse_raw`](Self::parse_raw), but stops when `cancel` fires.
    ///
    /// # Errors
    /// See [`parse`](Self::parse).
    pub fn parse_raw_cancellable(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<Table> {
        self.run(path.as_ref(), cancel, Mode::Raw)
    }

    fn run(&self, path: &Path, cancel: &CancellationToken, mode: Mode) -> Result<Table> {
        let started = Instant::now();
        let result = self.collect(path, cancel, mode);
        let finished = Instant::now();
        if let Some(metrics) = &self.metrics {
            metrics.record_span(started, finished);
            match &result {
                Ok(run) => metrics.record_parse(run.partitions, &run.stats, finished - started),
                Err(_) => metrics.increment_counter(PARSES_FAILED, 1),
            }
        }
        let run = result?;
        info!(
            path = %path.display(),
            rows = run.table.len(),
            unmapped = run.stats.unmapped,
            malformed = run.stats.malformed,
            elapsed_ms = (finished - started).as_millis() as u64,
            "translated file"
        );
        Ok(run.table)
    }

    fn collect(&self, path: &Path, cancel: &CancellationToken, mode: Mode) -> Result<Run> {
        let line = read_header_line_file(path)?;
        let (header, flags, data_offset) = match mode {
            Mode::Mapped => {
                let resolved = line.resolve(&self.mapping, self.id_column);
                if resolved.header.is_empty() {
                    return Err(TranslateError::EmptyHeader.into());
                }
                (resolved.header, Some(Arc::new(resolved.flags)), resolved.data_offset)
            }
            Mode::Raw => (line.fields(), None, line.data_offset),
        };
        let ranges = plan_partitions(path, data_offset, self.partition_size)?;
        info!(
            path = %path.display(),
            bytes = ranges.last().map_or(data_offset, |r| r.end),
            columns = header.len(),
            partitions = ranges.len(),
            raw = flags.is_none(),
            "translating file"
        );

        // Tasks observe `abort`, so failing or cancelling here also stops
        // partitions that have not started yet.
        let abort = cancel.child();
        let source: Arc<Path> = Arc::from(path);
        let handles: Vec<(PartitionRange, TaskHandle)> = ranges
            .iter()
            .map(|&range| {
                let task = self.partition_task(range, &source, flags.as_ref(), &abort);
                (range, self.scheduler.submit(task))
            })
            .collect();

        let mut rows = Vec::new();
        let mut stats = PartitionStats::default();
        for (range, handle) in handles {
            let out = match handle.wait(&abort) {
                Ok(out) => out,
                Err(err) => {
                    abort.cancel();
                    if is_cancelled(&err) {
                        info!(path = %path.display(), "translation cancelled");
                        return Err(err);
                    }
                    return Err(err.context(PartitionContext {
                        index: range.index,
                        start: range.start,
                        end: range.end,
                    }));
                }
            };
            debug!(
                partition = range.index,
                start = range.start,
                end = range.end,
                rows = out.rows.len(),
                "partition collected"
            );
            stats.merge(&out.stats);
            rows.extend(out.rows);
        }

        Ok(Run {
            table: Table::new(header, rows)?,
            partitions: ranges.len(),
            stats,
        })
    }

    /// `flags: None` parses the range raw.
    fn partition_task(
        &self,
        range: PartitionRange,
        source: &Arc<Path>,
        flags: Option<&Arc<ColumnFlags>>,
        abort: &CancellationToken,
    ) -> Task {
        let source = Arc::clone(source);
        let flags = flags.map(Arc::clone);
        let mapping = Arc::clone(&self.mapping);
        let abort = abort.clone();
        let policy = self.row_policy;
        Box::new(move || {
            if abort.is_cancelled() {
                return Err(TranslateError::Cancelled.into());
            }
            let projection = match &flags {
                Some(flags) => Projection::Mapped {
                    flags: &**flags,
                    mapping: &*mapping,
                },
                None => Projection::Raw,
            };
            parse_partition(&source, range, projection, policy)
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Mapped,
    Raw,
}

struct Run {
    table: Table,
    partitions: usize,
    stats: PartitionStats,
}
