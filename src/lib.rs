//! # tsvmap
//!
//! A **partitioned, parallel TSV translator**. `tsvmap` reads a large
//! tab-delimited file, renames its columns and row ids through a static
//! [`MappingTable`], drops everything that is not mapped, and returns an
//! in-memory [`Table`].
//!
//! ## Key Features
//!
//! - **Line-aligned partitioning** - the file is cut into byte ranges that never
//!   split a line, each parsed from its own memory map
//! - **Bring your own scheduler** - run partitions inline, on Rayon's global pool,
//!   on a dedicated pool, or on any [`Scheduler`] you implement
//! - **Deterministic output** - rows come back in file order regardless of worker
//!   count or completion order
//! - **Explicit malformed-row policy** - fail fast, skip, or skip and log
//! - **Raw mode** - [`Translator::parse_raw`] splits every line with no mapping
//! - **Cancellation** - stop a running parse from another thread with a
//!   [`CancellationToken`]
//! - **Metrics** - optional counters and timings per parse
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tsvmap::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mapping = MappingTable::builder()
//!     .column_mapping([("Col1", "C1"), ("Col3", "C3")])
//!     .row_mapping([("r1", "R1")])
//!     .build()?;
//!
//! let translator = Translator::new(
//!     Arc::new(RayonScheduler::new(Some(4))?),
//!     1 << 20, // target partition size in bytes
//!     Arc::new(mapping),
//! )?;
//!
//! let table = translator.parse("data.tsv")?;
//! println!("{:?} {} rows", table.header(), table.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Input format
//!
//! Plain text, `\t` separated fields, `\n` terminated records, first record is
//! the header. No quoting and no escaped delimiters. Field 0 of every data line
//! is the row id.
//!
//! Output rows are `[mapped id, included values...]`; a value is included when
//! its column's header name is a key of the column mapping. See
//! [`IdColumn`] for how the header lines up with the id field.
//!
//! ## Architecture
//!
//! 1. [`header`] resolves the first line into the output header and inclusion
//!    flags
//! 2. [`planner`] splits the remaining bytes into [`PartitionRange`]s
//! 3. [`partition`] parses one range into rows
//! 4. [`translator`] submits one task per range to a [`Scheduler`] and collects
//!    results in partition order
//!
//! ## Module Overview
//!
//! - [`mapping`] - column and row-id lookups, mapping file loader
//! - [`header`] - header resolution and [`ColumnFlags`]
//! - [`planner`] - partition planning
//! - [`partition`] - partition parsing, mapped or raw
//! - [`scheduler`] - task scheduling and cancellation
//! - [`translator`] - orchestration
//! - [`table`] - the output table
//! - [`validation`] - malformed-row policy
//! - [`error`] - error taxonomy
//! - [`config`] - serde configuration
//! - [`metrics`] - run metrics
//! - [`output`] - TSV and JSON Lines writers
//! - [`testing`] - fixtures and assertions for tests

pub mod config;
pub mod error;
pub mod header;
pub mod mapping;
pub mod metrics;
pub mod output;
pub mod partition;
pub mod planner;
pub mod scheduler;
pub mod table;
pub mod testing;
pub mod translator;
pub mod validation;

pub use config::TranslatorConfig;
pub use error::{PartitionContext, TranslateError};
pub use header::{ColumnFlags, IdColumn};
pub use mapping::{load_mapping, MappingTable};
pub use metrics::MetricsCollector;
pub use output::OutputFormat;
pub use partition::{PartitionOutput, PartitionStats, Projection};
pub use planner::PartitionRange;
pub use scheduler::{
    CancellationToken, InlineScheduler, RayonScheduler, Scheduler, Task, TaskHandle,
};
pub use table::{Row, Table};
pub use translator::Translator;
pub use validation::RowPolicy;
