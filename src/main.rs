//! `tsvmap` command line: translate one TSV file and write the result.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tsvmap::output::{write_table, write_table_file};
use tsvmap::{
    IdColumn, MappingTable, MetricsCollector, OutputFormat, RowPolicy, Translator,
    TranslatorConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "tsvmap",
    version,
    about = "Translate a TSV file through column and row-id mappings"
)]
struct Cli {
    /// Input TSV file (first line is the header)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Column mapping file: external name<TAB>internal name per line
    #[arg(long, value_name = "FILE")]
    columns: PathBuf,

    /// Row mapping file: external id<TAB>internal id per line
    #[arg(long, value_name = "FILE")]
    rows: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target partition size in bytes
    #[arg(long, value_name = "BYTES")]
    partition_size: Option<usize>,

    /// Worker threads (default: one per CPU)
    #[arg(long)]
    threads: Option<usize>,

    /// Parse partitions on the main thread
    #[arg(long)]
    inline: bool,

    /// Drop malformed rows instead of failing
    #[arg(long, conflicts_with = "warn_malformed")]
    skip_malformed: bool,

    /// Drop malformed rows and log each one
    #[arg(long)]
    warn_malformed: bool,

    /// The header names only value columns, not the id column
    #[arg(long)]
    unnamed_id_column: bool,

    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,

    /// Write here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save run metrics as JSON
    #[arg(long, value_name = "FILE")]
    metrics: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Tsv,
    Jsonl,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Tsv => OutputFormat::Tsv,
            Format::Jsonl => OutputFormat::Jsonl,
        }
    }
}

impl Cli {
    fn config(&self) -> Result<TranslatorConfig> {
        let mut cfg = match &self.config {
            Some(path) => TranslatorConfig::from_file(path)?,
            None => TranslatorConfig::default(),
        };
        if let Some(size) = self.partition_size {
            cfg.partition_size_bytes = size;
        }
        if self.threads.is_some() {
            cfg.threads = self.threads;
        }
        cfg.inline |= self.inline;
        if self.skip_malformed {
            cfg.row_policy = RowPolicy::SkipInvalid;
        } else if self.warn_malformed {
            cfg.row_policy = RowPolicy::LogAndContinue;
        }
        if self.unnamed_id_column {
            cfg.id_column = IdColumn::Unnamed;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = cli.config()?;
    let mapping = MappingTable::from_files(&cli.columns, &cli.rows)?;
    let metrics = MetricsCollector::new();
    let translator =
        Translator::from_config(&cfg, Arc::new(mapping))?.with_metrics(metrics.clone());

    let table = translator
        .parse(&cli.input)
        .with_context(|| format!("translate {}", cli.input.display()))?;

    let format = OutputFormat::from(cli.format);
    match &cli.output {
        Some(path) => {
            write_table_file(&table, format, path)?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_table(&table, format, &mut lock)?;
            lock.flush()?;
        }
    }

    if let Some(path) = &cli.metrics {
        metrics.save_to_file(path)?;
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
