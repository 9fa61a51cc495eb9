//! Metrics collection and reporting for translation runs.
//!
//! Attach a [`MetricsCollector`] to a [`Translator`](crate::Translator) with
//! [`with_metrics`](crate::Translator::with_metrics) and every parse records
//! its wall-clock time plus the built-in counters below. Users can register
//! their own metrics alongside them.
//!
//! | name | kind | meaning |
//! |---|---|---|
//! | `partitions` | counter | partitions planned |
//! | `bytes_read` | counter | data bytes parsed |
//! | `lines_read` | counter | data lines seen |
//! | `rows_unmapped` | counter | lines dropped because the row id is not mapped |
//! | `rows_malformed` | counter | lines dropped by a lenient row policy |
//! | `rows_emitted` | counter | rows in the output tables |
//! | `parses_failed` | counter | parses that returned an error or were cancelled |
//! | `throughput_bytes_per_sec` | gauge | data bytes per second of the last parse |
//!
//! The start and end marks are written together when a parse returns, whether
//! it succeeded or not, so [`MetricsCollector::elapsed`] always describes one
//! complete parse.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tsvmap::metrics::MetricsCollector;
//! use tsvmap::{InlineScheduler, MappingTable, Translator};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mapping = MappingTable::from_files("columns.tsv", "rows.tsv")?;
//! let metrics = MetricsCollector::new();
//! let translator = Translator::new(Arc::new(InlineScheduler), 8192, Arc::new(mapping))?
//!     .with_metrics(metrics.clone());
//! translator.parse("data.tsv")?;
//!
//! println!("{:?}", metrics.elapsed());
//! metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use crate::partition::PartitionStats;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const PARTITIONS: &str = "partitions";
pub const BYTES_READ: &str = "bytes_read";
pub const LINES_READ: &str = "lines_read";
pub const ROWS_UNMAPPED: &str = "rows_unmapped";
pub const ROWS_MALFORMED: &str = "rows_malformed";
pub const ROWS_EMITTED: &str = "rows_emitted";
pub const PARSES_FAILED: &str = "parses_failed";
pub const THROUGHPUT: &str = "throughput_bytes_per_sec";

/// Trait for custom metrics.
pub trait Metric: Send + Sync + Any {
    /// The name of this metric (e.g., `rows_emitted`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Cast to Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable cast, used to update built-in metrics in place.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Thread-safe container for run metrics. Clones share the same storage.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

struct MetricsCollectorInner {
    metrics: HashMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsCollectorInner {
                metrics: HashMap::new(),
                start_time: None,
                end_time: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a custom metric, replacing any metric with the same name.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock().metrics.insert(metric.name().to_string(), metric);
    }

    /// Set the start and end marks of one run in a single step.
    pub fn record_span(&self, start: Instant, end: Instant) {
        let mut inner = self.lock();
        inner.start_time = Some(start);
        inner.end_time = Some(end.max(start));
    }

    /// Elapsed time of the last recorded span.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to the counter `name`, creating it if needed. A non-counter
    /// metric registered under `name` is replaced.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut inner = self.lock();
        if let Some(counter) = inner
            .metrics
            .get_mut(name)
            .and_then(|m| m.as_any_mut().downcast_mut::<CounterMetric>())
        {
            counter.count += value;
            return;
        }
        inner.metrics.insert(
            name.to_string(),
            Box::new(CounterMetric::with_value(name, value)),
        );
    }

    /// Current value of the counter `name`, if it exists.
    #[must_use]
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.lock()
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<CounterMetric>())
            .map(|c| c.count)
    }

    /// Fold one parse's statistics into the built-in metrics.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_parse(&self, partitions: usize, stats: &PartitionStats, elapsed: Duration) {
        self.increment_counter(PARTITIONS, partitions as u64);
        self.increment_counter(BYTES_READ, stats.bytes);
        self.increment_counter(LINES_READ, stats.lines);
        self.increment_counter(ROWS_UNMAPPED, stats.unmapped);
        self.increment_counter(ROWS_MALFORMED, stats.malformed);
        self.increment_counter(ROWS_EMITTED, stats.emitted);
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.register(Box::new(
                GaugeMetric::new(THROUGHPUT, stats.bytes as f64 / secs)
                    .with_description("Data bytes per second of the last parse"),
            ));
        }
    }

    /// All metrics as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut metrics_json = serde_json::Map::new();

        for (name, metric) in &inner.metrics {
            let mut metric_obj = serde_json::Map::new();
            metric_obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                metric_obj.insert("description".to_string(), json!(desc));
            }
            metrics_json.insert(name.clone(), Value::Object(metric_obj));
        }

        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            let elapsed_ms = end.duration_since(start).as_millis();
            metrics_json.insert(
                "execution_time_ms".to_string(),
                json!({
                    "value": elapsed_ms,
                    "description": "Total parse time in milliseconds",
                }),
            );
        }
        drop(inner);
        Value::Object(metrics_json)
    }

    /// Save all metrics to a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Snapshot of all metric names and values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock()
            .metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Built-in Metrics ==========

/// A monotonically increasing counter.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A gauge metric that holds a single numeric value.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
