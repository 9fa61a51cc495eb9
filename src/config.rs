//! Translator configuration.
//!
//! Everything has a default, so a config file only needs the keys it changes:
//!
//! ```json
//! { "partition_size_bytes": 1048576, "threads": 8, "row_policy": "skip_invalid" }
//! ```

use crate::error::TranslateError;
use crate::header::IdColumn;
use crate::validation::RowPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default target partition size in bytes.
pub const DEFAULT_PARTITION_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Target bytes per partition before extending to the next line end.
    pub partition_size_bytes: usize,
    /// Worker threads for the Rayon scheduler. `None` means one per CPU.
    pub threads: Option<usize>,
    /// Run partitions on the calling thread instead of a pool.
    pub inline: bool,
    pub row_policy: RowPolicy,
    pub id_column: IdColumn,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            partition_size_bytes: DEFAULT_PARTITION_SIZE,
            threads: None,
            inline: false,
            row_policy: RowPolicy::default(),
            id_column: IdColumn::default(),
        }
    }
}

impl TranslatorConfig {
    /// Read a JSON config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON for this
    /// struct, or fails [`validate`](Self::validate).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// [`TranslateError::InvalidPartitionSize`] for a zero partition size.
    pub fn validate(&self) -> Result<()> {
        if self.partition_size_bytes == 0 {
            return Err(TranslateError::InvalidPartitionSize.into());
        }
        Ok(())
    }
}
