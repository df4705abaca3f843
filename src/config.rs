//! Pipeline configuration.
//!
//! Every field has a default, so an empty YAML document (or none at all) gives
//! the behaviour expected for the survey portal's exports. Command-line flags
//! are applied on top of the loaded file.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{DEFAULT_AGGREGATE_KEYWORDS, FormatClassifier},
    expand::{
        AggregateExpander, DEFAULT_DATA_YEARS, DEFAULT_MAX_COUNT_PER_CELL, DEFAULT_SUMMARY_MARKERS,
    },
    load::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE},
    store::is_valid_table_name,
};

pub const DEFAULT_TABLE: &str = "vehicles_batch";
pub const DEFAULT_EXTENSION: &str = "csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// File extension picked up by discovery, without the dot.
    pub extension: String,
    /// Field delimiter; resolved from each file's extension when unset.
    pub delimiter: Option<char>,
    /// Input encoding label understood by `encoding_rs`; UTF-8 when unset.
    pub encoding: Option<String>,
    pub chunk_size: usize,
    pub table: String,
    pub aggregate_keywords: Vec<String>,
    pub data_years: Vec<u16>,
    pub summary_markers: Vec<String>,
    /// Largest count a single aggregate cell may hold before its row is skipped.
    pub max_count_per_cell: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            delimiter: None,
            encoding: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            table: DEFAULT_TABLE.to_string(),
            aggregate_keywords: DEFAULT_AGGREGATE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            data_years: DEFAULT_DATA_YEARS.to_vec(),
            summary_markers: DEFAULT_SUMMARY_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_count_per_cell: DEFAULT_MAX_COUNT_PER_CELL,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be at least 1");
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            bail!(
                "chunk_size {} exceeds {MAX_CHUNK_SIZE}, the most rows one INSERT can bind",
                self.chunk_size
            );
        }
        if self.max_count_per_cell == 0 {
            bail!("max_count_per_cell must be at least 1");
        }
        if self.extension.trim().is_empty() {
            bail!("extension cannot be empty");
        }
        if !is_valid_table_name(&self.table) {
            bail!("table '{}' is not a valid table name", self.table);
        }
        self.delimiter_byte()?;
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        match self.delimiter {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => Err(anyhow!("Delimiter '{c}' must be ASCII")),
        }
    }

    pub fn classifier(&self) -> FormatClassifier {
        FormatClassifier::new(self.aggregate_keywords.iter().cloned())
    }

    pub fn expander(&self) -> AggregateExpander {
        AggregateExpander::new(
            self.data_years.iter().copied(),
            self.summary_markers.iter().cloned(),
        )
        .with_max_count(self.max_count_per_cell)
    }
}
