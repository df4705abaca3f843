//! Run driver: discovery, per-file transform and load, running totals.
//!
//! Files are processed one after another over a single store connection.
//! Each file either commits completely or contributes nothing; a failure in
//! one file is reported and the run moves on to the next.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{error, info, warn};
use serde::Serialize;

use crate::{
    classify::{FormatClassifier, SurveyFormat},
    config::PipelineConfig,
    discover,
    encode::encode_records,
    error::LoadError,
    expand::{AggregateExpander, location_from_path},
    frame::RawTable,
    io_utils,
    load::bulk_insert,
    normalize::{Normalized, SurveyRows, normalize},
    store::TripStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub format: Option<SurveyFormat>,
    pub inserted: usize,
    pub skipped: usize,
    pub error: Option<String>,
}

impl FileReport {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub total_inserted: usize,
    pub total_skipped: usize,
}

impl RunSummary {
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    fn record(&mut self, report: FileReport) {
        self.total_inserted += report.inserted;
        self.total_skipped += report.skipped;
        self.files.push(report);
    }
}

/// A file after classification and normalization, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFile {
    pub format: SurveyFormat,
    pub normalized: Normalized,
}

impl PreparedFile {
    /// Rows that entered normalization.
    pub fn candidate_rows(&self) -> usize {
        self.normalized.len() + self.normalized.rejected
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    classifier: FormatClassifier,
    expander: AggregateExpander,
    encoding: &'static Encoding,
    delimiter: Option<u8>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let encoding = io_utils::resolve_encoding(config.encoding.as_deref())?;
        let delimiter = config.delimiter_byte()?;
        Ok(Self {
            classifier: config.classifier(),
            expander: config.expander(),
            encoding,
            delimiter,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        discover::find_tabular_files(root, &self.config.extension)
    }

    pub fn read_table(&self, path: &Path) -> Result<RawTable> {
        let delimiter = io_utils::resolve_input_delimiter(path, self.delimiter);
        RawTable::load(path, delimiter, self.encoding)
    }

    /// Reads, classifies, expands (aggregate exports only) and normalizes one file.
    pub fn prepare_file(&self, path: &Path) -> Result<PreparedFile> {
        let table = self
            .read_table(path)
            .with_context(|| format!("Failed to read csv {path:?}"))?;
        Ok(self.prepare_table(table, path))
    }

    pub fn prepare_table(&self, table: RawTable, path: &Path) -> PreparedFile {
        let format = self.classifier.classify(&table);
        let rows = match format {
            SurveyFormat::AggregateCount => {
                info!("Detected traffic count format in {}", display_name(path));
                let expansion = self.expander.expand(&table, &location_from_path(path));
                SurveyRows::Synthesized(expansion.records)
            }
            SurveyFormat::TripLog => SurveyRows::TripLog(table),
        };
        PreparedFile {
            format,
            normalized: normalize(rows),
        }
    }

    /// Loads one file and returns `(format, inserted, skipped)`.
    pub fn load_file<S: TripStore>(
        &self,
        store: &mut S,
        path: &Path,
    ) -> Result<(SurveyFormat, usize, usize)> {
        let prepared = self.prepare_file(path)?;
        let candidates = prepared.candidate_rows();
        if prepared.normalized.is_empty() {
            info!("No valid rows found in {}", display_name(path));
            return Ok((prepared.format, 0, candidates));
        }
        let rows = encode_records(&prepared.normalized.records);
        let inserted = bulk_insert(store, &rows, self.config.chunk_size)
            .with_context(|| format!("Loading {} row(s) from {path:?}", rows.len()))?;
        Ok((prepared.format, inserted, candidates - inserted))
    }

    /// Processes `files` in order. Per-file failures become `(0, 0)` reports.
    pub fn process_files<S: TripStore>(&self, store: &mut S, files: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        for path in files {
            let name = display_name(path);
            info!("Processing: {name}");
            let report = match self.load_file(store, path) {
                Ok((format, inserted, skipped)) => {
                    info!("{name}: inserted {inserted}, skipped {skipped}");
                    FileReport {
                        path: path.clone(),
                        format: Some(format),
                        inserted,
                        skipped,
                        error: None,
                    }
                }
                Err(err) => {
                    error!("Error loading '{name}': {err:#}");
                    FileReport {
                        path: path.clone(),
                        format: None,
                        inserted: 0,
                        skipped: 0,
                        error: Some(format!("{err:#}")),
                    }
                }
            };
            summary.record(report);
        }
        summary
    }

    /// Full run over `root`. The store is only opened when there is at least
    /// one file, and a connection failure aborts the run before any file.
    pub fn run<S, F>(&self, root: &Path, connect: F) -> Result<RunSummary>
    where
        S: TripStore,
        F: FnOnce() -> Result<S, LoadError>,
    {
        let files = self.discover(root);
        if files.is_empty() {
            info!(
                "No {} files in {}. Put your batch files there and re-run.",
                self.config.extension,
                root.display()
            );
            return Ok(RunSummary::default());
        }

        let mut store = connect().context("Could not get a database connection")?;
        info!("Found {} file(s). Starting load...", files.len());
        let summary = self.process_files(&mut store, &files);
        if let Err(err) = store.close() {
            warn!("Closing the store failed: {err}");
        }
        info!(
            "Done. Total inserted: {}. Total skipped: {}.",
            summary.total_inserted, summary.total_skipped
        );
        Ok(summary)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
